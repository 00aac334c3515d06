//! Coolant pump motor driver.
//!
//! The controller output is a 13-bit LEDC duty written verbatim to
//! channel 0.  Values above the timer range saturate at full duty.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init::{self, LEDC_CH_PUMP, MAX_DUTY};

pub struct PumpDriver {
    duty: u32,
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { duty: 0 }
    }

    pub fn set_duty(&mut self, duty: u32) {
        let duty = duty.min(MAX_DUTY);
        hw_init::ledc_set(LEDC_CH_PUMP, duty);
        self.duty = duty;
    }

    pub fn stop(&mut self) {
        self.set_duty(0);
    }

    pub fn is_running(&self) -> bool {
        self.duty > 0
    }

    pub fn current_duty(&self) -> u32 {
        self.duty
    }
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}
