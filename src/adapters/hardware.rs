//! Hardware adapter: bridges real peripherals to [`ActuatorPort`].
//!
//! Owns the pump driver and drives the relay and LED outputs.  On
//! non-espidf targets the underlying drivers are in-memory stand-ins, so
//! the adapter records what it was asked to do.

use log::info;

use crate::app::ports::ActuatorPort;
use crate::drivers::hw_init;
use crate::drivers::pump::PumpDriver;
use crate::pins;

/// Concrete adapter that combines every controller output.
pub struct HardwareAdapter {
    pump: PumpDriver,
    fan: bool,
    element: bool,
}

impl HardwareAdapter {
    pub fn new(pump: PumpDriver) -> Self {
        Self {
            pump,
            fan: false,
            element: false,
        }
    }

    pub fn pump(&self) -> &PumpDriver {
        &self.pump
    }

    pub fn fan_on(&self) -> bool {
        self.fan
    }

    pub fn element_on(&self) -> bool {
        self.element
    }
}

impl ActuatorPort for HardwareAdapter {
    fn set_output(&mut self, duty: u32) {
        self.pump.set_duty(duty);
    }

    fn set_fan(&mut self, on: bool) {
        info!("HardwareAdapter: fan {}", if on { "on" } else { "off" });
        hw_init::gpio_write(pins::FAN_CTRL_GPIO, on);
        self.fan = on;
    }

    fn set_element(&mut self, on: bool) {
        info!("HardwareAdapter: element {}", if on { "on" } else { "off" });
        hw_init::gpio_write(pins::ELEMENT_CTRL_GPIO, on);
        self.element = on;
    }

    fn set_status_led(&mut self, on: bool) {
        hw_init::gpio_write(pins::LED_GPIO, on);
    }
}
