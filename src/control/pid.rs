//! PID controller for the still's coolant pump.
//!
//! Error is measured as `hot-side temperature − setpoint`: a column running
//! hot drives the pump harder.  Gains and setpoint are passed in on every
//! step so the loop can swap [`ControlSettings`] wholesale without touching
//! controller state.
//!
//! The sample interval is fixed at construction and used for both the
//! derivative and the integral, never a measured wall-clock delta, so a
//! given input sequence always produces the same outputs.

use crate::control::settings::ControlSettings;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    /// Fixed sample interval (seconds).
    dt: f32,
    integral: f32,
    prev_error: f32,
    /// Last clamped output, consulted by the anti-windup guard.
    last_output: f32,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(dt: f32, output_min: f32, output_max: f32) -> Self {
        Self {
            dt,
            integral: 0.0,
            prev_error: 0.0,
            last_output: output_min,
            output_min,
            output_max,
        }
    }

    /// Compute one clamped output from the current measurement.
    pub fn compute(&mut self, gains: &ControlSettings, measurement: f32) -> f32 {
        let error = measurement - gains.setpoint;

        // Derivative
        let derivative = (error - self.prev_error) / self.dt;
        self.prev_error = error;

        // Integral, held while saturated in the direction the error pushes.
        let pushing_past_max = self.last_output >= self.output_max && error > 0.0;
        let pushing_past_min = self.last_output <= self.output_min && error < 0.0;
        if !(pushing_past_max || pushing_past_min) {
            self.integral += error * self.dt;
        }

        let raw = gains.p_gain * error + gains.d_gain * derivative + gains.i_gain * self.integral;

        // Clamp output; NaN gains fall back to the floor.
        let output = if raw.is_nan() {
            self.output_min
        } else {
            raw.clamp(self.output_min, self.output_max)
        };

        self.last_output = output;
        output
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }
}
