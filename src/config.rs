//! System configuration parameters
//!
//! Every compiled-in tunable for the still controller: task periods, bus
//! timeouts, the actuator output range and the probe resolution.  Operator
//! tuning (setpoint and gains) is NOT here; it lives in
//! [`ControlSettings`](crate::control::settings::ControlSettings) and is
//! persisted separately.

use core::fmt;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::sensors::ds18b20::Resolution;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control loop ---
    /// Control loop frequency (Hz).  Also fixes the PID sample interval.
    pub control_frequency_hz: u32,
    /// Lowest actuator output (13-bit PWM duty).  Strictly above zero so
    /// coolant always flows past the feedback probe.
    pub output_min: f32,
    /// Highest actuator output (13-bit PWM duty).
    pub output_max: f32,
    /// Output forced while flush mode is active.
    pub flush_output: f32,

    // --- Acquisition ---
    /// Temperature conversion cycle period (milliseconds)
    pub temp_sample_period_ms: u32,
    /// Flow-rate task period (milliseconds)
    pub flow_sample_period_ms: u32,
    /// Flow reads zero when no pulse arrived within this window (milliseconds)
    pub flow_freshness_ms: u32,
    /// DS18B20 conversion resolution, uniform across probes
    pub probe_resolution: Resolution,

    // --- Message bus ---
    /// Bounded wait for latest-value reads (milliseconds)
    pub recv_timeout_ms: u32,
    /// Bounded wait before a sample is dropped on a full channel (milliseconds)
    pub send_timeout_ms: u32,

    // --- Telemetry ---
    /// Telemetry log interval (milliseconds)
    pub telemetry_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Control loop
            control_frequency_hz: 5, // 200 ms period
            output_min: 1350.0,
            output_max: 8190.0,
            flush_output: 5000.0,

            // Acquisition
            temp_sample_period_ms: 400,
            flow_sample_period_ms: 500,
            flow_freshness_ms: 1000,
            probe_resolution: Resolution::Bits10,

            // Message bus
            recv_timeout_ms: 50,
            send_timeout_ms: 100,

            // Telemetry
            telemetry_interval_ms: 1000,
        }
    }
}

impl SystemConfig {
    /// Control loop period.
    pub fn control_period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.control_frequency_hz.max(1)))
    }

    /// Fixed PID sample interval in seconds, matching the nominal period.
    pub fn sample_interval_secs(&self) -> f32 {
        1.0 / self.control_frequency_hz.max(1) as f32
    }

    pub fn temp_sample_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.temp_sample_period_ms))
    }

    pub fn flow_sample_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.flow_sample_period_ms))
    }

    pub fn flow_freshness(&self) -> Duration {
        Duration::from_millis(u64::from(self.flow_freshness_ms))
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.telemetry_interval_ms))
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.recv_timeout_ms))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.send_timeout_ms))
    }

    /// Range-check every field.
    ///
    /// Invalid values are rejected, not clamped: the firmware refuses to
    /// start its tasks on a bad configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.control_frequency_hz) {
            return Err(ConfigError::ValidationFailed(
                "control_frequency_hz must be 1–100",
            ));
        }
        if !(self.output_min > 0.0) {
            return Err(ConfigError::ValidationFailed("output_min must be > 0"));
        }
        if !(self.output_max > self.output_min) || self.output_max > 8191.0 {
            return Err(ConfigError::ValidationFailed(
                "output_max must be > output_min and fit 13-bit duty",
            ));
        }
        if !(self.output_min..=self.output_max).contains(&self.flush_output) {
            return Err(ConfigError::ValidationFailed(
                "flush_output must lie within the output range",
            ));
        }
        if !(100..=10_000).contains(&self.temp_sample_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "temp_sample_period_ms must be 100–10000",
            ));
        }
        if u64::from(self.temp_sample_period_ms) <= self.probe_resolution.conversion_time_ms() {
            return Err(ConfigError::ValidationFailed(
                "temp_sample_period_ms must exceed the probe conversion time",
            ));
        }
        if !(50..=10_000).contains(&self.flow_sample_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "flow_sample_period_ms must be 50–10000",
            ));
        }
        if self.flow_freshness_ms < self.flow_sample_period_ms {
            return Err(ConfigError::ValidationFailed(
                "flow_freshness_ms must be >= flow_sample_period_ms",
            ));
        }
        let period_ms = 1000 / self.control_frequency_hz;
        if self.recv_timeout_ms * 3 >= period_ms {
            return Err(ConfigError::ValidationFailed(
                "recv_timeout_ms too long for the control period",
            ));
        }
        if !(1..=1000).contains(&self.send_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "send_timeout_ms must be 1–1000",
            ));
        }
        if self.telemetry_interval_ms < 100 {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must be >= 100",
            ));
        }
        Ok(())
    }
}

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
