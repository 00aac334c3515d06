//! Operator-tunable controller parameters.
//!
//! [`ControlSettings`] is small and `Copy`: the control loop owns the working
//! instance and replaces it wholesale; every reader gets a snapshot copy.

use serde::{Deserialize, Serialize};

/// Scale applied when a setting is persisted as a signed 32-bit integer.
pub const FIXED_POINT_SCALE: f32 = 1000.0;

/// Setpoint and PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Target hot-side temperature (°C).
    pub setpoint: f32,
    pub p_gain: f32,
    pub i_gain: f32,
    pub d_gain: f32,
}

impl ControlSettings {
    /// Compiled-in defaults, used until storage or an operator says otherwise.
    pub const DEFAULT: Self = Self {
        setpoint: 50.0,
        p_gain: 45.0,
        i_gain: 10.0,
        d_gain: 300.0,
    };
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encode a setting as fixed-point (×1000), rounding to the nearest unit.
/// Out-of-range values saturate at the `i32` limits.
pub fn to_fixed(value: f32) -> i32 {
    (value * FIXED_POINT_SCALE).round() as i32
}

/// Decode a fixed-point (×1000) setting.
pub fn from_fixed(raw: i32) -> f32 {
    raw as f32 / FIXED_POINT_SCALE
}
