//! Telemetry frames for the monitoring client.
//!
//! Field names are the client's wire names, hence the renames.

use serde::Serialize;

use crate::app::state::ControllerState;
use crate::sensors::{ProbeRole, UNPOPULATED};

/// Periodic process data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "T_vapour")]
    pub t_vapour: f32,
    #[serde(rename = "T_refluxInflow")]
    pub t_reflux_inflow: f32,
    #[serde(rename = "T_productInflow")]
    pub t_product_inflow: f32,
    #[serde(rename = "T_radiator")]
    pub t_radiator: f32,
    #[serde(rename = "T_boiler")]
    pub t_boiler: f32,
    pub setpoint: f32,
    /// Seconds since boot.
    pub uptime: u64,
    pub flowrate: f32,
    #[serde(rename = "P_gain")]
    pub p_gain: f32,
    #[serde(rename = "I_gain")]
    pub i_gain: f32,
    #[serde(rename = "D_gain")]
    pub d_gain: f32,
}

/// Flags go on the wire as `0`/`1`.
mod flag_serde {
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u8::from(*flag).serialize(serializer)
    }
}

/// Relay and override flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "fanState", with = "flag_serde")]
    pub fan_state: bool,
    #[serde(with = "flag_serde")]
    pub flush: bool,
    #[serde(rename = "elementState", with = "flag_serde")]
    pub element_state: bool,
}

impl DataFrame {
    pub fn capture(state: &ControllerState, uptime_secs: u64) -> Self {
        let temps = state.temperatures();
        let t = |role: ProbeRole| role.read(&temps).unwrap_or(UNPOPULATED);
        let settings = state.get_controller_settings();
        Self {
            kind: "data",
            t_vapour: t(ProbeRole::RefluxHot),
            t_reflux_inflow: t(ProbeRole::RefluxCold),
            t_product_inflow: t(ProbeRole::ProductHot),
            t_radiator: t(ProbeRole::ProductCold),
            t_boiler: t(ProbeRole::Boiler),
            setpoint: settings.setpoint,
            uptime: uptime_secs,
            flowrate: state.get_flow_rate(),
            p_gain: settings.p_gain,
            i_gain: settings.i_gain,
            d_gain: settings.d_gain,
        }
    }
}

impl StatusFrame {
    pub fn capture(state: &ControllerState) -> Self {
        Self {
            kind: "status",
            fan_state: state.get_fan_status(),
            flush: state.get_flush_status(),
            element_state: state.get_element_status(),
        }
    }
}
