//! Sensor acquisition pipeline.
//!
//! ```text
//!  one-wire bus ──▶ ProbeArray ──▶ sampler task ──▶ TEMPERATURE_CHANNEL ─┐
//!                                                                       ├─▶ readers ─▶ control loop
//!  flow ISR ──▶ PulseTimer ──▶ FlowMeter ──▶ flow task ──▶ FLOW_CHANNEL ─┘
//! ```
//!
//! Producers publish with a bounded send and drop on a full channel; the
//! latest-value readers on the consumer side never block longer than the
//! receive timeout and fall back to the last value they saw.

pub mod ds18b20;
pub mod flow;
pub mod onewire;
pub mod readers;
pub mod temperature;

/// Most probes the bus scan keeps; further probes are ignored.
pub const MAX_PROBES: usize = 8;

/// One conversion cycle across all probes, in discovery order (°C).
///
/// Its length is the probe count found at start-up and never changes.
pub type SensorSample = heapless::Vec<f32, MAX_PROBES>;

/// Where each probe sits in the column, by discovery index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ProbeRole {
    /// Vapour leaving the reflux condenser.
    RefluxHot = 0,
    /// Coolant entering the reflux condenser.
    RefluxCold = 1,
    /// Coolant entering the product condenser.
    ProductHot = 2,
    /// Radiator outlet.
    ProductCold = 3,
    Boiler = 4,
}

impl ProbeRole {
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value for this role, `None` when fewer probes were discovered.
    pub fn read(self, sample: &SensorSample) -> Option<f32> {
        sample.get(self.index()).copied()
    }
}

/// Probe the controller regulates on.
pub const HOT_SIDE: ProbeRole = ProbeRole::RefluxHot;
/// Probe reported as the cold side.
pub const COLD_SIDE: ProbeRole = ProbeRole::RefluxCold;

/// Value reported for a role that has never been populated.
pub const UNPOPULATED: f32 = 0.0;
