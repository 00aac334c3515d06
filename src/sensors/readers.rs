//! Latest-value readers on the consumer side of the sensor channels.
//!
//! Each refresh waits at most the receive timeout for a new message, then
//! drains anything else already queued so the newest value wins.  When
//! nothing arrives the previous value is kept.

use embassy_time::Duration;

use crate::channels::{FlowReceiver, TemperatureReceiver, recv_bounded};
use crate::sensors::{ProbeRole, SensorSample, UNPOPULATED};

/// Cached view of the temperature channel.
pub struct TemperatureReader<'a> {
    rx: TemperatureReceiver<'a>,
    timeout: Duration,
    latest: SensorSample,
}

impl<'a> TemperatureReader<'a> {
    pub fn new(rx: TemperatureReceiver<'a>, timeout: Duration) -> Self {
        Self {
            rx,
            timeout,
            latest: SensorSample::new(),
        }
    }

    /// Pull the newest sample.  Returns `true` if anything new arrived.
    pub async fn refresh(&mut self) -> bool {
        let Some(mut sample) = recv_bounded(self.rx, self.timeout).await else {
            return false;
        };
        while let Ok(newer) = self.rx.try_receive() {
            sample = newer;
        }
        self.latest = sample;
        true
    }

    /// Last known value for `role`, or [`UNPOPULATED`] if that probe was
    /// never seen.
    pub fn get(&self, role: ProbeRole) -> f32 {
        role.read(&self.latest).unwrap_or(UNPOPULATED)
    }

    pub fn latest(&self) -> &SensorSample {
        &self.latest
    }
}

/// Cached view of the flow channel, in L/min.
pub struct FlowReader<'a> {
    rx: FlowReceiver<'a>,
    timeout: Duration,
    latest: f32,
}

impl<'a> FlowReader<'a> {
    pub fn new(rx: FlowReceiver<'a>, timeout: Duration) -> Self {
        Self {
            rx,
            timeout,
            latest: 0.0,
        }
    }

    pub async fn refresh(&mut self) -> bool {
        let Some(mut rate) = recv_bounded(self.rx, self.timeout).await else {
            return false;
        };
        while let Ok(newer) = self.rx.try_receive() {
            rate = newer;
        }
        self.latest = rate;
        true
    }

    pub fn get(&self) -> f32 {
        self.latest
    }
}
