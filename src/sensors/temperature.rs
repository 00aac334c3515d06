//! Multi-probe temperature acquisition.
//!
//! [`ProbeArray`] walks the bus once at start-up and fixes the probe count
//! for the life of the process.  Each cycle broadcasts CONVERT T, waits
//! the conversion time of the configured resolution (uniform across
//! probes), then reads every probe in discovery order.
//!
//! A probe that fails its read keeps its previous value in the sample; it
//! is not retried until the next cycle.

use embassy_time::{Duration, Ticker, Timer};
use heapless::Vec;
use log::{debug, info, warn};

use crate::channels::{TemperatureSender, send_bounded};
use crate::error::BusError;
use crate::sensors::ds18b20::{self, Resolution};
use crate::sensors::onewire::{DeviceSearch, OneWire, RomCode};
use crate::sensors::{MAX_PROBES, SensorSample, UNPOPULATED};

/// All DS18B20 probes on one bus.
pub struct ProbeArray<W> {
    wire: W,
    probes: Vec<RomCode, MAX_PROBES>,
    resolution: Resolution,
    readings: SensorSample,
}

impl<W: OneWire> ProbeArray<W> {
    /// Scan the bus and configure every probe found.
    ///
    /// Fails only if the bus itself is unusable.  An empty bus is not an
    /// error: the array then has no slots and every reading stays
    /// unpopulated.
    pub fn discover(mut wire: W, resolution: Resolution) -> Result<Self, BusError> {
        if !wire.reset()? {
            warn!("Sensors: no presence pulse, temperature slots will stay unpopulated");
        }

        let mut probes: Vec<RomCode, MAX_PROBES> = Vec::new();
        let mut search = DeviceSearch::new();
        loop {
            match search.next_device(&mut wire) {
                Ok(Some(rom)) if rom.family_code() != ds18b20::FAMILY_CODE => {
                    info!("Sensors: skipping non-DS18B20 device {}", rom);
                }
                Ok(Some(rom)) => {
                    if probes.push(rom).is_err() {
                        warn!("Sensors: more than {} probes, {} ignored", MAX_PROBES, rom);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Sensors: bus search stopped early: {}", e);
                    break;
                }
            }
        }

        let mut readings = SensorSample::new();
        for _ in 0..probes.len() {
            let _ = readings.push(UNPOPULATED);
        }

        let mut array = Self {
            wire,
            probes,
            resolution,
            readings,
        };

        for i in 0..array.probes.len() {
            let rom = array.address(i);
            if let Err(e) = ds18b20::set_resolution(&mut array.wire, rom, resolution) {
                warn!("Sensors: probe {} resolution not set: {}", i, e);
            }
        }

        info!(
            "Sensors: {} probe(s) found, {:?}{}",
            array.probes.len(),
            resolution,
            if array.probes.len() == 1 { " (single-device mode)" } else { "" }
        );
        for (i, rom) in array.probes.iter().enumerate() {
            info!("Sensors:   [{}] {}", i, rom);
        }

        Ok(array)
    }

    /// Address for probe `i`.  With exactly one probe every command uses
    /// SKIP ROM instead of per-device addressing.
    fn address(&self, i: usize) -> Option<RomCode> {
        if self.probes.len() == 1 {
            None
        } else {
            self.probes.get(i).copied()
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    pub fn probes(&self) -> &[RomCode] {
        &self.probes
    }

    pub fn conversion_time(&self) -> Duration {
        Duration::from_millis(self.resolution.conversion_time_ms())
    }

    /// Last known value of every slot.
    pub fn readings(&self) -> &SensorSample {
        &self.readings
    }

    /// Broadcast CONVERT T to every probe.
    pub fn start_conversion(&mut self) -> Result<(), BusError> {
        ds18b20::convert_all(&mut self.wire)
    }

    /// Read every probe in discovery order.  Returns how many reads
    /// succeeded; failed slots keep their previous value.
    pub fn collect(&mut self) -> usize {
        let mut ok = 0;
        for i in 0..self.probes.len() {
            let rom = self.address(i);
            match ds18b20::read_temperature(&mut self.wire, rom) {
                Ok(t) => {
                    self.readings[i] = t;
                    ok += 1;
                }
                Err(e) => debug!(
                    "Sensors: probe {} read failed ({}), keeping {:.2}",
                    i, e, self.readings[i]
                ),
            }
        }
        ok
    }

    /// One full conversion cycle.
    pub async fn sample(&mut self) -> SensorSample {
        if self.probes.is_empty() {
            return self.readings.clone();
        }
        match self.start_conversion() {
            Ok(()) => {
                Timer::after(self.conversion_time()).await;
                self.collect();
            }
            Err(e) => debug!("Sensors: conversion not started: {}", e),
        }
        self.readings.clone()
    }

    #[cfg(test)]
    pub(crate) fn wire_mut(&mut self) -> &mut W {
        &mut self.wire
    }
}

/// Periodic conversion task: samples every probe and publishes the array.
pub struct TemperatureSampler<'a, W> {
    probes: ProbeArray<W>,
    tx: TemperatureSender<'a>,
    period: Duration,
    send_timeout: Duration,
}

impl<'a, W: OneWire> TemperatureSampler<'a, W> {
    pub fn new(
        probes: ProbeArray<W>,
        tx: TemperatureSender<'a>,
        period: Duration,
        send_timeout: Duration,
    ) -> Self {
        Self {
            probes,
            tx,
            period,
            send_timeout,
        }
    }

    /// Sample once and publish.  Returns `false` if the sample was dropped.
    pub async fn cycle(&mut self) -> bool {
        let sample = self.probes.sample().await;
        send_bounded(self.tx, sample, self.send_timeout, "temperature").await
    }

    /// Run forever at the configured period.
    pub async fn run(mut self) {
        info!("Sensors: sampler running every {} ms", self.period.as_millis());
        let mut ticker = Ticker::every(self.period);
        loop {
            self.cycle().await;
            ticker.next().await;
        }
    }

    /// Run a bounded number of cycles on the same schedule as [`Self::run`].
    pub async fn run_cycles(&mut self, cycles: usize) {
        let mut ticker = Ticker::every(self.period);
        for _ in 0..cycles {
            self.cycle().await;
            ticker.next().await;
        }
    }

    pub fn probes(&self) -> &ProbeArray<W> {
        &self.probes
    }
}
