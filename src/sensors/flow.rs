//! YF-S201 hall-effect flow meter, measured by pulse period.
//!
//! The sensor emits pulses at 7.5 Hz per L/min.  The GPIO ISR only
//! timestamps each rising edge into [`PulseTimer`]; the periodic flow task
//! turns the latest inter-pulse interval into a rate.  No arithmetic
//! beyond a subtraction runs in interrupt context.
//!
//! Timestamps are `u32` microseconds (ESP32 has no 64-bit atomics), so the
//! ISR side wraps every ~71 minutes.  Freshness is judged against both the
//! wrapped pulse timestamp and the task's own 64-bit clock, so a long idle
//! period can never alias back into a "fresh" reading.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_time::{Duration, Ticker};
use log::{debug, info};

use crate::channels::{FlowSender, send_bounded};

/// Pulse frequency (Hz) per L/min of flow.
pub const PULSES_PER_LITRE_PER_MIN: f32 = 7.5;

/// Written only by the flow ISR, read only by the flow task.
pub static FLOW_PULSES: PulseTimer = PulseTimer::new();

/// What the ISR last recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseSnapshot {
    /// Pulses seen since boot (wrapping).
    pub count: u32,
    /// Timestamp of the last pulse, µs.
    pub last_us: u32,
    /// Interval between the last two pulses, µs.  Zero until two pulses.
    pub interval_us: u32,
}

/// Lock-free pulse-period capture shared with interrupt context.
pub struct PulseTimer {
    count: AtomicU32,
    last_us: AtomicU32,
    interval_us: AtomicU32,
}

impl PulseTimer {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
            last_us: AtomicU32::new(0),
            interval_us: AtomicU32::new(0),
        }
    }

    /// Record one rising edge at `now_us`.  ISR-safe: no locks, no floats.
    pub fn on_pulse(&self, now_us: u32) {
        let prev = self.last_us.swap(now_us, Ordering::Relaxed);
        if self.count.load(Ordering::Relaxed) > 0 {
            self.interval_us
                .store(now_us.wrapping_sub(prev), Ordering::Relaxed);
        }
        self.count.fetch_add(1, Ordering::Release);
    }

    pub fn snapshot(&self) -> PulseSnapshot {
        let count = self.count.load(Ordering::Acquire);
        PulseSnapshot {
            count,
            last_us: self.last_us.load(Ordering::Relaxed),
            interval_us: self.interval_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for PulseTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts pulse timing into L/min, reporting zero once pulses stop.
pub struct FlowMeter<'a> {
    pulses: &'a PulseTimer,
    freshness_us: u64,
    seen_count: u32,
    last_change_us: u64,
}

impl<'a> FlowMeter<'a> {
    pub fn new(pulses: &'a PulseTimer, freshness: Duration) -> Self {
        Self {
            pulses,
            freshness_us: freshness.as_micros(),
            seen_count: 0,
            last_change_us: 0,
        }
    }

    /// Flow rate at `now_us` on the task clock (same timebase as the ISR,
    /// not truncated).
    pub fn rate_at(&mut self, now_us: u64) -> f32 {
        let snap = self.pulses.snapshot();
        self.rate_from(snap, now_us)
    }

    /// Rate for a snapshot taken no later than `now_us`.
    fn rate_from(&mut self, snap: PulseSnapshot, now_us: u64) -> f32 {
        if snap.count != self.seen_count {
            self.seen_count = snap.count;
            self.last_change_us = now_us;
        }

        if snap.interval_us == 0 {
            return 0.0;
        }
        let since_change = now_us.saturating_sub(self.last_change_us);
        // A pulse stamped after `now_us` wraps to a huge age; it is the newest there is.
        let age = (now_us as u32).wrapping_sub(snap.last_us);
        let since_pulse = if age > u32::MAX / 2 { 0 } else { u64::from(age) };
        if since_change > self.freshness_us || since_pulse > self.freshness_us {
            return 0.0;
        }

        1_000_000.0 / (snap.interval_us as f32 * PULSES_PER_LITRE_PER_MIN)
    }
}

/// Periodic flow task: converts the latest interval and publishes it.
pub struct FlowTask<'a> {
    meter: FlowMeter<'a>,
    tx: FlowSender<'a>,
    period: Duration,
    send_timeout: Duration,
    clock: fn() -> u64,
}

impl<'a> FlowTask<'a> {
    pub fn new(
        meter: FlowMeter<'a>,
        tx: FlowSender<'a>,
        period: Duration,
        send_timeout: Duration,
        clock: fn() -> u64,
    ) -> Self {
        Self {
            meter,
            tx,
            period,
            send_timeout,
            clock,
        }
    }

    pub async fn cycle(&mut self) -> bool {
        let snap = self.meter.pulses.snapshot();
        let rate = self.meter.rate_from(snap, (self.clock)());
        debug!("Flow: {:.2} L/min", rate);
        send_bounded(self.tx, rate, self.send_timeout, "flow").await
    }

    pub async fn run(mut self) {
        info!("Flow: task running every {} ms", self.period.as_millis());
        let mut ticker = Ticker::every(self.period);
        loop {
            self.cycle().await;
            ticker.next().await;
        }
    }

    pub async fn run_cycles(&mut self, cycles: usize) {
        let mut ticker = Ticker::every(self.period);
        for _ in 0..cycles {
            self.cycle().await;
            ticker.next().await;
        }
    }
}
