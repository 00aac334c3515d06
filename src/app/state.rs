//! Read-mostly controller state shared with the telemetry side.
//!
//! The control loop is the only writer apart from [`ControllerState::set_flush`].
//! Every accessor returns a copy; no reference into the state escapes a
//! critical section.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::control::settings::ControlSettings;
use crate::sensors::{COLD_SIDE, HOT_SIDE, SensorSample, UNPOPULATED};

/// Process-wide controller state.
pub static CONTROLLER_STATE: ControllerState = ControllerState::new();

pub struct ControllerState {
    settings: Mutex<CriticalSectionRawMutex, Cell<ControlSettings>>,
    temperatures: Mutex<CriticalSectionRawMutex, RefCell<SensorSample>>,
    flow_rate: Mutex<CriticalSectionRawMutex, Cell<f32>>,
    output: AtomicU32,
    flush: AtomicBool,
    fan: AtomicBool,
    element: AtomicBool,
}

impl ControllerState {
    pub const fn new() -> Self {
        Self {
            settings: Mutex::new(Cell::new(ControlSettings::DEFAULT)),
            temperatures: Mutex::new(RefCell::new(SensorSample::new())),
            flow_rate: Mutex::new(Cell::new(0.0)),
            output: AtomicU32::new(0),
            flush: AtomicBool::new(false),
            fan: AtomicBool::new(false),
            element: AtomicBool::new(false),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn get_controller_settings(&self) -> ControlSettings {
        self.settings.lock(Cell::get)
    }

    pub fn get_hot_temp(&self) -> f32 {
        self.temperatures
            .lock(|t| HOT_SIDE.read(&t.borrow()).unwrap_or(UNPOPULATED))
    }

    pub fn get_cold_temp(&self) -> f32 {
        self.temperatures
            .lock(|t| COLD_SIDE.read(&t.borrow()).unwrap_or(UNPOPULATED))
    }

    /// Every probe, in discovery order.
    pub fn temperatures(&self) -> SensorSample {
        self.temperatures.lock(|t| t.borrow().clone())
    }

    pub fn get_flow_rate(&self) -> f32 {
        self.flow_rate.lock(Cell::get)
    }

    /// Last duty written to the actuator.
    pub fn last_output(&self) -> u32 {
        self.output.load(Ordering::Relaxed)
    }

    pub fn get_flush_status(&self) -> bool {
        self.flush.load(Ordering::Relaxed)
    }

    pub fn get_fan_status(&self) -> bool {
        self.fan.load(Ordering::Relaxed)
    }

    pub fn get_element_status(&self) -> bool {
        self.element.load(Ordering::Relaxed)
    }

    // ── Mutators ─────────────────────────────────────────────────

    /// Enter or leave flush mode.  Takes effect on the next iteration.
    pub fn set_flush(&self, on: bool) {
        self.flush.store(on, Ordering::Relaxed);
    }

    pub(crate) fn publish_settings(&self, settings: ControlSettings) {
        self.settings.lock(|s| s.set(settings));
    }

    pub(crate) fn publish_temperatures(&self, sample: &SensorSample) {
        self.temperatures
            .lock(|t| t.borrow_mut().clone_from(sample));
    }

    pub(crate) fn publish_flow_rate(&self, rate: f32) {
        self.flow_rate.lock(|f| f.set(rate));
    }

    pub(crate) fn publish_output(&self, duty: u32) {
        self.output.store(duty, Ordering::Relaxed);
    }

    pub(crate) fn publish_fan(&self, on: bool) {
        self.fan.store(on, Ordering::Relaxed);
    }

    pub(crate) fn publish_element(&self, on: bool) {
        self.element.store(on, Ordering::Relaxed);
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}
