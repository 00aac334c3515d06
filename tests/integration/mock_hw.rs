//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full output
//! history without touching real GPIO/PWM registers, and provides a bus
//! of test-local channels so tests never share the process-wide statics.

use std::collections::HashMap;

use embassy_sync::channel::Channel;
use stillctl::app::ports::{ActuatorPort, StorageError, StoragePort};
use stillctl::channels::{CommandChannel, FlowChannel, SettingsChannel, TemperatureChannel};
use stillctl::config::SystemConfig;
use stillctl::control::controller::LoopLinks;
use stillctl::sensors::SensorSample;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Output(u32),
    Fan(bool),
    Element(bool),
    Led(bool),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Output(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn fan_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Fan(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn element_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Element(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn led_history(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Led(on) => Some(*on),
                _ => None,
            })
            .collect()
    }
}

impl ActuatorPort for MockHardware {
    fn set_output(&mut self, duty: u32) {
        self.calls.push(ActuatorCall::Output(duty));
    }

    fn set_fan(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Fan(on));
    }

    fn set_element(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Element(on));
    }

    fn set_status_led(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Led(on));
    }
}

// ── MockStorage ───────────────────────────────────────────────

/// In-memory storage that can be told to fail.
#[derive(Default)]
pub struct MockStorage {
    pub data: HashMap<(String, String), i32>,
    pub commits: usize,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.data.get(&("storage".to_string(), key.to_string())).copied()
    }
}

impl StoragePort for MockStorage {
    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>, StorageError> {
        Ok(self.data.get(&(namespace.to_string(), key.to_string())).copied())
    }

    fn set_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.data.insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }

    fn commit(&mut self, _namespace: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.commits += 1;
        Ok(())
    }
}

// ── TestBus ───────────────────────────────────────────────────

pub struct TestBus {
    pub temperature: TemperatureChannel,
    pub flow: FlowChannel,
    pub settings: SettingsChannel,
    pub commands: CommandChannel,
}

#[allow(dead_code)]
impl TestBus {
    pub fn new() -> Self {
        Self {
            temperature: Channel::new(),
            flow: Channel::new(),
            settings: Channel::new(),
            commands: Channel::new(),
        }
    }

    pub fn links(&self) -> LoopLinks<'_> {
        LoopLinks {
            temperature: self.temperature.receiver(),
            flow: self.flow.receiver(),
            settings: self.settings.receiver(),
            commands: self.commands.receiver(),
        }
    }

    /// Queue a sample with `hot` on the hot-side probe.
    pub fn push_temps(&self, hot: f32, cold: f32) {
        let sample = SensorSample::from_slice(&[hot, cold]).unwrap();
        self.temperature.try_send(sample).unwrap();
    }
}

/// Default config with receive waits short enough for fast tests.
pub fn fast_config() -> SystemConfig {
    SystemConfig {
        recv_timeout_ms: 1,
        send_timeout_ms: 1,
        ..SystemConfig::default()
    }
}
