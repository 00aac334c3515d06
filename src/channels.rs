//! Inter-task message bus.
//!
//! Uses `embassy-sync` bounded MPMC channels to couple the acquisition
//! tasks, the command intake and the control loop.  Every channel is a
//! static, created once and alive for the whole process.
//!
//! ```text
//! ┌──────────────┐ SensorSample ┌──────────────┐
//! │   Sampler    │─────────────▶│              │
//! ├──────────────┤    f32       │              │
//! │  Flow task   │─────────────▶│ Control Loop │──▶ actuator
//! ├──────────────┤ Settings     │              │
//! │    Intake    │─────────────▶│              │
//! │              │ Command      │              │
//! │              │─────────────▶│              │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! Backpressure is uniform: senders wait at most a bounded timeout, then
//! drop the message and log a warning.  Nothing is retried.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, with_timeout};
use log::warn;

use crate::app::commands::ControllerCommand;
use crate::control::settings::ControlSettings;
use crate::sensors::SensorSample;

/// Temperature samples tolerate a brief consumer stall.
pub const TEMPERATURE_DEPTH: usize = 10;
/// Flow rates, same policy as temperature.
pub const FLOW_DEPTH: usize = 10;
/// Settings updates; the loop drains one per iteration.
pub const SETTINGS_DEPTH: usize = 2;
/// Discrete controller commands.
pub const COMMAND_DEPTH: usize = 4;

pub type TemperatureChannel = Channel<CriticalSectionRawMutex, SensorSample, TEMPERATURE_DEPTH>;
pub type TemperatureSender<'a> = Sender<'a, CriticalSectionRawMutex, SensorSample, TEMPERATURE_DEPTH>;
pub type TemperatureReceiver<'a> =
    Receiver<'a, CriticalSectionRawMutex, SensorSample, TEMPERATURE_DEPTH>;

pub type FlowChannel = Channel<CriticalSectionRawMutex, f32, FLOW_DEPTH>;
pub type FlowSender<'a> = Sender<'a, CriticalSectionRawMutex, f32, FLOW_DEPTH>;
pub type FlowReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, f32, FLOW_DEPTH>;

pub type SettingsChannel = Channel<CriticalSectionRawMutex, ControlSettings, SETTINGS_DEPTH>;
pub type SettingsSender<'a> = Sender<'a, CriticalSectionRawMutex, ControlSettings, SETTINGS_DEPTH>;
pub type SettingsReceiver<'a> =
    Receiver<'a, CriticalSectionRawMutex, ControlSettings, SETTINGS_DEPTH>;

pub type CommandChannel = Channel<CriticalSectionRawMutex, ControllerCommand, COMMAND_DEPTH>;
pub type CommandSender<'a> = Sender<'a, CriticalSectionRawMutex, ControllerCommand, COMMAND_DEPTH>;
pub type CommandReceiver<'a> =
    Receiver<'a, CriticalSectionRawMutex, ControllerCommand, COMMAND_DEPTH>;

/// Sampler → control loop.
pub static TEMPERATURE_CHANNEL: TemperatureChannel = Channel::new();

/// Flow task → control loop.
pub static FLOW_CHANNEL: FlowChannel = Channel::new();

/// Intake → control loop.
pub static SETTINGS_CHANNEL: SettingsChannel = Channel::new();

/// Intake → control loop.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();

/// Send with a bounded wait.  On timeout the message is dropped, a warning
/// naming the channel is logged, and `false` is returned.
pub async fn send_bounded<T, const N: usize>(
    tx: Sender<'_, CriticalSectionRawMutex, T, N>,
    msg: T,
    timeout: Duration,
    channel: &str,
) -> bool {
    if with_timeout(timeout, tx.send(msg)).await.is_ok() {
        true
    } else {
        warn!("Bus: {} channel full, message dropped", channel);
        false
    }
}

/// Receive with a bounded wait.  `None` when nothing arrived in time.
pub async fn recv_bounded<T, const N: usize>(
    rx: Receiver<'_, CriticalSectionRawMutex, T, N>,
    timeout: Duration,
) -> Option<T> {
    with_timeout(timeout, rx.receive()).await.ok()
}
