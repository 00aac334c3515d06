//! Fixed-period control loop.
//!
//! ```text
//!  SETTINGS ─┐
//!  COMMAND  ─┤     ┌─────────────┐
//!  TEMPS    ─┼───▶ │ ControlLoop │ ──▶ ActuatorPort (pump duty, fan, element, LED)
//!  FLOW     ─┘     └─────────────┘ ──▶ ControllerState (read-only snapshot)
//! ```
//!
//! Each iteration wakes on an absolute schedule (`previous_wake + period`),
//! takes at most one pending settings update, applies queued commands,
//! refreshes the latest-value readers and emits one output.  Nothing in an
//! iteration can fail: stale inputs fall back to their last known value.

use embassy_time::{Duration, Ticker};
use log::info;

use crate::app::commands::ControllerCommand;
use crate::app::ports::ActuatorPort;
use crate::app::state::ControllerState;
use crate::channels::{
    COMMAND_CHANNEL, COMMAND_DEPTH, CommandReceiver, FLOW_CHANNEL, FlowReceiver,
    SETTINGS_CHANNEL, SettingsReceiver, TEMPERATURE_CHANNEL, TemperatureReceiver,
};
use crate::config::SystemConfig;
use crate::control::pid::PidController;
use crate::control::settings::ControlSettings;
use crate::sensors::HOT_SIDE;
use crate::sensors::readers::{FlowReader, TemperatureReader};

/// Channel endpoints the loop consumes.
pub struct LoopLinks<'a> {
    pub temperature: TemperatureReceiver<'a>,
    pub flow: FlowReceiver<'a>,
    pub settings: SettingsReceiver<'a>,
    pub commands: CommandReceiver<'a>,
}

impl LoopLinks<'static> {
    /// Endpoints on the process-wide channels.
    pub fn global() -> Self {
        Self {
            temperature: TEMPERATURE_CHANNEL.receiver(),
            flow: FLOW_CHANNEL.receiver(),
            settings: SETTINGS_CHANNEL.receiver(),
            commands: COMMAND_CHANNEL.receiver(),
        }
    }
}

pub struct ControlLoop<'a, A> {
    pid: PidController,
    settings: ControlSettings,
    temperatures: TemperatureReader<'a>,
    flow: FlowReader<'a>,
    settings_rx: SettingsReceiver<'a>,
    commands_rx: CommandReceiver<'a>,
    actuator: A,
    state: &'a ControllerState,
    flush_output: f32,
    period: Duration,
    /// Status LED was lit by the previous iteration.
    led_lit: bool,
}

impl<'a, A: ActuatorPort> ControlLoop<'a, A> {
    pub fn new(
        config: &SystemConfig,
        settings: ControlSettings,
        links: LoopLinks<'a>,
        actuator: A,
        state: &'a ControllerState,
    ) -> Self {
        state.publish_settings(settings);
        Self {
            pid: PidController::new(
                config.sample_interval_secs(),
                config.output_min,
                config.output_max,
            ),
            settings,
            temperatures: TemperatureReader::new(links.temperature, config.recv_timeout()),
            flow: FlowReader::new(links.flow, config.recv_timeout()),
            settings_rx: links.settings,
            commands_rx: links.commands,
            actuator,
            state,
            flush_output: config.flush_output,
            period: config.control_period(),
            led_lit: false,
        }
    }

    /// Run one iteration and return the value emitted to the actuator.
    pub async fn iterate(&mut self) -> f32 {
        if self.led_lit {
            self.actuator.set_status_led(false);
            self.led_lit = false;
        }

        // At most one settings update per iteration.
        if let Ok(update) = self.settings_rx.try_receive() {
            info!(
                "Controller: settings updated (setpoint {:.2}, P {:.3}, I {:.3}, D {:.3})",
                update.setpoint, update.p_gain, update.i_gain, update.d_gain
            );
            self.settings = update;
            self.state.publish_settings(update);
            self.actuator.set_status_led(true);
            self.led_lit = true;
        }

        for _ in 0..COMMAND_DEPTH {
            let Ok(cmd) = self.commands_rx.try_receive() else {
                break;
            };
            self.apply(cmd);
        }

        self.temperatures.refresh().await;
        self.flow.refresh().await;

        let computed = self.pid.compute(&self.settings, self.temperatures.get(HOT_SIDE));
        let emitted = if self.state.get_flush_status() {
            self.flush_output
        } else {
            computed
        };

        let duty = emitted as u32;
        self.actuator.set_output(duty);

        self.state.publish_temperatures(self.temperatures.latest());
        self.state.publish_flow_rate(self.flow.get());
        self.state.publish_output(duty);

        emitted
    }

    fn apply(&mut self, cmd: ControllerCommand) {
        info!("Controller: {:?}", cmd);
        match cmd {
            ControllerCommand::Flush(on) => self.state.set_flush(on),
            ControllerCommand::Fan(on) => {
                self.actuator.set_fan(on);
                self.state.publish_fan(on);
            }
            ControllerCommand::Element(on) => {
                self.actuator.set_element(on);
                self.state.publish_element(on);
            }
        }
    }

    /// Run forever.
    pub async fn run(mut self) {
        info!(
            "Controller: running every {} ms, setpoint {:.2}",
            self.period.as_millis(),
            self.settings.setpoint
        );
        let mut ticker = Ticker::every(self.period);
        loop {
            self.iterate().await;
            ticker.next().await;
        }
    }

    /// Run `n` iterations on the same absolute schedule as [`Self::run`],
    /// returning every emitted value.
    pub async fn run_iterations(&mut self, n: usize) -> Vec<f32> {
        let mut ticker = Ticker::every(self.period);
        let mut emitted = Vec::with_capacity(n);
        for _ in 0..n {
            emitted.push(self.iterate().await);
            ticker.next().await;
        }
        emitted
    }

    pub fn settings(&self) -> ControlSettings {
        self.settings
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
