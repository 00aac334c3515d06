//! Inbound message routing.
//!
//! ```text
//!  raw text ──▶ open_envelope ─┬─ INFO ─▶ decode_settings ─▶ SETTINGS_CHANNEL ─▶ persist
//!                              └─ CMD  ─▶ decode_command ──┬─ OTA ───▶ returned to caller
//!                                                          └─ other ─▶ COMMAND_CHANNEL
//! ```
//!
//! Decode failures are returned to the caller and nothing is dispatched.
//! A full channel is not a decode failure: the message is dropped with a
//! warning, like any other producer on the bus.

use embassy_time::Duration;
use heapless::String;
use log::{info, warn};

use crate::app::commands::ControllerCommand;
use crate::app::ports::StoragePort;
use crate::app::settings_store::persist_settings;
use crate::channels::{
    COMMAND_CHANNEL, CommandSender, SETTINGS_CHANNEL, SettingsSender, send_bounded,
};
use crate::control::settings::ControlSettings;
use crate::error::DecodeError;
use crate::protocol::command::{Command, MAX_ARG_LEN, decode_command};
use crate::protocol::settings::decode_settings;
use crate::protocol::{Envelope, open_envelope};

/// Command name reserved for firmware-update requests.
pub const COMMAND_OTA: &str = "OTA";

/// Where a message ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Full settings after the update; `delivered` is false when the
    /// settings channel stayed full past the send timeout.
    Settings {
        settings: ControlSettings,
        delivered: bool,
    },
    Command {
        command: ControllerCommand,
        delivered: bool,
    },
    /// Firmware update requested from this host.
    FirmwareUpdate(String<MAX_ARG_LEN>),
}

/// Routes decoded messages onto the bus and persists settings.
pub struct Intake<'a, S> {
    storage: S,
    settings_tx: SettingsSender<'a>,
    commands_tx: CommandSender<'a>,
    send_timeout: Duration,
    /// Settings last sent to the loop; partial updates apply on top.
    current: ControlSettings,
}

impl<S: StoragePort> Intake<'static, S> {
    /// Intake on the process-wide channels.
    pub fn global(storage: S, current: ControlSettings, send_timeout: Duration) -> Self {
        Self::new(
            storage,
            SETTINGS_CHANNEL.sender(),
            COMMAND_CHANNEL.sender(),
            current,
            send_timeout,
        )
    }
}

impl<'a, S: StoragePort> Intake<'a, S> {
    pub fn new(
        storage: S,
        settings_tx: SettingsSender<'a>,
        commands_tx: CommandSender<'a>,
        current: ControlSettings,
        send_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            settings_tx,
            commands_tx,
            send_timeout,
            current,
        }
    }

    /// Decode one raw message and dispatch it.
    pub async fn handle(&mut self, raw: &str) -> Result<Routed, DecodeError> {
        match open_envelope(raw)? {
            Envelope::Info(body) => self.handle_settings(body).await,
            Envelope::Cmd(body) => self.handle_command(&decode_command(body)?).await,
        }
    }

    async fn handle_settings(&mut self, body: &str) -> Result<Routed, DecodeError> {
        let update = decode_settings(body)?;
        if update.is_empty() {
            info!("Intake: settings message with no recognised key ignored");
            return Err(DecodeError::Empty);
        }

        let settings = update.apply(self.current);
        info!(
            "Intake: INFO setpoint {:.2}, P {:.3}, I {:.3}, D {:.3}",
            settings.setpoint, settings.p_gain, settings.i_gain, settings.d_gain
        );
        // Only an update the loop will see becomes current and persisted.
        let delivered = send_bounded(self.settings_tx, settings, self.send_timeout, "settings").await;
        if !delivered {
            warn!("Intake: settings dropped, keeping setpoint {:.2}", self.current.setpoint);
            return Ok(Routed::Settings { settings, delivered });
        }

        if let Err(e) = persist_settings(&mut self.storage, &settings) {
            warn!("Intake: settings not persisted: {}", e);
        }
        self.current = settings;
        Ok(Routed::Settings { settings, delivered })
    }

    async fn handle_command(&mut self, cmd: &Command) -> Result<Routed, DecodeError> {
        if cmd.name() == COMMAND_OTA {
            info!("Intake: firmware update requested from {}", cmd.arg());
            return Ok(Routed::FirmwareUpdate(cmd.arg.clone()));
        }

        let command = ControllerCommand::try_from(cmd)?;
        info!("Intake: CMD {:?}", command);
        let delivered = send_bounded(self.commands_tx, command, self.send_timeout, "command").await;
        Ok(Routed::Command { command, delivered })
    }

    pub fn current(&self) -> ControlSettings {
        self.current
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::StorageError;
    use crate::channels::{CommandChannel, SettingsChannel};
    use embassy_sync::channel::Channel;
    use futures_lite::future::block_on;

    #[derive(Default)]
    struct Counting {
        commits: usize,
        fail: bool,
    }

    impl StoragePort for Counting {
        fn get_i32(&self, _: &str, _: &str) -> Result<Option<i32>, StorageError> {
            Ok(None)
        }
        fn set_i32(&mut self, _: &str, _: &str, _: i32) -> Result<(), StorageError> {
            if self.fail {
                Err(StorageError::Full)
            } else {
                Ok(())
            }
        }
        fn commit(&mut self, _: &str) -> Result<(), StorageError> {
            self.commits += 1;
            Ok(())
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(5);

    #[test]
    fn info_is_persisted_and_queued() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        let routed = block_on(intake.handle("INFO&setpoint:72.5,P:10.0\n")).unwrap();
        let expected = ControlSettings {
            setpoint: 72.5,
            p_gain: 10.0,
            ..ControlSettings::DEFAULT
        };
        assert_eq!(
            routed,
            Routed::Settings {
                settings: expected,
                delivered: true
            }
        );
        assert_eq!(settings.try_receive().ok(), Some(expected));
        assert_eq!(intake.storage().commits, 1);
    }

    #[test]
    fn partial_updates_stack() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        block_on(intake.handle("INFO&setpoint:70")).unwrap();
        block_on(intake.handle("INFO&D:120")).unwrap();
        assert_eq!(intake.current().setpoint, 70.0);
        assert_eq!(intake.current().d_gain, 120.0);
    }

    #[test]
    fn storage_failure_still_delivers() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting {
                fail: true,
                ..Counting::default()
            },
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        block_on(intake.handle("INFO&setpoint:65")).unwrap();
        assert_eq!(settings.len(), 1);
    }

    #[test]
    fn dropped_update_is_neither_current_nor_persisted() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        block_on(intake.handle("INFO&setpoint:60")).unwrap();
        block_on(intake.handle("INFO&setpoint:61")).unwrap();
        assert!(settings.is_full());

        let routed = block_on(intake.handle("INFO&setpoint:62")).unwrap();
        assert!(matches!(routed, Routed::Settings { delivered: false, .. }));
        assert_eq!(intake.current().setpoint, 61.0);
        assert_eq!(intake.storage().commits, 2);

        // Once the loop drains, the next update builds on the delivered one.
        settings.clear();
        block_on(intake.handle("INFO&P:12")).unwrap();
        let sent = settings.try_receive().unwrap();
        assert_eq!(sent.setpoint, 61.0);
        assert_eq!(sent.p_gain, 12.0);
    }

    #[test]
    fn unknown_keys_only_is_rejected() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        assert_eq!(block_on(intake.handle("INFO&foo:1.0")), Err(DecodeError::Empty));
        assert!(settings.is_empty());
    }

    #[test]
    fn commands_are_queued() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        block_on(intake.handle("CMD&flush:on&\n")).unwrap();
        assert_eq!(commands.try_receive().ok(), Some(ControllerCommand::Flush(true)));
    }

    #[test]
    fn ota_goes_back_to_caller() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        let routed = block_on(intake.handle("CMD&OTA:10.0.0.5&")).unwrap();
        assert_eq!(routed, Routed::FirmwareUpdate(String::try_from("10.0.0.5").unwrap()));
        assert!(commands.is_empty());
    }

    #[test]
    fn malformed_messages_are_not_dispatched() {
        let settings: SettingsChannel = Channel::new();
        let commands: CommandChannel = Channel::new();
        let mut intake = Intake::new(
            Counting::default(),
            settings.sender(),
            commands.sender(),
            ControlSettings::DEFAULT,
            TIMEOUT,
        );
        assert_eq!(
            block_on(intake.handle("CMD&flush-on&")),
            Err(DecodeError::MissingDelimiter(':'))
        );
        assert_eq!(block_on(intake.handle("PING&x")), Err(DecodeError::UnknownHeader));
        assert_eq!(block_on(intake.handle("")), Err(DecodeError::Empty));
        assert!(commands.is_empty());
        assert!(settings.is_empty());
    }
}
