//! Message intake: decode, persist, and route onto the loop's channels.

use embassy_time::Duration;
use futures_lite::future::block_on;
use stillctl::adapters::console::{ConsoleStats, run_console};
use stillctl::app::intake::{Intake, Routed};
use stillctl::app::settings_store::{KEY_D_GAIN, KEY_SETPOINT, load_settings};
use stillctl::app::state::ControllerState;
use stillctl::control::controller::ControlLoop;
use stillctl::control::settings::ControlSettings;
use stillctl::error::DecodeError;

use crate::mock_hw::{MockHardware, MockStorage, TestBus, fast_config};

fn intake<'a>(bus: &'a TestBus, storage: MockStorage) -> Intake<'a, MockStorage> {
    Intake::new(
        storage,
        bus.settings.sender(),
        bus.commands.sender(),
        ControlSettings::DEFAULT,
        Duration::from_millis(1),
    )
}

#[test]
fn settings_message_reaches_the_loop_and_storage() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut intake = intake(&bus, MockStorage::new());
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    let routed = block_on(intake.handle("INFO&setpoint:78.25,P:30,I:2,D:150\n"));
    let expected = ControlSettings {
        setpoint: 78.25,
        p_gain: 30.0,
        i_gain: 2.0,
        d_gain: 150.0,
    };
    assert_eq!(
        routed,
        Ok(Routed::Settings {
            settings: expected,
            delivered: true
        })
    );
    assert_eq!(intake.storage().get(KEY_SETPOINT), Some(78_250));
    assert_eq!(intake.storage().get(KEY_D_GAIN), Some(150_000));
    assert_eq!(intake.storage().commits, 1);

    block_on(ctl.iterate());
    assert_eq!(ctl.settings(), expected);
    assert_eq!(state.get_controller_settings(), expected);
}

#[test]
fn partial_update_keeps_other_fields() {
    let bus = TestBus::new();
    let mut intake = intake(&bus, MockStorage::new());

    block_on(intake.handle("INFO&P:60")).unwrap();
    block_on(intake.handle("INFO&setpoint:72")).unwrap();

    let current = intake.current();
    assert_eq!(current.setpoint, 72.0);
    assert_eq!(current.p_gain, 60.0);
    assert_eq!(current.i_gain, ControlSettings::DEFAULT.i_gain);
    assert_eq!(bus.settings.len(), 2);
}

#[test]
fn persisted_settings_survive_a_restart() {
    let bus = TestBus::new();
    let mut intake = intake(&bus, MockStorage::new());
    block_on(intake.handle("INFO&setpoint:81.5,I:4.25")).unwrap();

    let mut rebooted = MockStorage::new();
    rebooted.data = intake.storage().data.clone();
    let loaded = load_settings(&mut rebooted);
    assert_eq!(loaded.setpoint, 81.5);
    assert_eq!(loaded.i_gain, 4.25);
    assert_eq!(loaded.p_gain, ControlSettings::DEFAULT.p_gain);
    // Every key was already present, so nothing was re-seeded.
    assert_eq!(rebooted.commits, 0);
}

#[test]
fn storage_failure_still_delivers_settings() {
    let bus = TestBus::new();
    let storage = MockStorage {
        fail_writes: true,
        ..MockStorage::default()
    };
    let mut intake = intake(&bus, storage);

    let routed = block_on(intake.handle("INFO&setpoint:66")).unwrap();
    assert!(matches!(routed, Routed::Settings { delivered: true, .. }));
    assert_eq!(intake.current().setpoint, 66.0);
    assert!(intake.storage().data.is_empty());
}

#[test]
fn full_settings_channel_keeps_last_delivered_settings() {
    let bus = TestBus::new();
    let mut intake = intake(&bus, MockStorage::new());

    block_on(intake.handle("INFO&setpoint:60")).unwrap();
    block_on(intake.handle("INFO&setpoint:61")).unwrap();
    let third = block_on(intake.handle("INFO&setpoint:62")).unwrap();

    assert!(matches!(third, Routed::Settings { delivered: false, .. }));
    assert_eq!(intake.current().setpoint, 61.0);
    assert_eq!(intake.storage().get(KEY_SETPOINT), Some(61_000));
    assert_eq!(bus.settings.len(), 2);
}

#[test]
fn rejected_messages_dispatch_nothing() {
    let bus = TestBus::new();
    let mut intake = intake(&bus, MockStorage::new());

    assert_eq!(block_on(intake.handle("")), Err(DecodeError::Empty));
    assert_eq!(
        block_on(intake.handle("STATUS&x:1&")),
        Err(DecodeError::UnknownHeader)
    );
    assert_eq!(
        block_on(intake.handle("INFO&bogus:1")),
        Err(DecodeError::Empty)
    );
    assert_eq!(
        block_on(intake.handle("CMD&pump:on&")),
        Err(DecodeError::UnknownCommand)
    );
    assert_eq!(
        block_on(intake.handle("CMD&fan:maybe&")),
        Err(DecodeError::InvalidArgument)
    );
    assert!(bus.settings.is_empty());
    assert!(bus.commands.is_empty());
    assert_eq!(intake.storage().commits, 0);
}

#[test]
fn firmware_update_is_returned_not_queued() {
    let bus = TestBus::new();
    let mut intake = intake(&bus, MockStorage::new());

    match block_on(intake.handle("CMD&OTA:192.168.1.40&")) {
        Ok(Routed::FirmwareUpdate(host)) => assert_eq!(host.as_str(), "192.168.1.40"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(bus.commands.is_empty());
}

#[test]
fn console_session_drives_the_loop() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut intake = intake(&bus, MockStorage::new());

    let script = "INFO&setpoint:70\r\nCMD&fan:on&\r\nCMD&element:1&\r\nCMD&flush:on&\r\nnoise\r\n";
    let stats = run_console(script.as_bytes(), &mut intake);
    assert_eq!(
        stats,
        ConsoleStats {
            routed: 4,
            rejected: 1,
            dropped: 0
        }
    );

    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );
    bus.push_temps(71.0, 19.0);
    let emitted = block_on(ctl.iterate());

    assert_eq!(emitted, 5000.0);
    assert_eq!(ctl.settings().setpoint, 70.0);
    assert!(ctl.actuator().fan_on());
    assert!(ctl.actuator().element_on());
    assert!(state.get_flush_status());
    assert!(bus.commands.is_empty());
}
