//! Control loop behaviour against mock hardware and test-local channels.

use std::time::{Duration as StdDuration, Instant};

use futures_lite::future::block_on;
use stillctl::app::commands::ControllerCommand;
use stillctl::app::state::ControllerState;
use stillctl::config::SystemConfig;
use stillctl::control::controller::ControlLoop;
use stillctl::control::settings::ControlSettings;

use crate::mock_hw::{ActuatorCall, MockHardware, TestBus, fast_config};

#[test]
fn end_to_end_hot_column_winds_integral_up() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    bus.push_temps(60.0, 20.0);
    let mut integrals = Vec::new();
    let mut outputs = Vec::new();
    for _ in 0..6 {
        outputs.push(block_on(ctl.iterate()));
        integrals.push(ctl.pid().integral());
    }

    // First step: P 450 plus a large derivative kick, clamped at the ceiling.
    assert_eq!(outputs[0], 8190.0);
    // The integral is held while the previous output sat at the ceiling.
    assert_eq!(integrals[1], integrals[0]);
    // Afterwards it climbs every iteration and the output never falls.
    for w in integrals[1..].windows(2) {
        assert!(w[1] > w[0], "integral must grow: {:?}", integrals);
    }
    for w in outputs[1..].windows(2) {
        assert!(w[1] >= w[0], "output must not fall: {:?}", outputs);
    }
    assert!(outputs.iter().all(|o| (1350.0..=8190.0).contains(o)));

    let duties = ctl.actuator().outputs();
    assert_eq!(duties.len(), 6);
    assert_eq!(state.last_output(), *duties.last().unwrap());
    assert_eq!(state.get_hot_temp(), 60.0);
    assert_eq!(state.get_cold_temp(), 20.0);
}

#[test]
fn cold_column_sits_on_the_floor() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    bus.push_temps(20.0, 15.0);
    let emitted: Vec<f32> = (0..5).map(|_| block_on(ctl.iterate())).collect();
    assert!(emitted.iter().all(|&o| o == 1350.0));
    // Pinned at the floor with negative error, so the integral never moves.
    let held = ctl.pid().integral();
    block_on(ctl.iterate());
    assert_eq!(ctl.pid().integral(), held);
}

#[test]
fn no_temperature_input_reads_zero_and_still_emits() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    assert_eq!(block_on(ctl.iterate()), 1350.0);
    assert_eq!(state.get_hot_temp(), 0.0);
    assert_eq!(ctl.actuator().outputs(), vec![1350]);
}

#[test]
fn flush_command_pins_output_until_cleared() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );
    bus.push_temps(55.0, 18.0);
    block_on(ctl.iterate());
    let before = ctl.pid().integral();

    bus.commands.try_send(ControllerCommand::Flush(true)).unwrap();
    for _ in 0..3 {
        assert_eq!(block_on(ctl.iterate()), 5000.0);
    }
    assert!(state.get_flush_status());
    // The PID kept running underneath the override.
    assert!(ctl.pid().integral() > before + 0.5);

    bus.commands.try_send(ControllerCommand::Flush(false)).unwrap();
    assert_eq!(block_on(ctl.iterate()), 1350.0);
    assert!(!state.get_flush_status());
}

#[test]
fn relay_commands_reach_hardware_and_state() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    bus.commands.try_send(ControllerCommand::Fan(true)).unwrap();
    bus.commands.try_send(ControllerCommand::Element(true)).unwrap();
    bus.commands.try_send(ControllerCommand::Element(false)).unwrap();
    block_on(ctl.iterate());

    assert!(ctl.actuator().fan_on());
    assert!(!ctl.actuator().element_on());
    assert!(state.get_fan_status());
    assert!(!state.get_element_status());
    // Commands are applied before the iteration's output.
    assert_eq!(
        ctl.actuator().calls.last(),
        Some(&ActuatorCall::Output(1350))
    );
}

#[test]
fn settings_update_lights_led_for_one_period() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    let update = ControlSettings {
        setpoint: 78.0,
        ..ControlSettings::DEFAULT
    };
    bus.settings.try_send(update).unwrap();
    block_on(ctl.iterate());
    block_on(ctl.iterate());
    block_on(ctl.iterate());

    assert_eq!(ctl.settings(), update);
    assert_eq!(state.get_controller_settings(), update);
    assert_eq!(ctl.actuator().led_history(), vec![true, false]);
}

#[test]
fn queued_settings_take_effect_one_per_iteration() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    let a = ControlSettings {
        setpoint: 60.0,
        ..ControlSettings::DEFAULT
    };
    let b = ControlSettings {
        setpoint: 65.0,
        ..ControlSettings::DEFAULT
    };
    bus.settings.try_send(a).unwrap();
    bus.settings.try_send(b).unwrap();

    block_on(ctl.iterate());
    assert_eq!(ctl.settings().setpoint, 60.0);
    block_on(ctl.iterate());
    assert_eq!(ctl.settings().setpoint, 65.0);
}

#[test]
fn run_iterations_holds_an_absolute_period() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    // Empty bus: each iteration spends two receive timeouts, 100 of its 200 ms.
    let config = SystemConfig {
        recv_timeout_ms: 50,
        ..SystemConfig::default()
    };
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    let started = Instant::now();
    let emitted = block_on(ctl.run_iterations(5));
    let elapsed = started.elapsed();

    assert_eq!(emitted.len(), 5);
    assert_eq!(ctl.actuator().outputs().len(), 5);
    // Sleeping a full period after each iteration would take ~1500 ms.
    assert!(
        elapsed >= StdDuration::from_millis(950) && elapsed < StdDuration::from_millis(1200),
        "5 iterations at 5 Hz took {:?}",
        elapsed
    );
}
