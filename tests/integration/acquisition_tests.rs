//! Flow acquisition feeding the control loop through the bus.

use core::sync::atomic::{AtomicU64, Ordering};

use embassy_time::Duration;
use futures_lite::future::block_on;
use stillctl::app::state::ControllerState;
use stillctl::app::telemetry::DataFrame;
use stillctl::control::controller::ControlLoop;
use stillctl::control::settings::ControlSettings;
use stillctl::sensors::flow::{FlowMeter, FlowTask, PulseTimer};

use crate::mock_hw::{MockHardware, TestBus, fast_config};

static CLOCK_US: AtomicU64 = AtomicU64::new(0);

fn clock() -> u64 {
    CLOCK_US.load(Ordering::Relaxed)
}

#[test]
fn pulses_become_a_published_flow_rate_then_decay_to_zero() {
    let bus = TestBus::new();
    let state = ControllerState::new();
    let config = fast_config();
    let pulses = PulseTimer::new();
    let mut flow = FlowTask::new(
        FlowMeter::new(&pulses, Duration::from_millis(1000)),
        bus.flow.sender(),
        config.flow_sample_period(),
        config.send_timeout(),
        clock,
    );
    let mut ctl = ControlLoop::new(
        &config,
        ControlSettings::DEFAULT,
        bus.links(),
        MockHardware::new(),
        &state,
    );

    // 100 ms between pulses: 10 Hz / 7.5 = 1.333 L/min.
    CLOCK_US.store(5_000_000, Ordering::Relaxed);
    pulses.on_pulse(4_900_000);
    pulses.on_pulse(5_000_000);
    assert!(block_on(flow.cycle()));
    block_on(ctl.iterate());
    let rate = state.get_flow_rate();
    assert!((rate - 1.333_333).abs() < 1e-3, "rate {}", rate);

    let frame = DataFrame::capture(&state, 5);
    assert_eq!(frame.flowrate, rate);

    // Pulses stop; after the freshness window the rate falls to zero.
    CLOCK_US.store(6_500_000, Ordering::Relaxed);
    assert!(block_on(flow.cycle()));
    block_on(ctl.iterate());
    assert_eq!(state.get_flow_rate(), 0.0);
}

#[test]
fn loop_keeps_last_flow_when_producer_is_silent() {
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

    bus.flow.try_send(2.5).unwrap();
    block_on(ctl.iterate());
    block_on(ctl.iterate());
    block_on(ctl.iterate());
    assert_eq!(state.get_flow_rate(), 2.5);
}

#[test]
fn newest_queued_flow_wins() {
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

    for r in [1.0, 1.5, 2.0] {
        bus.flow.try_send(r).unwrap();
    }
    bus.push_temps(40.0, 20.0);
    bus.push_temps(52.0, 21.0);
    block_on(ctl.iterate());
    assert_eq!(state.get_flow_rate(), 2.0);
    assert_eq!(state.get_hot_temp(), 52.0);
    assert!(bus.flow.is_empty());
}
