//! Still controller firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ acquisition thread (App core)   control thread (App core, hi)  │
//! │  LocalExecutor                   ControlLoop                   │
//! │   ├─ TemperatureSampler ──┐        ▲        │                  │
//! │   └─ FlowTask ────────────┼──bus───┘        ▼                  │
//! │                           │               HardwareAdapter      │
//! │ console thread (Pro core) │               (pump, relays, LED)  │
//! │  stdin ─▶ Intake ─────────┘                                    │
//! │                                                                │
//! │ main thread: telemetry frames every interval                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use stillctl::adapters::console::run_console;
use stillctl::adapters::hardware::HardwareAdapter;
use stillctl::adapters::nvs::NvsAdapter;
use stillctl::app::intake::Intake;
use stillctl::app::settings_store::load_settings;
use stillctl::app::state::CONTROLLER_STATE;
use stillctl::app::telemetry::{DataFrame, StatusFrame};
use stillctl::channels::{FLOW_CHANNEL, TEMPERATURE_CHANNEL};
use stillctl::config::SystemConfig;
use stillctl::control::controller::{ControlLoop, LoopLinks};
use stillctl::drivers::hw_init;
use stillctl::drivers::pump::PumpDriver;
use stillctl::drivers::task_pin::{Core, TaskSpec};
use stillctl::sensors::flow::{FLOW_PULSES, FlowMeter, FlowTask};
use stillctl::sensors::onewire::BitBangWire;
use stillctl::sensors::temperature::{ProbeArray, TemperatureSampler};

// ── Thread placement ──────────────────────────────────────────
const CONTROL_TASK: TaskSpec = TaskSpec::new("control\0", Core::App, 10, 8);
const ACQUISITION_TASK: TaskSpec = TaskSpec::new("acquire\0", Core::App, 8, 8);
const CONSOLE_TASK: TaskSpec = TaskSpec::new("console\0", Core::Pro, 5, 8);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  stillctl v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate().context("compiled-in configuration")?;

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        return Err(e.into());
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}, flow will read zero", e);
    }
    let peripherals = Peripherals::take()?;
    let onewire_pin = peripherals.pins.gpio18;

    // ── 3. Persisted settings ─────────────────────────────────
    let mut nvs = NvsAdapter::new().context("NVS init")?;
    let settings = load_settings(&mut nvs);

    // ── 4. Acquisition: temperature sampler + flow task ───────
    let acq_config = config.clone();
    ACQUISITION_TASK.spawn(move || {
        let wire = PinDriver::input_output_od(onewire_pin)
            .map_err(|_| stillctl::error::BusError::Pin)
            .and_then(|pin| BitBangWire::new(pin, Ets));
        let probes = match wire.and_then(|w| ProbeArray::discover(w, acq_config.probe_resolution)) {
            Ok(p) => p,
            Err(e) => {
                error!("Sensors: one-wire bus unusable ({}), acquisition stopped", e);
                return;
            }
        };

        let sampler = TemperatureSampler::new(
            probes,
            TEMPERATURE_CHANNEL.sender(),
            acq_config.temp_sample_period(),
            acq_config.send_timeout(),
        );
        let flow = FlowTask::new(
            FlowMeter::new(&FLOW_PULSES, acq_config.flow_freshness()),
            FLOW_CHANNEL.sender(),
            acq_config.flow_sample_period(),
            acq_config.send_timeout(),
            hw_init::uptime_us,
        );

        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
        executor.spawn(sampler.run()).detach();
        executor.spawn(flow.run()).detach();
        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    })?;

    // ── 5. Control loop ───────────────────────────────────────
    let ctl_config = config.clone();
    CONTROL_TASK.spawn(move || {
        let hw = HardwareAdapter::new(PumpDriver::new());
        let ctl = ControlLoop::new(
            &ctl_config,
            settings,
            LoopLinks::global(),
            hw,
            &CONTROLLER_STATE,
        );
        futures_lite::future::block_on(ctl.run());
    })?;

    // ── 6. Serial console intake ──────────────────────────────
    let send_timeout = config.send_timeout();
    CONSOLE_TASK.spawn(move || {
        let mut intake = Intake::global(nvs, settings, send_timeout);
        let stdin = std::io::stdin();
        run_console(stdin.lock(), &mut intake);
        warn!("Console: intake stopped");
    })?;

    info!("System ready.");

    // ── 7. Telemetry ──────────────────────────────────────────
    let interval = std::time::Duration::from_millis(u64::from(config.telemetry_interval_ms));
    loop {
        std::thread::sleep(interval);
        let uptime = hw_init::uptime_us() / 1_000_000;
        match serde_json::to_string(&DataFrame::capture(&CONTROLLER_STATE, uptime)) {
            Ok(json) => info!("{}", json),
            Err(e) => warn!("Telemetry: data frame not encoded: {}", e),
        }
        match serde_json::to_string(&StatusFrame::capture(&CONTROLLER_STATE)) {
            Ok(json) => info!("{}", json),
            Err(e) => warn!("Telemetry: status frame not encoded: {}", e),
        }
    }
}
