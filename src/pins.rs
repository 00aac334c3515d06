//! GPIO / peripheral pin assignments for the still controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Coolant pump (PWM speed control)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the coolant pump motor driver.
pub const PUMP_PWM_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Relays
// ---------------------------------------------------------------------------

/// Digital output: radiator fan relay (active HIGH).
pub const FAN_CTRL_GPIO: i32 = 26;
/// Digital output: boiler element contactor (active HIGH).
pub const ELEMENT_CTRL_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DS18B20 one-wire bus (open-drain, external 4.7 kΩ pull-up).
/// Claimed as `peripherals.pins.gpio18` in `main`; keep the two in sync.
pub const ONEWIRE_GPIO: i32 = 18;

/// YF-S201 hall-effect flow sensor, pulse output, interrupt-driven.
pub const FLOW_PULSE_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED, pulsed when a settings update is applied.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  13-bit gives 0 – 8191 duty levels, the
/// same scale as the controller output range.
pub const PWM_RESOLUTION_BITS: u32 = 13;
/// LEDC base frequency for the pump motor (5 kHz, the highest frequency a
/// 13-bit timer reaches from the 80 MHz APB clock with margin).
pub const PUMP_PWM_FREQ_HZ: u32 = 5_000;
