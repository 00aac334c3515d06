//! Application core: routing, shared state and the port boundary.
//!
//! Everything here is hardware-agnostic.  Outputs and persistence go
//! through the traits in [`ports`], so the whole layer runs on the host
//! against mock adapters.

pub mod commands;
pub mod intake;
pub mod ports;
pub mod settings_store;
pub mod state;
pub mod telemetry;
