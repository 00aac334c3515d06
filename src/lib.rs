//! Still controller firmware library.
//!
//! Exposes every module for integration testing and host simulation.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channels;
pub mod config;
pub mod control;
pub mod error;
pub mod pins;
pub mod protocol;
pub mod sensors;

// Hardware-facing modules compile on the host against in-memory stand-ins.
pub mod adapters;
pub mod drivers;
