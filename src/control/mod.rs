//! Closed-loop control: PID, operator settings and the periodic loop.

pub mod controller;
pub mod pid;
pub mod settings;
