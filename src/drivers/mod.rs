//! Actuator drivers, hardware initialisation, and thread helpers.

pub mod hw_init;
pub mod pump;
pub mod task_pin;
