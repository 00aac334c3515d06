//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements    | Connects to                   |
//! |------------|---------------|-------------------------------|
//! | `hardware` | ActuatorPort  | ESP32 LEDC PWM, GPIO relays   |
//! | `nvs`      | StoragePort   | NVS / in-memory store         |
//! | `console`  | (transport)   | UART stdin → Intake           |

pub mod console;
pub mod hardware;
pub mod nvs;
