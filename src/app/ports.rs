//! Port traits: the boundary between controller logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop / Intake
//! ```
//!
//! Driven adapters (actuator outputs, persistent storage) implement these
//! traits.  The control loop and the intake consume them via generics, so
//! neither touches hardware directly and both run on the host under test.

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the control loop calls this to drive outputs.
pub trait ActuatorPort {
    /// Set the pump PWM duty, in raw 13-bit timer counts.
    fn set_output(&mut self, duty: u32);

    /// Switch the condenser fan.
    fn set_fan(&mut self, on: bool);

    /// Switch the boiler heating element.
    fn set_element(&mut self, on: bool);

    /// Status LED; lit for one control period when new settings land.
    fn set_status_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced integer key-value storage.
///
/// Writes become durable only after [`StoragePort::commit`].  The ESP-IDF
/// NVS API guarantees each committed write is atomic on power loss.
pub trait StoragePort {
    /// Read a value.  `Ok(None)` when the key has never been written.
    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>, StorageError>;

    /// Stage a write.
    fn set_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), StorageError>;

    /// Flush staged writes in `namespace`.
    fn commit(&mut self, namespace: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Namespace could not be opened.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "namespace not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "storage I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
