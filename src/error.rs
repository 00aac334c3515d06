//! Unified error types for the still controller firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! start-up error handling uniform.  All variants are `Copy` so they can be
//! passed across task boundaries and logged without allocation.
//!
//! Periodic tasks never return these: transient failures are recovered
//! locally (last-known-good values, drop-on-full).  They surface only from
//! initialisation and from the protocol decoders.

use core::fmt;

pub use crate::app::ports::StorageError;
pub use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A settings or command payload could not be decoded.
    Decode(DecodeError),
    /// The one-wire probe bus misbehaved.
    Bus(BusError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol decode errors
// ---------------------------------------------------------------------------

/// Outcome of a payload that cannot be dispatched.
///
/// Malformed numeric values inside a settings payload are NOT errors (they
/// coerce to zero); everything here means the message is rejected as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload contained no fields at all.
    Empty,
    /// A required delimiter was not found.
    MissingDelimiter(char),
    /// Command name is empty (`:arg&`).
    EmptyCommand,
    /// A command name or argument exceeds its fixed capacity.
    TooLong,
    /// Envelope header is neither `INFO` nor `CMD`.
    UnknownHeader,
    /// Command name is not one the controller understands.
    UnknownCommand,
    /// Command argument is not a recognised on/off value.
    InvalidArgument,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::MissingDelimiter(c) => write!(f, "missing '{c}' delimiter"),
            Self::EmptyCommand => write!(f, "empty command name"),
            Self::TooLong => write!(f, "field too long"),
            Self::UnknownHeader => write!(f, "unknown message header"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::InvalidArgument => write!(f, "invalid command argument"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// One-wire bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The bus was not released high by the pull-up before a reset.
    BusNotHigh,
    /// No device answered the reset pulse.
    NoPresence,
    /// GPIO read or write failed.
    Pin,
    /// Received data failed its CRC-8 check.
    CrcMismatch,
    /// A device answered with data that makes no sense (e.g. hot-plug
    /// during a search, unknown configuration register).
    UnexpectedResponse,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusNotHigh => write!(f, "bus not pulled high"),
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::Pin => write!(f, "pin error"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
