//! Line-oriented text protocol.
//!
//! Inbound messages arrive as `HEADER&BODY\n`:
//!
//! | Header | Body                          | Decoder                          |
//! |--------|-------------------------------|----------------------------------|
//! | `INFO` | `key:value,key:value,...`     | [`settings::decode_settings`]    |
//! | `CMD`  | `COMMAND:ARG&...`             | [`command::decode_command`]      |
//!
//! Every decoder here is pure: it borrows the payload, returns a value and
//! keeps nothing between calls.  Routing the decoded value to the bus is
//! done by [`crate::app::intake`].

pub mod command;
pub mod settings;

use crate::error::DecodeError;

pub const HEADER_INFO: &str = "INFO";
pub const HEADER_CMD: &str = "CMD";

/// A message split into header kind and undecoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope<'a> {
    /// Settings update body.
    Info(&'a str),
    /// Command body, still carrying its own `&` terminator.
    Cmd(&'a str),
}

/// Split one raw message into its envelope.
///
/// Only the first line is considered.  The header ends at the first `&`
/// and must match exactly.
pub fn open_envelope(raw: &str) -> Result<Envelope<'_>, DecodeError> {
    let line = raw.split('\n').next().unwrap_or_default();
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (header, body) = line
        .split_once('&')
        .ok_or(DecodeError::MissingDelimiter('&'))?;

    match header {
        HEADER_INFO => Ok(Envelope::Info(body)),
        HEADER_CMD => Ok(Envelope::Cmd(body)),
        _ => Err(DecodeError::UnknownHeader),
    }
}
