//! Command payload decoder.
//!
//! Grammar: `COMMAND:ARGUMENT&...` with an optional trailing newline.  The
//! split is strict on the first `:` and the first `&` after it; any further
//! `&`-delimited fields are ignored.

use heapless::String;

use crate::error::DecodeError;

pub const MAX_COMMAND_LEN: usize = 16;
pub const MAX_ARG_LEN: usize = 32;

/// One decoded discrete instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String<MAX_COMMAND_LEN>,
    pub arg: String<MAX_ARG_LEN>,
}

impl Command {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn arg(&self) -> &str {
        self.arg.as_str()
    }
}

/// Decode a command payload.
///
/// A payload missing either delimiter is a decode failure; nothing is
/// defaulted.  The argument may be empty (`flush:&`), the name may not.
pub fn decode_command(payload: &str) -> Result<Command, DecodeError> {
    let payload = payload.trim_end_matches(['\r', '\n']);

    let (name, rest) = payload
        .split_once(':')
        .ok_or(DecodeError::MissingDelimiter(':'))?;
    let (arg, _) = rest
        .split_once('&')
        .ok_or(DecodeError::MissingDelimiter('&'))?;

    if name.is_empty() {
        return Err(DecodeError::EmptyCommand);
    }

    Ok(Command {
        name: String::try_from(name).map_err(|_| DecodeError::TooLong)?,
        arg: String::try_from(arg).map_err(|_| DecodeError::TooLong)?,
    })
}
