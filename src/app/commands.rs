//! Discrete commands for the control loop.
//!
//! Decoded from `CMD&name:arg&` messages by the intake and delivered over
//! the command channel.  The loop applies them between PID iterations.

use crate::error::DecodeError;
use crate::protocol::command::Command;

/// Commands the control loop understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    /// Force the flush output regardless of the PID result.
    Flush(bool),
    /// Condenser fan relay.
    Fan(bool),
    /// Boiler heating element relay.
    Element(bool),
}

/// Parse an on/off argument, case-insensitive.
fn parse_switch(arg: &str) -> Result<bool, DecodeError> {
    let arg = arg.trim();
    if ["on", "1", "true"].iter().any(|v| arg.eq_ignore_ascii_case(v)) {
        Ok(true)
    } else if ["off", "0", "false"].iter().any(|v| arg.eq_ignore_ascii_case(v)) {
        Ok(false)
    } else {
        Err(DecodeError::InvalidArgument)
    }
}

impl TryFrom<&Command> for ControllerCommand {
    type Error = DecodeError;

    fn try_from(cmd: &Command) -> Result<Self, Self::Error> {
        let name = cmd.name().trim();
        let make: fn(bool) -> Self = if name.eq_ignore_ascii_case("flush") {
            Self::Flush
        } else if name.eq_ignore_ascii_case("fan") {
            Self::Fan
        } else if name.eq_ignore_ascii_case("element") {
            Self::Element
        } else {
            return Err(DecodeError::UnknownCommand);
        };
        parse_switch(cmd.arg()).map(make)
    }
}
