//! Fuzz target: `decode_command`
//!
//! Drives arbitrary text into the command decoder and the controller
//! command mapping.  Accepted commands must have a non-empty name and
//! fit their fixed-capacity fields.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use stillctl::app::commands::ControllerCommand;
use stillctl::protocol::command::{MAX_ARG_LEN, MAX_COMMAND_LEN, decode_command};

fuzz_target!(|data: &[u8]| {
    let payload = String::from_utf8_lossy(data);

    if let Ok(cmd) = decode_command(&payload) {
        assert!(!cmd.name().is_empty());
        assert!(cmd.name().len() <= MAX_COMMAND_LEN);
        assert!(cmd.arg().len() <= MAX_ARG_LEN);
        let _ = ControllerCommand::try_from(&cmd);
    }
});
