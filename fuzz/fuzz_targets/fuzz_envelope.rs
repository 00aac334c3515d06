//! Fuzz target: `open_envelope`
//!
//! Feeds arbitrary text through the header split and, when a body comes
//! out, through the matching decoder.  Nothing may panic, and a body must
//! always be a slice of the first line.
//!
//! cargo fuzz run fuzz_envelope

#![no_main]

use libfuzzer_sys::fuzz_target;
use stillctl::protocol::command::decode_command;
use stillctl::protocol::settings::decode_settings;
use stillctl::protocol::{Envelope, open_envelope};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = core::str::from_utf8(data) else {
        return;
    };

    match open_envelope(raw) {
        Ok(Envelope::Info(body)) => {
            assert!(!body.contains('\n'), "body spans past the first line");
            let _ = decode_settings(body);
        }
        Ok(Envelope::Cmd(body)) => {
            assert!(!body.contains('\n'), "body spans past the first line");
            let _ = decode_command(body);
        }
        Err(_) => {}
    }
});
