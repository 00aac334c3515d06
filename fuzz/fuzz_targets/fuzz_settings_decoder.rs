//! Fuzz target: `decode_settings`
//!
//! Arbitrary payloads must decode without panicking, and any accepted
//! update must leave every setting finite when applied.
//!
//! cargo fuzz run fuzz_settings_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use stillctl::control::settings::ControlSettings;
use stillctl::protocol::settings::decode_settings;

fuzz_target!(|data: &[u8]| {
    let payload = String::from_utf8_lossy(data);

    if let Ok(update) = decode_settings(&payload) {
        let s = update.apply(ControlSettings::DEFAULT);
        assert!(s.setpoint.is_finite());
        assert!(s.p_gain.is_finite());
        assert!(s.i_gain.is_finite());
        assert!(s.d_gain.is_finite());
    }
});
