//! Persisted operator settings.
//!
//! Each field is stored as a signed 32-bit integer scaled by 1000 under
//! namespace `storage`.  Storage trouble is never fatal: the compiled-in
//! default stands in for anything that cannot be read.

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::control::settings::{ControlSettings, from_fixed, to_fixed};

pub const NAMESPACE: &str = "storage";
pub const KEY_SETPOINT: &str = "setpoint";
pub const KEY_P_GAIN: &str = "P_gain";
pub const KEY_I_GAIN: &str = "I_gain";
pub const KEY_D_GAIN: &str = "D_gain";

fn fields(settings: &mut ControlSettings) -> [(&'static str, &mut f32); 4] {
    [
        (KEY_SETPOINT, &mut settings.setpoint),
        (KEY_P_GAIN, &mut settings.p_gain),
        (KEY_I_GAIN, &mut settings.i_gain),
        (KEY_D_GAIN, &mut settings.d_gain),
    ]
}

/// Load settings, seeding storage with defaults for keys never written.
pub fn load_settings<S: StoragePort + ?Sized>(storage: &mut S) -> ControlSettings {
    let mut settings = ControlSettings::DEFAULT;
    let mut seeded = false;

    for (key, slot) in fields(&mut settings) {
        match storage.get_i32(NAMESPACE, key) {
            Ok(Some(raw)) => *slot = from_fixed(raw),
            Ok(None) => {
                info!("Settings: {} not stored, writing default {}", key, *slot);
                match storage.set_i32(NAMESPACE, key, to_fixed(*slot)) {
                    Ok(()) => seeded = true,
                    Err(e) => warn!("Settings: could not store default {}: {}", key, e),
                }
            }
            Err(e) => warn!("Settings: could not read {} ({}), using default", key, e),
        }
    }

    if seeded {
        if let Err(e) = storage.commit(NAMESPACE) {
            warn!("Settings: commit of defaults failed: {}", e);
        }
    }

    info!(
        "Settings: setpoint {:.2}, P {:.3}, I {:.3}, D {:.3}",
        settings.setpoint, settings.p_gain, settings.i_gain, settings.d_gain
    );
    settings
}

/// Write all four settings and commit.
pub fn persist_settings<S: StoragePort + ?Sized>(
    storage: &mut S,
    settings: &ControlSettings,
) -> Result<(), StorageError> {
    let mut copy = *settings;
    for (key, value) in fields(&mut copy) {
        storage.set_i32(NAMESPACE, key, to_fixed(*value))?;
    }
    storage.commit(NAMESPACE)
}
