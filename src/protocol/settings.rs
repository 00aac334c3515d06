//! Settings payload decoder.
//!
//! Grammar: `key1:value1,key2:value2,...` with an optional trailing newline.
//!
//! ```text
//!   "setpoint:55.0,P:45.0,I:10.0,D:300.0\n"
//!        │          │
//!        ▼          ▼
//!   Fields [(setpoint, 55.0), (P, 45.0), (I, 10.0), (D, 300.0)]
//!        │
//!        ▼  recognised keys only
//!   SettingsUpdate { setpoint: Some(55.0), p_gain: Some(45.0), .. }
//! ```
//!
//! A value that does not parse as a finite decimal is coerced to `0.0` and a
//! warning is logged; the rest of the payload still applies.

use heapless::{String, Vec};
use log::warn;

use crate::control::settings::ControlSettings;
use crate::error::DecodeError;

/// Longest key accepted; longer keys are skipped.
pub const MAX_KEY_LEN: usize = 16;
/// Most fields kept from one payload; the rest are ignored.  Keys the
/// caller filters out do not count.
pub const MAX_FIELDS: usize = 8;

pub const KEY_SETPOINT: &str = "setpoint";
pub const KEY_P: &str = "P";
pub const KEY_I: &str = "I";
pub const KEY_D: &str = "D";

/// One decoded `key:value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String<MAX_KEY_LEN>,
    pub value: f32,
}

/// Ordered fields of one payload.  Keys are unique: the first occurrence
/// of a key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    fields: Vec<Field, MAX_FIELDS>,
}

impl Fields {
    /// Exact, case-sensitive key lookup.
    pub fn get(&self, key: &str) -> Option<f32> {
        self.fields
            .iter()
            .find(|f| f.key.as_str() == key)
            .map(|f| f.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

/// Split a payload into its `key:value` fields.
///
/// Tokens without a `:` or with an over-long key are skipped with a
/// warning.  The split is on the first `:` only.
pub fn decode_fields(payload: &str) -> Fields {
    decode_fields_where(payload, |_| true)
}

/// Like [`decode_fields`], keeping only keys for which `keep` returns true.
/// `keep` sees every well-formed key, in payload order.
pub fn decode_fields_where(payload: &str, mut keep: impl FnMut(&str) -> bool) -> Fields {
    let mut out = Fields::default();

    for token in payload.trim_end_matches(['\r', '\n']).split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let Some((key, value)) = token.split_once(':') else {
            warn!("Protocol: token '{}' has no ':', skipped", token);
            continue;
        };
        let key = key.trim();
        let Ok(key) = String::<MAX_KEY_LEN>::try_from(key) else {
            warn!("Protocol: key '{}' longer than {} bytes, skipped", key, MAX_KEY_LEN);
            continue;
        };
        if !keep(key.as_str()) {
            continue;
        }
        if out.get(&key).is_some() {
            warn!("Protocol: duplicate key '{}', first value kept", key);
            continue;
        }
        let value = parse_value(&key, value);
        if out.fields.push(Field { key, value }).is_err() {
            warn!("Protocol: more than {} fields, remainder ignored", MAX_FIELDS);
            break;
        }
    }

    out
}

fn parse_value(key: &str, text: &str) -> f32 {
    match text.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            warn!("Protocol: value '{}' for '{}' is not a number, using 0", text, key);
            0.0
        }
    }
}

/// The recognised subset of a settings payload.
///
/// Keys absent from the payload are `None` and keep their current value
/// when the update is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsUpdate {
    pub setpoint: Option<f32>,
    pub p_gain: Option<f32>,
    pub i_gain: Option<f32>,
    pub d_gain: Option<f32>,
}

impl SettingsUpdate {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            setpoint: fields.get(KEY_SETPOINT),
            p_gain: fields.get(KEY_P),
            i_gain: fields.get(KEY_I),
            d_gain: fields.get(KEY_D),
        }
    }

    /// True when no recognised key was present.
    pub fn is_empty(&self) -> bool {
        self.setpoint.is_none()
            && self.p_gain.is_none()
            && self.i_gain.is_none()
            && self.d_gain.is_none()
    }

    /// Build the complete settings that replace `base`.
    pub fn apply(&self, base: ControlSettings) -> ControlSettings {
        ControlSettings {
            setpoint: self.setpoint.unwrap_or(base.setpoint),
            p_gain: self.p_gain.unwrap_or(base.p_gain),
            i_gain: self.i_gain.unwrap_or(base.i_gain),
            d_gain: self.d_gain.unwrap_or(base.d_gain),
        }
    }
}

/// Decode a settings payload.
///
/// Fails only when the payload holds no `key:value` field at all; unknown
/// keys and malformed numbers never fail the decode.
pub fn decode_settings(payload: &str) -> Result<SettingsUpdate, DecodeError> {
    let mut any_field = false;
    let fields = decode_fields_where(payload, |key| {
        any_field = true;
        [KEY_SETPOINT, KEY_P, KEY_I, KEY_D].contains(&key)
    });
    if !any_field {
        return Err(DecodeError::Empty);
    }
    Ok(SettingsUpdate::from_fields(&fields))
}

/// Render settings in the wire format accepted by [`decode_settings`].
pub fn encode_settings(settings: &ControlSettings) -> std::string::String {
    format!(
        "{}:{},{}:{},{}:{},{}:{}",
        KEY_SETPOINT,
        settings.setpoint,
        KEY_P,
        settings.p_gain,
        KEY_I,
        settings.i_gain,
        KEY_D,
        settings.d_gain
    )
}
