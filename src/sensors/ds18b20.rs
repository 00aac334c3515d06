//! DS18B20 temperature probe driver.
//!
//! All operations go through a [`OneWire`] bus.  `rom = None` addresses
//! every probe at once with SKIP ROM: used for the broadcast conversion and,
//! when exactly one probe is present, for every read.

use serde::{Deserialize, Serialize};

use crate::error::BusError;
use crate::sensors::onewire::{OneWire, RomCode, crc8};

pub const FAMILY_CODE: u8 = 0x28;

pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;
pub const WRITE_SCRATCHPAD: u8 = 0x4E;

/// Conversion resolution.  Coarser resolutions convert faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    pub fn from_config_register(reg: u8) -> Option<Self> {
        match reg {
            0x1F => Some(Self::Bits9),
            0x3F => Some(Self::Bits10),
            0x5F => Some(Self::Bits11),
            0x7F => Some(Self::Bits12),
            _ => None,
        }
    }

    pub const fn to_config_register(self) -> u8 {
        match self {
            Self::Bits9 => 0x1F,
            Self::Bits10 => 0x3F,
            Self::Bits11 => 0x5F,
            Self::Bits12 => 0x7F,
        }
    }

    /// Worst-case conversion time, rounded up to whole milliseconds
    /// (93.75 / 187.5 / 375 / 750 ms).
    pub const fn conversion_time_ms(self) -> u64 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }

    /// Low bits of the raw reading that are undefined at this resolution.
    const fn undefined_bits(self) -> u8 {
        match self {
            Self::Bits9 => 0b0000_0111,
            Self::Bits10 => 0b0000_0011,
            Self::Bits11 => 0b0000_0001,
            Self::Bits12 => 0,
        }
    }
}

/// Read and CRC-check the 9-byte scratchpad.
pub fn read_scratchpad<W: OneWire + ?Sized>(
    wire: &mut W,
    rom: Option<RomCode>,
) -> Result<[u8; 9], BusError> {
    wire.send_command(rom, READ_SCRATCHPAD)?;
    let mut pad = [0u8; 9];
    wire.read_bytes(&mut pad)?;
    if crc8(&pad) != 0 {
        return Err(BusError::CrcMismatch);
    }
    Ok(pad)
}

/// Decode a scratchpad into °C, masking the bits the configured resolution
/// leaves undefined.
pub fn decode_temperature(pad: &[u8; 9]) -> Result<f32, BusError> {
    let resolution =
        Resolution::from_config_register(pad[4]).ok_or(BusError::UnexpectedResponse)?;
    let lsb = pad[0] & !resolution.undefined_bits();
    let raw = i16::from_le_bytes([lsb, pad[1]]);
    Ok(f32::from(raw) / 16.0)
}

/// Start a conversion on every probe at once.
pub fn convert_all<W: OneWire + ?Sized>(wire: &mut W) -> Result<(), BusError> {
    wire.send_command(None, CONVERT_T)
}

/// Read the last converted temperature of one probe (or the only probe).
pub fn read_temperature<W: OneWire + ?Sized>(
    wire: &mut W,
    rom: Option<RomCode>,
) -> Result<f32, BusError> {
    let pad = read_scratchpad(wire, rom)?;
    decode_temperature(&pad)
}

/// Set the conversion resolution, preserving the alarm registers.
pub fn set_resolution<W: OneWire + ?Sized>(
    wire: &mut W,
    rom: Option<RomCode>,
    resolution: Resolution,
) -> Result<(), BusError> {
    let pad = read_scratchpad(wire, rom)?;
    wire.send_command(rom, WRITE_SCRATCHPAD)?;
    wire.write_bytes(&[pad[2], pad[3], resolution.to_config_register()])?;
    wire.reset()?;
    Ok(())
}
