//! One-wire bus: bit primitives, ROM addressing and device search.
//!
//! [`OneWire`] needs only the three timed primitives (reset, write slot,
//! read slot); byte transfer, ROM select/skip and SEARCH ROM are provided
//! on top.  [`BitBangWire`] implements the primitives over any
//! `embedded-hal` 1.0 open-drain pin and microsecond delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::BusError;

// ── ROM commands ──────────────────────────────────────────────

pub const SEARCH_ROM: u8 = 0xF0;
pub const MATCH_ROM: u8 = 0x55;
pub const SKIP_ROM: u8 = 0xCC;

// ── ROM code ──────────────────────────────────────────────────

/// 64-bit device address: family code, 48-bit serial, CRC-8.
/// Stored little-endian, family code in the low byte.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RomCode(pub u64);

impl RomCode {
    pub const fn family_code(self) -> u8 {
        self.0.to_le_bytes()[0]
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// True when the trailing byte is the CRC-8 of the first seven.
    pub fn crc_valid(self) -> bool {
        crc8(&self.to_bytes()) == 0
    }
}

impl core::fmt::Debug for RomCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl core::fmt::Display for RomCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Dallas/Maxim CRC-8 (x⁸ + x⁵ + x⁴ + 1, reflected).
///
/// Running it over data followed by its CRC yields zero.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

// ── Bus trait ─────────────────────────────────────────────────

pub trait OneWire {
    /// Issue a reset pulse.  Returns `true` when at least one device
    /// answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, BusError>;

    /// Write one bit in its own time slot.
    fn write_bit(&mut self, bit: bool) -> Result<(), BusError>;

    /// Read one bit in its own time slot.
    fn read_bit(&mut self) -> Result<bool, BusError>;

    /// Write a byte, LSB first.
    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Read a byte, LSB first.
    fn read_byte(&mut self) -> Result<u8, BusError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<(), BusError> {
        for byte in bytes {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Reset, address one device (or all when `rom` is `None`), then send
    /// a function command.
    fn send_command(&mut self, rom: Option<RomCode>, command: u8) -> Result<(), BusError> {
        if !self.reset()? {
            return Err(BusError::NoPresence);
        }
        match rom {
            Some(rom) => {
                self.write_byte(MATCH_ROM)?;
                self.write_bytes(&rom.to_bytes())?;
            }
            None => self.write_byte(SKIP_ROM)?,
        }
        self.write_byte(command)
    }
}

// ── Device search ─────────────────────────────────────────────

/// Incremental SEARCH ROM walk (Maxim application note 187).
///
/// Each call to [`DeviceSearch::next_device`] returns the next ROM code in
/// ascending bit order until the whole tree has been visited.
#[derive(Debug, Default)]
pub struct DeviceSearch {
    last_discrepancy: u8,
    last_device: bool,
    rom: [u8; 8],
}

impl DeviceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_device<W: OneWire + ?Sized>(
        &mut self,
        wire: &mut W,
    ) -> Result<Option<RomCode>, BusError> {
        if self.last_device {
            return Ok(None);
        }
        if !wire.reset()? {
            self.last_discrepancy = 0;
            return Ok(None);
        }

        wire.write_byte(SEARCH_ROM)?;

        let mut last_zero = 0u8;
        for id_bit_number in 1..=64u8 {
            let byte = usize::from((id_bit_number - 1) / 8);
            let mask = 1u8 << ((id_bit_number - 1) % 8);

            let id_bit = wire.read_bit()?;
            let cmp_id_bit = wire.read_bit()?;

            let direction = match (id_bit, cmp_id_bit) {
                // Nobody answered (device removed mid-search).
                (true, true) => {
                    self.last_discrepancy = 0;
                    return Err(BusError::UnexpectedResponse);
                }
                // All remaining devices agree on this bit.
                (a, b) if a != b => a,
                // Discrepancy: repeat the previous choice below the last
                // discrepancy, take 1 at it, 0 beyond it.
                _ => {
                    let dir = if id_bit_number < self.last_discrepancy {
                        self.rom[byte] & mask != 0
                    } else {
                        id_bit_number == self.last_discrepancy
                    };
                    if !dir {
                        last_zero = id_bit_number;
                    }
                    dir
                }
            };

            if direction {
                self.rom[byte] |= mask;
            } else {
                self.rom[byte] &= !mask;
            }
            wire.write_bit(direction)?;
        }

        self.last_discrepancy = last_zero;
        if last_zero == 0 {
            self.last_device = true;
        }

        let rom = RomCode(u64::from_le_bytes(self.rom));
        if !rom.crc_valid() {
            return Err(BusError::CrcMismatch);
        }
        Ok(Some(rom))
    }
}

// ── Bit-banged implementation ─────────────────────────────────

/// One-wire master on an open-drain GPIO.
///
/// `set_high` releases the line to the external pull-up; `set_low` drives
/// it.  The read slot samples inside a critical section so an interrupt
/// cannot stretch the 15 µs sampling window.
pub struct BitBangWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> BitBangWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Result<Self, BusError> {
        pin.set_high().map_err(|_| BusError::Pin)?;
        Ok(Self { pin, delay })
    }
}

impl<P, D> OneWire for BitBangWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<bool, BusError> {
        // Wait for the pull-up to release the bus
        let mut retries = 125;
        while self.pin.is_low().map_err(|_| BusError::Pin)? {
            if retries == 0 {
                return Err(BusError::BusNotHigh);
            }
            retries -= 1;
            self.delay.delay_us(2);
        }

        self.pin.set_low().map_err(|_| BusError::Pin)?;
        self.delay.delay_us(480);

        self.pin.set_high().map_err(|_| BusError::Pin)?;
        self.delay.delay_us(70);

        let presence = self.pin.is_low().map_err(|_| BusError::Pin)?;
        self.delay.delay_us(410);

        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        let (low_us, release_us) = if bit { (10, 55) } else { (65, 5) };

        self.pin.set_low().map_err(|_| BusError::Pin)?;
        self.delay.delay_us(low_us);
        self.pin.set_high().map_err(|_| BusError::Pin)?;
        self.delay.delay_us(release_us);

        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        let pin = &mut self.pin;
        let delay = &mut self.delay;
        let bit = critical_section::with(|_| {
            pin.set_low().map_err(|_| BusError::Pin)?;
            delay.delay_us(1);
            pin.set_high().map_err(|_| BusError::Pin)?;
            delay.delay_us(1);
            pin.is_high().map_err(|_| BusError::Pin)
        })?;

        // End of the time slot
        self.delay.delay_us(53);

        Ok(bit)
    }
}

// ── Simulated bus ─────────────────────────────────────────────
