//! Segment decoding of the corrected data codewords.
//!
//! The stream is a sequence of `mode indicator | character count | data`
//! segments ended by the 0000 terminator or by running out of bits.
//! Numeric, alphanumeric and byte segments are decoded; an ECI designator
//! is consumed without changing the output. Any other mode, or a segment
//! cut short, is `UnsupportedEncoding`.

use super::modes::{alphanumeric, byte, numeric};
use crate::error::FailureReason;
use crate::models::Version;
use tracing::trace;

/// Segment mode indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 0000, end of data
    Terminator,
    /// Decimal digits
    Numeric,
    /// Digits, upper-case letters and nine symbols
    Alphanumeric,
    /// Part of a multi-symbol sequence
    StructuredAppend,
    /// 8-bit bytes
    Byte,
    /// GS1 marker
    Fnc1First,
    /// Extended channel interpretation designator
    Eci,
    /// Shift JIS double-byte characters
    Kanji,
    /// AIM application marker
    Fnc1Second,
    /// GB 2312 characters
    Hanzi,
}

impl Mode {
    /// Mode for a 4-bit indicator, `None` for unassigned values
    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            0b0000 => Mode::Terminator,
            0b0001 => Mode::Numeric,
            0b0010 => Mode::Alphanumeric,
            0b0011 => Mode::StructuredAppend,
            0b0100 => Mode::Byte,
            0b0101 => Mode::Fnc1First,
            0b0111 => Mode::Eci,
            0b1000 => Mode::Kanji,
            0b1001 => Mode::Fnc1Second,
            0b1101 => Mode::Hanzi,
            _ => return None,
        })
    }

    /// 4-bit indicator of this mode
    pub fn indicator(&self) -> u32 {
        match self {
            Mode::Terminator => 0b0000,
            Mode::Numeric => 0b0001,
            Mode::Alphanumeric => 0b0010,
            Mode::StructuredAppend => 0b0011,
            Mode::Byte => 0b0100,
            Mode::Fnc1First => 0b0101,
            Mode::Eci => 0b0111,
            Mode::Kanji => 0b1000,
            Mode::Fnc1Second => 0b1001,
            Mode::Hanzi => 0b1101,
        }
    }

    /// Width of the character count field
    pub fn char_count_bits(&self, version: Version) -> Option<usize> {
        let small = version.number() <= 9;
        match self {
            Mode::Numeric => Some(if small { 10 } else { 12 }),
            Mode::Alphanumeric => Some(if small { 9 } else { 11 }),
            Mode::Byte => Some(if small { 8 } else { 16 }),
            _ => None,
        }
    }
}

/// MSB-first reader over codeword bytes
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the first bit of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Unread bits
    pub fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    /// Next `n` (<= 32) bits, or `None` if the stream is shorter
    pub fn read_bits(&mut self, n: usize) -> Option<u32> {
        if n > 32 || n > self.remaining() {
            return None;
        }
        let mut val = 0u32;
        for _ in 0..n {
            let bit = (self.bytes[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            val = (val << 1) | u32::from(bit);
            self.pos += 1;
        }
        Some(val)
    }
}

/// Decode every segment and concatenate the payload bytes
pub fn decode_segments(data: &[u8], version: Version) -> Result<Vec<u8>, FailureReason> {
    let mut reader = BitReader::new(data);
    let mut payload = Vec::new();

    while reader.remaining() >= 4 {
        let bits = reader.read_bits(4).ok_or(FailureReason::UnsupportedEncoding)?;
        let mode = Mode::from_bits(bits).ok_or(FailureReason::UnsupportedEncoding)?;
        trace!(?mode, offset = data.len() * 8 - reader.remaining() - 4, "segment");

        let decoded = match mode {
            Mode::Terminator => break,
            Mode::Eci => {
                read_eci(&mut reader).ok_or(FailureReason::UnsupportedEncoding)?;
                continue;
            }
            Mode::Numeric | Mode::Alphanumeric | Mode::Byte => {
                let width = mode
                    .char_count_bits(version)
                    .ok_or(FailureReason::UnsupportedEncoding)?;
                let count = reader
                    .read_bits(width)
                    .ok_or(FailureReason::UnsupportedEncoding)? as usize;
                match mode {
                    Mode::Numeric => numeric::decode(&mut reader, count),
                    Mode::Alphanumeric => alphanumeric::decode(&mut reader, count),
                    _ => byte::decode(&mut reader, count),
                }
            }
            _ => None,
        };
        payload.extend(decoded.ok_or(FailureReason::UnsupportedEncoding)?);
    }

    Ok(payload)
}

/// ECI designator: 1, 2 or 3 bytes depending on the leading bits
fn read_eci(reader: &mut BitReader<'_>) -> Option<u32> {
    let first = reader.read_bits(8)?;
    if first & 0x80 == 0 {
        Some(first)
    } else if first & 0xC0 == 0x80 {
        Some(((first & 0x3F) << 8) | reader.read_bits(8)?)
    } else if first & 0xE0 == 0xC0 {
        Some(((first & 0x1F) << 16) | reader.read_bits(16)?)
    } else {
        None
    }
}
