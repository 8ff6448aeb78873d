//! Numeric mode decoder (Mode 0001)
//! Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits

use crate::decoder::payload::BitReader;

/// `count` ASCII digits
pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    let mut remaining = count;

    while remaining > 0 {
        let (digits, width, limit) = match remaining {
            1 => (1, 4, 10),
            2 => (2, 7, 100),
            _ => (3, 10, 1000),
        };
        let value = reader.read_bits(width)?;
        if value >= limit {
            return None;
        }
        let text = format!("{:0width$}", value, width = digits);
        out.extend_from_slice(text.as_bytes());
        remaining -= digits;
    }

    Some(out)
}
