//! Alphanumeric mode decoder (Mode 0010)
//! Alphanumeric character set: 0-9, A-Z, space, $%*+-./:

use crate::decoder::payload::BitReader;

const ALPHANUMERIC_TABLE: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Pairs = 11 bits, single = 6 bits
pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    let mut remaining = count;

    while remaining >= 2 {
        let value = reader.read_bits(11)? as usize;
        if value >= 45 * 45 {
            return None;
        }
        out.push(ALPHANUMERIC_TABLE[value / 45]);
        out.push(ALPHANUMERIC_TABLE[value % 45]);
        remaining -= 2;
    }
    if remaining == 1 {
        let value = reader.read_bits(6)? as usize;
        out.push(*ALPHANUMERIC_TABLE.get(value)?);
    }

    Some(out)
}
