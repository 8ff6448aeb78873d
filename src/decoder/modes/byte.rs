//! Byte mode decoder (Mode 0100)

use crate::decoder::payload::BitReader;

/// `count` raw bytes, 8 bits each
pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Option<Vec<u8>> {
    (0..count).map(|_| reader.read_bits(8).map(|b| b as u8)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes() {
        let bytes = [0xDE, 0xAD, 0xBE];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode(&mut reader, 2), Some(vec![0xDE, 0xAD]));
        assert_eq!(decode(&mut reader, 2), None);
    }
}
