/// Format information (EC level + mask) encoding and recovery
use crate::error::FailureReason;
use crate::models::{ECLevel, MaskPattern, ModuleMatrix};
use tracing::trace;

/// BCH(15,5) generator x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
const GENERATOR: u16 = 0x537;
/// XOR applied so an all-light format area is never valid
const FORMAT_MASK: u16 = 0x5412;
/// Correction radius of BCH(15,5)
const MAX_DISTANCE: u32 = 3;

/// Decoded format information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error-correction level of the symbol
    pub ec_level: ECLevel,
    /// Data mask applied to the symbol
    pub mask_pattern: MaskPattern,
}

impl FormatInfo {
    /// The 15 masked bits written into the symbol
    pub fn encode(&self) -> u16 {
        encode_bits((self.ec_level.format_bits() << 3) | self.mask_pattern as u8)
    }

    /// Recover format information from both copies in the matrix.
    ///
    /// Picks the valid codeword nearest to either copy; more than three
    /// differing bits is `FormatInfoCorrupt`.
    pub fn read(matrix: &ModuleMatrix) -> Result<Self, FailureReason> {
        let [first, second] = positions(matrix.dimension()).map(|copy| {
            copy.iter()
                .enumerate()
                .fold(0u16, |acc, (i, &(x, y))| acc | (u16::from(matrix.get(x, y)) << i))
        });

        let (data, distance) = (0u8..32)
            .map(|data| {
                let code = encode_bits(data);
                let d = (code ^ first).count_ones().min((code ^ second).count_ones());
                (data, d)
            })
            .min_by_key(|&(_, d)| d)
            .ok_or(FailureReason::FormatInfoCorrupt)?;

        trace!(first, second, data, distance, "format information");
        if distance > MAX_DISTANCE {
            return Err(FailureReason::FormatInfoCorrupt);
        }

        Ok(Self {
            ec_level: ECLevel::from_format_bits(data >> 3),
            mask_pattern: MaskPattern::from_bits(data),
        })
    }
}

/// 5 data bits -> 15 masked bits
fn encode_bits(data: u8) -> u16 {
    let data = u16::from(data & 0x1F);
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * GENERATOR);
    }
    ((data << 10) | (rem & 0x3FF)) ^ FORMAT_MASK
}

/// Module `(x, y)` holding each format bit (index 0 = least significant),
/// for the copy around the top-left finder and the split copy
pub(crate) fn positions(size: usize) -> [[(usize, usize); 15]; 2] {
    let mut around = [(0, 0); 15];
    let mut split = [(0, 0); 15];
    for i in 0..15 {
        around[i] = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        split[i] = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
    }
    [around, split]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BitMatrix, Version};

    fn matrix_with(bits: u16, second: u16) -> ModuleMatrix {
        let version = Version::new(1).unwrap();
        let mut modules = BitMatrix::new(21, 21);
        let [a, b] = positions(21);
        for i in 0..15 {
            modules.set(a[i].0, a[i].1, (bits >> i) & 1 == 1);
            modules.set(b[i].0, b[i].1, (second >> i) & 1 == 1);
        }
        ModuleMatrix::new(version, modules).unwrap()
    }

    #[test]
    fn test_known_codewords() {
        // ISO 18004 Annex C: M / mask 5
        let info = FormatInfo {
            ec_level: ECLevel::M,
            mask_pattern: MaskPattern::Pattern5,
        };
        assert_eq!(info.encode(), 0x40CE);
        let info = FormatInfo {
            ec_level: ECLevel::L,
            mask_pattern: MaskPattern::Pattern0,
        };
        assert_eq!(info.encode(), 0x77C4);
    }

    #[test]
    fn test_read_clean() {
        let info = FormatInfo {
            ec_level: ECLevel::Q,
            mask_pattern: MaskPattern::Pattern3,
        };
        let bits = info.encode();
        assert_eq!(FormatInfo::read(&matrix_with(bits, bits)), Ok(info));
    }

    #[test]
    fn test_read_corrects_three_bits() {
        let info = FormatInfo {
            ec_level: ECLevel::H,
            mask_pattern: MaskPattern::Pattern6,
        };
        let bits = info.encode();
        let damaged = bits ^ 0b100_0000_0100_0001;
        assert_eq!(FormatInfo::read(&matrix_with(damaged, damaged)), Ok(info));
    }

    #[test]
    fn test_read_falls_back_to_clean_copy() {
        let info = FormatInfo {
            ec_level: ECLevel::L,
            mask_pattern: MaskPattern::Pattern4,
        };
        assert_eq!(FormatInfo::read(&matrix_with(0, info.encode())), Ok(info));
    }

    #[test]
    fn test_corrupted_format_is_rejected() {
        // Find damage that leaves both copies more than 3 bits from any codeword
        let bits = FormatInfo {
            ec_level: ECLevel::M,
            mask_pattern: MaskPattern::Pattern2,
        }
        .encode();
        let far = (0u16..0x8000)
            .map(|flip| bits ^ flip)
            .find(|&word| (0u8..32).all(|d| (encode_bits(d) ^ word).count_ones() > 3))
            .unwrap();
        assert_eq!(
            FormatInfo::read(&matrix_with(far, far)),
            Err(FailureReason::FormatInfoCorrupt)
        );
    }

    #[test]
    fn test_positions_avoid_timing() {
        let [a, b] = positions(25);
        assert!(!a.contains(&(8, 6)) && !a.contains(&(6, 8)));
        assert!(!b.contains(&(8, 25 - 8)));
        assert_eq!(b[14], (8, 24));
    }
}
