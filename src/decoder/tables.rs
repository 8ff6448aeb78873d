use crate::models::{ECLevel, MAX_VERSION, Version};

/// Block structure for one version / level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcBlockInfo {
    /// Number of interleaved blocks
    pub num_blocks: usize,
    /// ECC codewords at the end of every block
    pub ecc_per_block: usize,
}

const VERSIONS: usize = MAX_VERSION as usize;

// Index: [ec_level][version - 1] (L, M, Q, H)
const ECC_CODEWORDS_PER_BLOCK: [[u8; VERSIONS]; 4] = [
    [7, 10, 15, 20, 26, 18, 20, 24],
    [10, 16, 26, 18, 24, 16, 18, 22],
    [13, 22, 18, 26, 18, 24, 18, 22],
    [17, 28, 22, 16, 22, 28, 26, 26],
];

const NUM_ERROR_CORRECTION_BLOCKS: [[u8; VERSIONS]; 4] = [
    [1, 1, 1, 1, 1, 2, 2, 2],
    [1, 1, 1, 2, 2, 4, 4, 4],
    [1, 1, 2, 2, 4, 4, 6, 6],
    [1, 1, 2, 4, 4, 4, 5, 6],
];

/// Total codewords (data + ECC) a symbol holds
const RAW_CODEWORDS: [u16; VERSIONS] = [26, 44, 70, 100, 134, 172, 196, 242];

/// Block count and ECC length for `version` at `ec_level`
pub fn ec_block_info(version: Version, ec_level: ECLevel) -> EcBlockInfo {
    let (l, v) = (ec_level.table_index(), version.number() as usize - 1);
    EcBlockInfo {
        num_blocks: NUM_ERROR_CORRECTION_BLOCKS[l][v] as usize,
        ecc_per_block: ECC_CODEWORDS_PER_BLOCK[l][v] as usize,
    }
}

/// Total codewords a symbol of `version` holds
pub fn raw_codewords(version: Version) -> usize {
    RAW_CODEWORDS[version.number() as usize - 1] as usize
}

/// Data codewords available after error correction overhead
pub fn data_codewords(version: Version, ec_level: ECLevel) -> usize {
    let info = ec_block_info(version, ec_level);
    raw_codewords(version) - info.num_blocks * info.ecc_per_block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_capacity() {
        let v1 = Version::new(1).unwrap();
        assert_eq!(data_codewords(v1, ECLevel::L), 19);
        assert_eq!(data_codewords(v1, ECLevel::H), 9);
        let v5 = Version::new(5).unwrap();
        assert_eq!(data_codewords(v5, ECLevel::Q), 62);
        let v8 = Version::new(8).unwrap();
        assert_eq!(data_codewords(v8, ECLevel::M), 154);
    }

    #[test]
    fn test_blocks_leave_room_for_data() {
        for n in 1..=MAX_VERSION {
            let v = Version::new(n).unwrap();
            for level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
                let info = ec_block_info(v, level);
                let short_len = raw_codewords(v) / info.num_blocks;
                assert!(short_len > info.ecc_per_block, "v{} {:?}", n, level);
            }
        }
    }
}
