//! Reed-Solomon block handling over GF(256), primitive polynomial 0x11D.
//!
//! Correction itself sits behind [`ErrorCorrector`]. The bundled
//! [`SyndromeCheck`] verifies each block and rejects damaged ones; an
//! implementation that repairs errors can be swapped in without touching
//! the rest of the decoder.

use super::tables::{ec_block_info, raw_codewords};
use crate::error::FailureReason;
use crate::models::{ECLevel, Version};
use tracing::debug;

const fn build_tables() -> ([u8; 512], [u8; 256]) {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    (exp, log)
}

const TABLES: ([u8; 512], [u8; 256]) = build_tables();

/// GF(256) arithmetic
pub struct Gf256;

impl Gf256 {
    /// Product in GF(256)
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let (exp, log) = &TABLES;
        exp[log[a as usize] as usize + log[b as usize] as usize]
    }

    /// alpha^n
    pub fn exp(n: usize) -> u8 {
        TABLES.0[n % 255]
    }
}

/// One error-correction strategy applied per block.
///
/// `block` holds data codewords followed by `ecc_len` check codewords and
/// may be repaired in place.
pub trait ErrorCorrector: Send + Sync {
    fn correct_block(&self, block: &mut [u8], ecc_len: usize) -> Result<(), FailureReason>;
}

/// Accepts a block only when every syndrome is zero
#[derive(Debug, Clone, Copy, Default)]
pub struct SyndromeCheck;

impl ErrorCorrector for SyndromeCheck {
    fn correct_block(&self, block: &mut [u8], ecc_len: usize) -> Result<(), FailureReason> {
        if syndromes(block, ecc_len).iter().all(|&s| s == 0) {
            Ok(())
        } else {
            Err(FailureReason::UncorrectableErrors)
        }
    }
}

/// S_i = sum c_j * alpha^(i * (n - 1 - j)), with c_0 the highest power
pub fn syndromes(block: &[u8], ecc_len: usize) -> Vec<u8> {
    let n = block.len();
    (0..ecc_len)
        .map(|i| {
            block.iter().enumerate().fold(0u8, |acc, (j, &c)| {
                acc ^ Gf256::mul(c, Gf256::exp(i * (n - 1 - j)))
            })
        })
        .collect()
}

/// Split the interleaved codeword stream into blocks, run `corrector` on
/// each, and return the concatenated data codewords.
pub fn correct(
    codewords: &[u8],
    version: Version,
    ec_level: ECLevel,
    corrector: &dyn ErrorCorrector,
) -> Result<Vec<u8>, FailureReason> {
    let info = ec_block_info(version, ec_level);
    let total = raw_codewords(version);
    if codewords.len() != total {
        return Err(FailureReason::UncorrectableErrors);
    }
    let data_total = total - info.num_blocks * info.ecc_per_block;

    let num_long_blocks = data_total % info.num_blocks;
    let num_short_blocks = info.num_blocks - num_long_blocks;
    let short_len = data_total / info.num_blocks;
    let block_data_len = |b: usize| {
        if b < num_short_blocks {
            short_len
        } else {
            short_len + 1
        }
    };

    let mut blocks: Vec<Vec<u8>> = (0..info.num_blocks)
        .map(|b| Vec::with_capacity(block_data_len(b) + info.ecc_per_block))
        .collect();
    let mut stream = codewords.iter().copied();

    for i in 0..=short_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if i < block_data_len(b) {
                block.extend(stream.next());
            }
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            block.extend(stream.next());
        }
    }

    let mut data = Vec::with_capacity(data_total);
    for (b, block) in blocks.iter_mut().enumerate() {
        if let Err(reason) = corrector.correct_block(block, info.ecc_per_block) {
            debug!(block = b, blocks = info.num_blocks, "codeword block rejected");
            return Err(reason);
        }
        data.extend_from_slice(&block[..block_data_len(b)]);
    }
    Ok(data)
}

/// Check codewords for `data` (generator roots alpha^0 .. alpha^(ecc_len-1))
pub(crate) fn encode_block(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let mut divisor = vec![0u8; ecc_len];
    if let Some(last) = divisor.last_mut() {
        *last = 1;
    }
    let mut root = 1u8;
    for _ in 0..ecc_len {
        for j in 0..ecc_len {
            divisor[j] = Gf256::mul(divisor[j], root);
            if j + 1 < ecc_len {
                divisor[j] ^= divisor[j + 1];
            }
        }
        root = Gf256::mul(root, 0x02);
    }

    let mut remainder = vec![0u8; ecc_len];
    for &byte in data {
        let factor = byte ^ remainder.first().copied().unwrap_or(0);
        remainder.rotate_left(1);
        if let Some(last) = remainder.last_mut() {
            *last = 0;
        }
        for (r, &d) in remainder.iter_mut().zip(divisor.iter()) {
            *r ^= Gf256::mul(d, factor);
        }
    }
    remainder
}

/// Split `data` into blocks, append check codewords and interleave
pub(crate) fn interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let data_total = data.len();
    let num_short_blocks = info.num_blocks - data_total % info.num_blocks;
    let short_len = data_total / info.num_blocks;

    let mut blocks = Vec::with_capacity(info.num_blocks);
    let mut start = 0;
    for b in 0..info.num_blocks {
        let len = short_len + usize::from(b >= num_short_blocks);
        let chunk = &data[start..start + len];
        blocks.push((chunk.to_vec(), encode_block(chunk, info.ecc_per_block)));
        start += len;
    }

    let mut out = Vec::with_capacity(raw_codewords(version));
    for i in 0..=short_len {
        for (chunk, _) in &blocks {
            if let Some(&byte) = chunk.get(i) {
                out.push(byte);
            }
        }
    }
    for i in 0..info.ecc_per_block {
        for (_, ecc) in &blocks {
            out.push(ecc[i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tables::data_codewords;

    #[test]
    fn test_gf256_basic() {
        assert_eq!(Gf256::mul(0, 7), 0);
        assert_eq!(Gf256::mul(1, 7), 7);
        assert_eq!(Gf256::mul(2, 0x80), 0x1D);
        assert_eq!(Gf256::exp(0), 1);
        assert_eq!(Gf256::exp(8), 0x1D);
        assert_eq!(Gf256::exp(255), 1);
    }

    #[test]
    fn test_known_hello_world_ecc() {
        // "HELLO WORLD" 1-M data codewords and their published ECC
        let data = [
            0x20, 0x5B, 0x0B, 0x78, 0xD1, 0x72, 0xDC, 0x4D, 0x43, 0x40, 0xEC, 0x11, 0xEC, 0x11,
            0xEC, 0x11,
        ];
        let ecc = encode_block(&data, 10);
        assert_eq!(
            ecc,
            vec![0xC4, 0x23, 0x27, 0x77, 0xEB, 0xD7, 0xE7, 0xE2, 0x5D, 0x17]
        );
    }

    #[test]
    fn test_encoded_block_has_zero_syndromes() {
        let data: Vec<u8> = (0..19).map(|i| (i * 13 + 5) as u8).collect();
        let mut block = data.clone();
        block.extend(encode_block(&data, 7));
        assert!(syndromes(&block, 7).iter().all(|&s| s == 0));
        assert_eq!(SyndromeCheck.correct_block(&mut block, 7), Ok(()));

        block[3] ^= 0x40;
        assert_eq!(
            SyndromeCheck.correct_block(&mut block, 7),
            Err(FailureReason::UncorrectableErrors)
        );
    }

    #[test]
    fn test_correct_recovers_multi_block_data() {
        let version = Version::new(5).unwrap();
        let level = ECLevel::H;
        let data: Vec<u8> = (0..data_codewords(version, level))
            .map(|i| (i * 7) as u8)
            .collect();
        let stream = interleave(&data, version, level);
        assert_eq!(stream.len(), raw_codewords(version));
        assert_eq!(correct(&stream, version, level, &SyndromeCheck), Ok(data));
    }

    #[test]
    fn test_correct_rejects_damage() {
        let version = Version::new(2).unwrap();
        let level = ECLevel::L;
        let data = vec![0xA5; data_codewords(version, level)];
        let mut stream = interleave(&data, version, level);
        stream[0] ^= 1;
        assert_eq!(
            correct(&stream, version, level, &SyndromeCheck),
            Err(FailureReason::UncorrectableErrors)
        );
        assert_eq!(
            correct(&stream[1..], version, level, &SyndromeCheck),
            Err(FailureReason::UncorrectableErrors)
        );
    }

    struct AcceptAll;

    impl ErrorCorrector for AcceptAll {
        fn correct_block(&self, _block: &mut [u8], _ecc_len: usize) -> Result<(), FailureReason> {
            Ok(())
        }
    }

    #[test]
    fn test_corrector_is_pluggable() {
        let version = Version::new(1).unwrap();
        let garbage = vec![0x11; raw_codewords(version)];
        let data = correct(&garbage, version, ECLevel::M, &AcceptAll).unwrap();
        assert_eq!(data.len(), 16);
    }
}
