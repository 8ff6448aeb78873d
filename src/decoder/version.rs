/// Version information (v7+) encoding and recovery
use crate::error::FailureReason;
use crate::models::{ModuleMatrix, Version};
use tracing::trace;

/// BCH(18,6) generator x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
const GENERATOR: u32 = 0x1F25;
const MAX_DISTANCE: u32 = 3;
/// Every version that carries a version block, including ones we don't
/// decode, so a misread is not silently snapped to a supported version
const VERSION_BLOCK_RANGE: std::ops::RangeInclusive<u32> = 7..=40;

/// 6-bit version number -> 18-bit codeword
pub fn encode_bits(number: u8) -> u32 {
    let data = u32::from(number & 0x3F);
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * GENERATOR);
    }
    (data << 12) | (rem & 0xFFF)
}

/// Module `(x, y)` for each version bit in the top-right block; the
/// bottom-left copy is the transpose
pub(crate) fn positions(size: usize) -> [(usize, usize); 18] {
    std::array::from_fn(|i| (size - 11 + i % 3, i / 3))
}

/// Confirm the version block agrees with the sampled dimension.
///
/// Matrices below version 7 have no block and pass trivially.
pub fn verify(matrix: &ModuleMatrix) -> Result<(), FailureReason> {
    let expected = matrix.version();
    if !expected.has_version_info() {
        return Ok(());
    }

    let mut top_right = 0u32;
    let mut bottom_left = 0u32;
    for (i, (x, y)) in positions(matrix.dimension()).into_iter().enumerate() {
        top_right |= u32::from(matrix.get(x, y)) << i;
        bottom_left |= u32::from(matrix.get(y, x)) << i;
    }

    let (number, distance) = VERSION_BLOCK_RANGE
        .map(|n| {
            let code = encode_bits(n as u8);
            let d = (code ^ top_right)
                .count_ones()
                .min((code ^ bottom_left).count_ones());
            (n as u8, d)
        })
        .min_by_key(|&(_, d)| d)
        .ok_or(FailureReason::FormatInfoCorrupt)?;

    trace!(number, distance, "version information");
    if distance > MAX_DISTANCE || Version::new(number) != Some(expected) {
        return Err(FailureReason::FormatInfoCorrupt);
    }
    Ok(())
}
