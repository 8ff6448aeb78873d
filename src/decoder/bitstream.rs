/// Codeword stream extraction and placement along the zigzag order
use crate::decoder::function_mask::FunctionMask;
use crate::models::{BitMatrix, MaskPattern, ModuleMatrix};

/// Read data modules in placement order, removing `mask`, and pack them
/// MSB-first into codewords. Remainder bits that don't fill a byte are
/// dropped.
pub fn read_codewords(matrix: &ModuleMatrix, func: &FunctionMask, mask: MaskPattern) -> Vec<u8> {
    let order = func.placement_order();
    let mut codewords = Vec::with_capacity(order.len() / 8);
    for chunk in order.chunks_exact(8) {
        let byte = chunk.iter().fold(0u8, |acc, &(x, y)| {
            let bit = matrix.get(x, y) ^ mask.is_masked(y, x);
            (acc << 1) | u8::from(bit)
        });
        codewords.push(byte);
    }
    codewords
}

/// Inverse of [`read_codewords`]: write `codewords` (masked) into the data
/// modules of `modules`. Unused remainder modules are written as light
/// before masking.
pub fn place_codewords(
    modules: &mut BitMatrix,
    func: &FunctionMask,
    mask: MaskPattern,
    codewords: &[u8],
) {
    for (i, (x, y)) in func.placement_order().into_iter().enumerate() {
        let bit = codewords
            .get(i / 8)
            .is_some_and(|&byte| (byte >> (7 - i % 8)) & 1 == 1);
        modules.set(x, y, bit ^ mask.is_masked(y, x));
    }
}
