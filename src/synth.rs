//! Symbol synthesis: byte-mode payload to module matrix to pixels.
//!
//! The writer shares its placement order, format/version layouts and block
//! tables with the decoder, so a rendered symbol exercises the same paths a
//! photographed one would. Used by the integration tests, the benches and
//! the `qrscan render` command.

use crate::decoder::bitstream::place_codewords;
use crate::decoder::error_correction::interleave;
use crate::decoder::format::{self, FormatInfo};
use crate::decoder::function_mask::{FunctionMask, alignment_centers};
use crate::decoder::payload::Mode;
use crate::decoder::tables::data_codewords;
use crate::decoder::version;
use crate::error::{EncodeError, LoadError};
use crate::models::{BitMatrix, ECLevel, ImageBuffer, MaskPattern, ModuleMatrix, Version};

const PAD_BYTES: [u8; 2] = [0xEC, 0x11];

/// Largest byte-mode payload that fits `version` at `ec_level`
pub fn byte_capacity(version: Version, ec_level: ECLevel) -> usize {
    let header = 4 + Mode::Byte.char_count_bits(version).unwrap_or(8);
    ((data_codewords(version, ec_level) * 8 - header) / 8).min(255)
}

/// Smallest version holding `len` bytes at `ec_level`
pub fn smallest_version(len: usize, ec_level: ECLevel) -> Option<Version> {
    (1..=crate::models::MAX_VERSION)
        .filter_map(Version::new)
        .find(|&v| byte_capacity(v, ec_level) >= len)
}

/// Encode `payload` as a single byte-mode segment
pub fn encode_symbol(
    payload: &[u8],
    version: Version,
    ec_level: ECLevel,
    mask: MaskPattern,
) -> Result<ModuleMatrix, EncodeError> {
    let capacity = byte_capacity(version, ec_level);
    if payload.len() > capacity {
        return Err(EncodeError::PayloadTooLarge {
            len: payload.len(),
            capacity,
        });
    }

    let data = data_stream(payload, version, ec_level);
    let codewords = interleave(&data, version, ec_level);

    let mut matrix = ModuleMatrix::blank(version);
    let modules = matrix.modules_mut();
    draw_function_patterns(modules, version);
    draw_format(
        modules,
        FormatInfo {
            ec_level,
            mask_pattern: mask,
        },
    );
    place_codewords(modules, &FunctionMask::new(version), mask, &codewords);
    Ok(matrix)
}

fn push_bits(bits: &mut Vec<bool>, value: u32, width: usize) {
    for i in (0..width).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Data codewords: header, bytes, terminator, pad
fn data_stream(payload: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let capacity_bits = data_codewords(version, ec_level) * 8;
    let count_bits = Mode::Byte.char_count_bits(version).unwrap_or(8);
    let mut bits: Vec<bool> = Vec::with_capacity(capacity_bits);

    push_bits(&mut bits, Mode::Byte.indicator(), 4);
    push_bits(&mut bits, payload.len() as u32, count_bits);
    for &byte in payload {
        push_bits(&mut bits, u32::from(byte), 8);
    }
    let terminator = (capacity_bits - bits.len()).min(4);
    push_bits(&mut bits, 0, terminator);

    let mut data: Vec<u8> = bits
        .chunks(8)
        .map(|c| {
            c.iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << (7 - i)))
        })
        .collect();
    let target = capacity_bits / 8;
    let mut pad = PAD_BYTES.iter().cycle();
    while data.len() < target {
        data.extend(pad.next());
    }
    data
}

fn draw_function_patterns(modules: &mut BitMatrix, version: Version) {
    let size = version.size();

    for i in 0..size {
        modules.set(6, i, i % 2 == 0);
        modules.set(i, 6, i % 2 == 0);
    }

    for (cx, cy) in [(3, 3), (size - 4, 3), (3, size - 4)] {
        for dy in -4isize..=4 {
            for dx in -4isize..=4 {
                let (x, y) = (cx as isize + dx, cy as isize + dy);
                if x < 0 || y < 0 || x >= size as isize || y >= size as isize {
                    continue;
                }
                let ring = dx.abs().max(dy.abs());
                modules.set(x as usize, y as usize, ring != 2 && ring != 4);
            }
        }
    }

    for (cx, cy) in alignment_centers(version) {
        for dy in -2isize..=2 {
            for dx in -2isize..=2 {
                let ring = dx.abs().max(dy.abs());
                let (x, y) = ((cx as isize + dx) as usize, (cy as isize + dy) as usize);
                modules.set(x, y, ring != 1);
            }
        }
    }

    if version.has_version_info() {
        let bits = version::encode_bits(version.number());
        for (i, (x, y)) in version::positions(size).into_iter().enumerate() {
            let dark = (bits >> i) & 1 == 1;
            modules.set(x, y, dark);
            modules.set(y, x, dark);
        }
    }
}

fn draw_format(modules: &mut BitMatrix, info: FormatInfo) {
    let size = modules.width();
    let bits = info.encode();
    for copy in format::positions(size) {
        for (i, (x, y)) in copy.into_iter().enumerate() {
            modules.set(x, y, (bits >> i) & 1 == 1);
        }
    }
    modules.set(8, size - 8, true);
}

/// Rasterization parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per module side
    pub module_px: usize,
    /// Light border width in modules
    pub quiet_zone: usize,
    /// Clockwise quarter turns applied to the whole image
    pub quarter_turns: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_px: 4,
            quiet_zone: 4,
            quarter_turns: 0,
        }
    }
}

/// Render a module matrix to a luminance image (dark = 0, light = 255)
pub fn rasterize(matrix: &ModuleMatrix, options: &RenderOptions) -> Result<ImageBuffer, LoadError> {
    let px = options.module_px.max(1);
    let n = matrix.dimension();
    let side = (n + 2 * options.quiet_zone) * px;
    let turns = options.quarter_turns % 4;

    let mut samples = Vec::with_capacity(side * side);
    for ry in 0..side {
        for rx in 0..side {
            // undo the rotation to find the upright pixel
            let (mut x, mut y) = (rx, ry);
            for _ in 0..turns {
                (x, y) = (y, side - 1 - x);
            }
            let (mx, my) = (x / px, y / px);
            let dark = mx >= options.quiet_zone
                && my >= options.quiet_zone
                && mx - options.quiet_zone < n
                && my - options.quiet_zone < n
                && matrix.get(mx - options.quiet_zone, my - options.quiet_zone);
            samples.push(if dark { 0 } else { 255 });
        }
    }

    ImageBuffer::from_luma(side, side, samples)
}

/// Copy `image` onto a light canvas with its top-left corner at (left, top).
/// Parts falling outside the canvas are clipped.
pub fn place_on_canvas(
    image: &ImageBuffer,
    width: usize,
    height: usize,
    left: usize,
    top: usize,
) -> Result<ImageBuffer, LoadError> {
    let mut samples = vec![255u8; width * height];
    for y in 0..image.height() {
        for x in 0..image.width() {
            let (cx, cy) = (left + x, top + y);
            if cx < width && cy < height {
                samples[cy * width + cx] = image.get(x, y);
            }
        }
    }
    ImageBuffer::from_luma(width, height, samples)
}

/// Light canvas with standalone 7x7-module finder patterns centered on
/// each of `centers`
pub fn finder_canvas(
    width: usize,
    height: usize,
    centers: &[(usize, usize)],
    module_px: usize,
) -> Result<ImageBuffer, LoadError> {
    let mut samples = vec![255u8; width * height];
    let half = (7 * module_px / 2) as isize;
    for &(cx, cy) in centers {
        for dy in 0..7 * module_px {
            for dx in 0..7 * module_px {
                let (x, y) = (cx as isize - half + dx as isize, cy as isize - half + dy as isize);
                if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                    continue;
                }
                let (mx, my) = (dx / module_px, dy / module_px);
                let ring = mx.min(my).min(6 - mx).min(6 - my);
                if ring != 1 {
                    samples[y as usize * width + x as usize] = 0;
                }
            }
        }
    }
    ImageBuffer::from_luma(width, height, samples)
}
