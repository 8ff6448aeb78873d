//! Threshold an image into a [`BinaryGrid`] (true = dark).
//!
//! Without an explicit threshold the cutoff comes from Otsu's method over
//! the luminance histogram, so it tracks global lighting instead of a
//! fixed mid-gray.

use crate::models::{BinaryGrid, ImageBuffer};

/// Binarize with `threshold`, or an Otsu threshold when `None`
pub fn binarize(image: &ImageBuffer, threshold: Option<u8>) -> BinaryGrid {
    let threshold = threshold.unwrap_or_else(|| otsu_threshold(image.samples()));
    threshold_binarize(image, threshold)
}

/// Pixels strictly darker than `threshold` become dark cells
pub fn threshold_binarize(image: &ImageBuffer, threshold: u8) -> BinaryGrid {
    BinaryGrid::from_fn(image.width(), image.height(), |x, y| {
        image.get(x, y) < threshold
    })
}

/// Otsu's variance-maximizing threshold.
///
/// Returns the smallest `t` maximizing between-class variance of the split
/// `{< t}` / `{>= t}`; a single-valued histogram yields 128.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut below_count = 0f64;
    let mut below_sum = 0f64;
    let mut best_variance = 0.0f64;
    let mut best = 128u8;

    for t in 1..=255usize {
        below_count += histogram[t - 1] as f64;
        below_sum += (t - 1) as f64 * histogram[t - 1] as f64;
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }
        let mean_below = below_sum / below_count;
        let mean_above = (total_sum - below_sum) / above_count;
        let variance =
            (below_count / total) * (above_count / total) * (mean_below - mean_above).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best = t as u8;
        }
    }

    best
}
