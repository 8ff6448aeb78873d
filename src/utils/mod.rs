//! Image and geometry helpers for the scan pipeline
//!
//! - Pixel adapter (RGB/RGBA/encoded bytes to luminance)
//! - Binarization (Otsu or explicit threshold)
//! - Geometry (perspective transforms, convexity)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
