//! Pixel buffer adapter: caller pixels in, [`ImageBuffer`] out.
//!
//! Luminance uses fixed integer BT.601 weights,
//! `Y = (76*R + 150*G + 29*B) >> 8`, so conversion is deterministic across
//! platforms. Alpha is ignored. Rows are converted in parallel.

use crate::error::LoadError;
use crate::models::ImageBuffer;
use crate::models::image_buffer::check_dimensions;
use rayon::prelude::*;
use tracing::debug;

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Luminance of one pixel
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

fn to_luma(pixels: &[u8], width: usize, channels: usize) -> Vec<u8> {
    let mut gray = vec![0u8; pixels.len() / channels];
    gray.par_chunks_mut(width)
        .zip(pixels.par_chunks(width * channels))
        .for_each(|(out, src)| {
            for (dst, px) in out.iter_mut().zip(src.chunks_exact(channels)) {
                *dst = luminance(px[0], px[1], px[2]);
            }
        });
    gray
}

/// Build an [`ImageBuffer`] from packed RGB bytes
pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<ImageBuffer, LoadError> {
    check_dimensions(width, height, 3, rgb.len())?;
    ImageBuffer::from_luma(width, height, to_luma(rgb, width, 3))
}

/// Build an [`ImageBuffer`] from packed RGBA bytes
pub fn from_rgba(rgba: &[u8], width: usize, height: usize) -> Result<ImageBuffer, LoadError> {
    check_dimensions(width, height, 4, rgba.len())?;
    ImageBuffer::from_luma(width, height, to_luma(rgba, width, 4))
}

/// Decode an encoded image file (PNG, JPEG, ...) into luminance
pub fn load(bytes: &[u8]) -> Result<ImageBuffer, LoadError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    debug!(width, height, encoded_len = bytes.len(), "decoded source image");
    from_rgba(rgba.as_raw(), width, height)
}

/// [`load`] with an upper bound on the encoded size
pub fn load_with_limit(bytes: &[u8], limit: usize) -> Result<ImageBuffer, LoadError> {
    if bytes.len() > limit {
        return Err(LoadError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }
    load(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert!(luminance(255, 255, 255) >= 254);
        let red = luminance(255, 0, 0);
        assert!(red > 0 && red < 255);
        assert!(luminance(0, 255, 0) > 100);
    }

    #[test]
    fn test_from_rgb_and_rgba_agree() {
        let rgb = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let rgba = vec![
            255, 0, 0, 9, 0, 255, 0, 9, 0, 0, 255, 9, 255, 255, 255, 9,
        ];
        let a = from_rgb(&rgb, 2, 2).unwrap();
        let b = from_rgba(&rgba, 2, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.samples().len(), 4);
    }

    #[test]
    fn test_rejects_bad_buffers() {
        assert!(from_rgb(&[0; 5], 1, 2).is_err());
        assert!(from_rgba(&[], 0, 0).is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = load(b"definitely not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn test_load_with_limit() {
        let err = load_with_limit(&[0u8; 32], 16).unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { size: 32, limit: 16 }));
    }

    #[test]
    fn test_load_png_round_trip() {
        let mut png = Vec::new();
        let img = image::GrayImage::from_fn(3, 2, |x, _| image::Luma([if x == 0 { 0 } else { 255 }]));
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        let buf = load(&png).unwrap();
        assert_eq!((buf.width(), buf.height()), (3, 2));
        assert_eq!(buf.get(0, 0), 0);
        assert!(buf.get(2, 1) >= 254);
    }
}
