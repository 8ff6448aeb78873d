use crate::error::LoadError;

/// Immutable luminance image, one byte per pixel, row-major.
///
/// Built once per scan request by the pixel adapter
/// ([`utils::grayscale`](crate::utils::grayscale)) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap pre-computed luminance samples.
    ///
    /// Fails when either dimension is zero or the sample count is not
    /// `width * height`.
    pub fn from_luma(width: usize, height: usize, samples: Vec<u8>) -> Result<Self, LoadError> {
        check_dimensions(width, height, 1, samples.len())?;
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    /// One row of samples
    pub fn row(&self, y: usize) -> &[u8] {
        &self.samples[y * self.width..(y + 1) * self.width]
    }

    /// All samples, row-major
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}

pub(crate) fn check_dimensions(
    width: usize,
    height: usize,
    channels: usize,
    actual: usize,
) -> Result<(), LoadError> {
    if width == 0 || height == 0 {
        return Err(LoadError::ZeroDimensions { width, height });
    }
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .unwrap_or(usize::MAX);
    if expected != actual {
        return Err(LoadError::BufferSize {
            width,
            height,
            channels,
            expected,
            actual,
        });
    }
    Ok(())
}
