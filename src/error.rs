//! Error taxonomy shared by every pipeline stage and the scan orchestrator.
//!
//! Stage failures are plain values ([`FailureReason`]) rather than faults: each
//! stage recovers locally and hands the reason to the next layer, and only the
//! orchestrator turns it into a user-facing classification.

use thiserror::Error;

/// Why a scan (or one of its stages) produced no usable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FailureReason {
    /// Input bytes could not be decoded or had zero/inconsistent dimensions.
    #[error("image could not be read")]
    UnreadableImage,
    /// Fewer than three finder patterns were located.
    #[error("fewer than three finder patterns were found")]
    InsufficientPatterns,
    /// Finder patterns exist but no triple forms a plausible symbol.
    #[error("finder patterns do not form a coherent symbol")]
    IncoherentGeometry,
    /// Sampled timing strips do not alternate as expected.
    #[error("timing pattern mismatch")]
    TimingMismatch,
    /// Format or version information could not be recovered.
    #[error("format information is corrupt")]
    FormatInfoCorrupt,
    /// The error-correction step rejected a codeword block.
    #[error("codewords contain uncorrectable errors")]
    UncorrectableErrors,
    /// The payload declares an encoding mode this decoder does not handle.
    #[error("unsupported payload encoding")]
    UnsupportedEncoding,
    /// The OCR collaborator failed to start or crashed.
    #[error("recognition engine unavailable")]
    EngineUnavailable,
    /// The OCR collaborator went silent for longer than the configured bound.
    #[error("recognition timed out")]
    Timeout,
}

/// Failure to turn caller input into an [`ImageBuffer`](crate::models::ImageBuffer).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The encoded bytes are not an image format we can read.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Width or height is zero.
    #[error("image has zero width or height ({width}x{height})")]
    ZeroDimensions {
        /// Declared width in pixels
        width: usize,
        /// Declared height in pixels
        height: usize,
    },

    /// The pixel buffer length does not match the declared shape.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    BufferSize {
        /// Declared width in pixels
        width: usize,
        /// Declared height in pixels
        height: usize,
        /// Bytes per pixel
        channels: usize,
        /// `width * height * channels`
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },

    /// The encoded upload is over the configured size limit.
    #[error("encoded image is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Upload size in bytes
        size: usize,
        /// Configured maximum
        limit: usize,
    },
}

impl LoadError {
    /// Every load failure surfaces as [`FailureReason::UnreadableImage`].
    pub fn reason(&self) -> FailureReason {
        FailureReason::UnreadableImage
    }
}

/// Failure reported by an injected OCR engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Worker creation failed.
    #[error("recognition worker failed to start: {0}")]
    Startup(String),

    /// A recognition pass failed after the worker started.
    #[error("recognition failed: {0}")]
    Recognition(String),
}

impl EngineError {
    /// Engine faults surface as [`FailureReason::EngineUnavailable`].
    pub fn reason(&self) -> FailureReason {
        FailureReason::EngineUnavailable
    }
}

/// Failure to build a symbol in [`synth`](crate::synth).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The payload does not fit the requested version and level.
    #[error("payload of {len} bytes exceeds the {capacity}-byte capacity")]
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Byte capacity of the symbol
        capacity: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_errors_map_to_unreadable() {
        let err = LoadError::ZeroDimensions {
            width: 0,
            height: 4,
        };
        assert_eq!(err.reason(), FailureReason::UnreadableImage);
        assert!(err.to_string().contains("0x4"));
    }

    #[test]
    fn test_engine_errors_map_to_unavailable() {
        let err = EngineError::Startup("no model".into());
        assert_eq!(err.reason(), FailureReason::EngineUnavailable);
    }
}
