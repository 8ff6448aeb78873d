//! QR module decoding
//!
//! Everything after the symbol has been located:
//! - Grid sampling and timing validation
//! - Format and version information recovery
//! - Codeword extraction along the zigzag order and unmasking
//! - Block de-interleaving behind a pluggable error-correction step
//! - Data mode decoding (numeric, alphanumeric, byte)

/// Codeword extraction and placement
pub mod bitstream;
/// GF(256), block de-interleaving and the error-correction seam
pub mod error_correction;
/// Format information (mask pattern, EC level)
pub mod format;
/// Function module mask builder (finder/timing/format/alignment/version)
pub mod function_mask;
/// Data mode decoders (numeric, alphanumeric, byte)
pub mod modes;
/// Segment stream decoding
pub mod payload;
/// Main decoder that wires the steps together
pub mod qr_decoder;
/// Module grid sampling and timing checks
pub mod sampler;
/// Block structure tables for versions 1-8
pub mod tables;
/// Version information (versions 7+)
pub mod version;

pub use error_correction::{ErrorCorrector, SyndromeCheck};
pub use qr_decoder::{QrDecoder, decode};
