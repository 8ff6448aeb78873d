//! qr_scan - QR symbol reading and asynchronous scan orchestration
//!
//! Turns a caller-supplied image into text. The QR path is a synchronous
//! pipeline (binarize, locate finder patterns, resolve the symbol frame,
//! sample and decode); the OCR path drives an injected recognition engine.
//! Both are scheduled by an [`Orchestrator`] that keeps at most one request
//! current and classifies the result by confidence.
//!
//! # Example
//! ```
//! use qr_scan::synth::{RenderOptions, encode_symbol, rasterize};
//! use qr_scan::{ECLevel, MaskPattern, Version, scan_qr};
//!
//! let version = Version::new(1).unwrap();
//! let symbol = encode_symbol(b"HELLO", version, ECLevel::M, MaskPattern::from_bits(2)).unwrap();
//! let image = rasterize(&symbol, &RenderOptions::default()).unwrap();
//! assert_eq!(scan_qr(&image).payload(), Some(&b"HELLO"[..]));
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Stage and orchestrator tunables
pub mod config;
/// QR module decoding (sampling, format extraction, codewords, data modes)
pub mod decoder;
/// Symbol detection (finder patterns, geometry)
pub mod detector;
/// Failure taxonomy and error types
pub mod error;
/// Subscriber setup for the command-line tool
pub mod logging;
/// Core data structures (ImageBuffer, BitMatrix, ModuleMatrix, Point, etc.)
pub mod models;
/// Asynchronous request scheduling and result classification
pub mod orchestrator;
/// The synchronous QR pipeline
pub mod pipeline;
/// Symbol encoder and rasterizer for tests, benchmarks and the CLI
pub mod synth;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use config::{DecoderConfig, LocatorConfig, QrConfig, ResolverConfig, ScanConfig};
pub use error::{EncodeError, EngineError, FailureReason, LoadError};
pub use models::{
    BinaryGrid, BitMatrix, DecodeOutcome, ECLevel, ImageBuffer, MaskPattern, ModuleMatrix, Point,
    Version,
};
pub use orchestrator::{
    ConfidenceBand, OcrEngine, OcrWorker, Orchestrator, ProgressSink, Recognition, ScanEvent,
    ScanHandle, ScanMode, ScanOutcome, ScanResult, ScanSource, ScanState,
};
pub use pipeline::{QrPipeline, scan_qr};
pub use utils::binarization::binarize;
pub use utils::grayscale::load;
