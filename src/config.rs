//! Tunables for the QR stages and the scan orchestrator.
//!
//! Every struct has a `Default` matching the documented behavior;
//! [`ScanConfig::from_env`] lets a deployment override individual knobs
//! through `SCAN_*` environment variables. Unparseable values keep the default.

use std::time::Duration;

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Finder pattern search parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorConfig {
    /// Scan every `row_stride`-th row (1 = exhaustive)
    pub row_stride: usize,
    /// Allowed relative deviation of each run from its 1:1:3:1:1 share
    pub ratio_tolerance: f32,
    /// Hits closer than this many pixels merge into one candidate
    pub merge_radius: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            row_stride: 1,
            ratio_tolerance: 0.5,
            merge_radius: 5.0,
        }
    }
}

/// Finder triple selection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Max relative spread of module widths within one triple
    pub module_tolerance: f32,
    /// Max |cos| of the corner angle at the top-left finder
    pub max_corner_cosine: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            module_tolerance: 0.25,
            max_corner_cosine: 0.3,
        }
    }
}

/// Module sampling/decoding parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Max fraction of timing modules allowed to disagree with the pattern
    pub timing_tolerance: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            timing_tolerance: 0.25,
        }
    }
}

/// All QR stage parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QrConfig {
    /// Finder pattern search
    pub locator: LocatorConfig,
    /// Finder triple selection and symbol frame
    pub resolver: ResolverConfig,
    /// Module sampling and decoding
    pub decoder: DecoderConfig,
}

/// Orchestrator-level parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// OCR confidence below this is delivered flagged `LowConfidence`
    pub low_confidence_threshold: u8,
    /// OCR confidence at or above this falls in the high display band
    pub high_confidence_threshold: u8,
    /// Max time without progress or result from the OCR engine
    pub engine_silence_timeout: Duration,
    /// Encoded uploads larger than this are rejected
    pub max_encoded_bytes: usize,
    /// Parameters handed to the QR pipeline
    pub qr: QrConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 70,
            high_confidence_threshold: 80,
            engine_silence_timeout: Duration::from_secs(30),
            max_encoded_bytes: 10 * 1024 * 1024,
            qr: QrConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Defaults overridden by `SCAN_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            low_confidence_threshold: parse_env("SCAN_LOW_CONFIDENCE", d.low_confidence_threshold)
                .min(100),
            high_confidence_threshold: parse_env(
                "SCAN_HIGH_CONFIDENCE",
                d.high_confidence_threshold,
            )
            .min(100),
            engine_silence_timeout: Duration::from_millis(parse_env(
                "SCAN_ENGINE_TIMEOUT_MS",
                d.engine_silence_timeout.as_millis() as u64,
            )),
            max_encoded_bytes: parse_env("SCAN_MAX_ENCODED_BYTES", d.max_encoded_bytes),
            qr: QrConfig {
                locator: LocatorConfig {
                    row_stride: parse_env("SCAN_ROW_STRIDE", d.qr.locator.row_stride).max(1),
                    ratio_tolerance: parse_env(
                        "SCAN_RATIO_TOLERANCE",
                        d.qr.locator.ratio_tolerance,
                    )
                    .clamp(0.05, 0.9),
                    merge_radius: parse_env("SCAN_MERGE_RADIUS", d.qr.locator.merge_radius)
                        .max(0.5),
                },
                resolver: ResolverConfig {
                    module_tolerance: parse_env(
                        "SCAN_MODULE_TOLERANCE",
                        d.qr.resolver.module_tolerance,
                    )
                    .clamp(0.0, 1.0),
                    ..d.qr.resolver
                },
                decoder: DecoderConfig {
                    timing_tolerance: parse_env(
                        "SCAN_TIMING_TOLERANCE",
                        d.qr.decoder.timing_tolerance,
                    )
                    .clamp(0.0, 1.0),
                },
            },
        }
    }
}
