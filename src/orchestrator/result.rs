//! Final, user-facing classification of one scan.

use super::engine::Recognition;
use crate::error::FailureReason;
use crate::models::DecodeOutcome;

/// Which extraction path a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanMode {
    /// Local QR pipeline
    Qr,
    /// Injected text recognition engine
    Ocr,
}

/// Classification delivered to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Usable text with acceptable confidence
    Success,
    /// The scan ran cleanly but nothing usable came out
    NoContentFound,
    /// Text was recognized but confidence is under the threshold
    LowConfidence,
    /// The scan could not run to completion
    Failure(FailureReason),
}

/// Display band for a confidence value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceBand {
    /// Below the low threshold
    Low,
    /// Between the thresholds
    Medium,
    /// At or above the high threshold
    High,
}

impl ConfidenceBand {
    /// Band for `confidence` given the low and high thresholds
    pub fn classify(confidence: u8, low: u8, high: u8) -> Self {
        if confidence >= high {
            ConfidenceBand::High
        } else if confidence >= low {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Result of one scan request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Mode that produced this result
    pub mode: ScanMode,
    /// Extracted text; empty unless the outcome delivers text
    pub text: String,
    /// 0-100
    pub confidence: u8,
    /// Whitespace-separated words in `text`
    pub word_count: usize,
    /// Classification of the request
    pub outcome: ScanOutcome,
    /// Stage failure kept for corrective hints, also on `NoContentFound`
    pub reason: Option<FailureReason>,
}

impl ScanResult {
    /// A scan that could not complete
    pub fn failure(mode: ScanMode, reason: FailureReason) -> Self {
        Self {
            mode,
            text: String::new(),
            confidence: 0,
            word_count: 0,
            outcome: ScanOutcome::Failure(reason),
            reason: Some(reason),
        }
    }

    fn no_content(mode: ScanMode, reason: Option<FailureReason>) -> Self {
        Self {
            mode,
            text: String::new(),
            confidence: 0,
            word_count: 0,
            outcome: ScanOutcome::NoContentFound,
            reason,
        }
    }

    /// Classify a QR decode.
    ///
    /// A decoded symbol is exact, so success carries confidence 100. A
    /// failed decode means no symbol was read, which is `NoContentFound`
    /// with the stage reason retained.
    pub fn from_qr(outcome: &DecodeOutcome) -> Self {
        match outcome {
            DecodeOutcome::Success { .. } => {
                let text = outcome.text().unwrap_or_default();
                if text.trim().is_empty() {
                    return Self::no_content(ScanMode::Qr, None);
                }
                Self {
                    mode: ScanMode::Qr,
                    word_count: word_count(&text),
                    text,
                    confidence: 100,
                    outcome: ScanOutcome::Success,
                    reason: None,
                }
            }
            DecodeOutcome::Failure { reason } => Self::no_content(ScanMode::Qr, Some(*reason)),
        }
    }

    /// Classify an OCR recognition against `low_threshold`
    pub fn from_recognition(recognition: Recognition, low_threshold: u8) -> Self {
        let text = recognition.text.trim().to_string();
        if text.is_empty() {
            return Self::no_content(ScanMode::Ocr, None);
        }
        let confidence = recognition.confidence.round().clamp(0.0, 100.0) as u8;
        let outcome = if confidence < low_threshold {
            ScanOutcome::LowConfidence
        } else {
            ScanOutcome::Success
        };
        Self {
            mode: ScanMode::Ocr,
            word_count: word_count(&text),
            text,
            confidence,
            outcome,
            reason: None,
        }
    }

    /// Whether text should reach the presentation layer
    pub fn delivers_text(&self) -> bool {
        matches!(
            self.outcome,
            ScanOutcome::Success | ScanOutcome::LowConfidence
        )
    }

    /// Display band of this result's confidence
    pub fn band(&self, low: u8, high: u8) -> ConfidenceBand {
        ConfidenceBand::classify(self.confidence, low, high)
    }
}

/// Words separated by runs of whitespace
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognition(text: &str, confidence: f32) -> Recognition {
        Recognition {
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("a  b\nc"), 3);
        assert_eq!(word_count("  two\t\twords \n"), 2);
    }

    #[test]
    fn test_low_confidence_keeps_text() {
        let r = ScanResult::from_recognition(recognition(" faint text ", 65.0), 70);
        assert_eq!(r.outcome, ScanOutcome::LowConfidence);
        assert_eq!(r.text, "faint text");
        assert_eq!(r.confidence, 65);
        assert!(r.delivers_text());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let r = ScanResult::from_recognition(recognition("ok", 70.0), 70);
        assert_eq!(r.outcome, ScanOutcome::Success);
    }

    #[test]
    fn test_blank_ocr_is_no_content() {
        let r = ScanResult::from_recognition(recognition(" \n\t", 99.0), 70);
        assert_eq!(r.outcome, ScanOutcome::NoContentFound);
        assert!(!r.delivers_text());
        assert_eq!(r.word_count, 0);
    }

    #[test]
    fn test_qr_success_is_certain() {
        let outcome = DecodeOutcome::Success {
            payload: b"HELLO WORLD".to_vec(),
        };
        let r = ScanResult::from_qr(&outcome);
        assert_eq!(r.outcome, ScanOutcome::Success);
        assert_eq!(r.confidence, 100);
        assert_eq!(r.word_count, 2);
    }

    #[test]
    fn test_qr_failure_keeps_reason() {
        let r = ScanResult::from_qr(&DecodeOutcome::failure(FailureReason::InsufficientPatterns));
        assert_eq!(r.outcome, ScanOutcome::NoContentFound);
        assert_eq!(r.reason, Some(FailureReason::InsufficientPatterns));
        assert!(r.text.is_empty());
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::classify(85, 70, 80), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::classify(80, 70, 80), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::classify(75, 70, 80), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::classify(12, 70, 80), ConfidenceBand::Low);
    }
}
