use crate::config::QrConfig;
use crate::decoder::{ErrorCorrector, QrDecoder};
use crate::detector::{locate_with, resolve_with};
use crate::models::{DecodeOutcome, ImageBuffer};
use crate::utils::binarization::binarize;
use std::sync::Arc;
use tracing::debug;

/// Binarize -> locate -> resolve -> decode, as one synchronous pass.
///
/// Holds no per-image state, so one pipeline can serve any number of
/// images (and threads) and repeated runs on the same image agree.
#[derive(Debug, Clone, Default)]
pub struct QrPipeline {
    config: QrConfig,
    decoder: QrDecoder,
}

impl QrPipeline {
    /// Pipeline with the given stage parameters and the syndrome-checking corrector
    pub fn new(config: QrConfig) -> Self {
        Self {
            config,
            decoder: QrDecoder::new(config.decoder),
        }
    }

    /// Swap the error-correction step used by the decoder
    pub fn with_corrector(mut self, corrector: Arc<dyn ErrorCorrector>) -> Self {
        self.decoder = self.decoder.with_corrector(corrector);
        self
    }

    /// Stage parameters
    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    /// Binarize, locate, resolve and decode one image
    pub fn run(&self, image: &ImageBuffer) -> DecodeOutcome {
        let grid = binarize(image, None);
        let candidates = locate_with(&grid, &self.config.locator);
        debug!(
            width = image.width(),
            height = image.height(),
            candidates = candidates.len(),
            "qr locate"
        );

        match resolve_with(&candidates, &self.config.resolver) {
            Ok(geometry) => self.decoder.decode(&grid, &geometry),
            Err(reason) => DecodeOutcome::failure(reason),
        }
    }
}

/// Run the QR pipeline with default configuration
pub fn scan_qr(image: &ImageBuffer) -> DecodeOutcome {
    QrPipeline::default().run(image)
}
