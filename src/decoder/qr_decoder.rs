/// Module decoder - sampling through payload segments
use crate::config::DecoderConfig;
use crate::decoder::bitstream::read_codewords;
use crate::decoder::error_correction::{self, ErrorCorrector, SyndromeCheck};
use crate::decoder::format::FormatInfo;
use crate::decoder::function_mask::FunctionMask;
use crate::decoder::payload::decode_segments;
use crate::decoder::{sampler, version};
use crate::detector::SymbolGeometry;
use crate::error::FailureReason;
use crate::models::{BinaryGrid, DecodeOutcome, ModuleMatrix};
use std::sync::Arc;
use tracing::debug;

/// Turns a located symbol into a [`DecodeOutcome`]
#[derive(Clone)]
pub struct QrDecoder {
    config: DecoderConfig,
    corrector: Arc<dyn ErrorCorrector>,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl std::fmt::Debug for QrDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrDecoder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QrDecoder {
    /// Decoder using the syndrome-checking corrector
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            corrector: Arc::new(SyndromeCheck),
        }
    }

    /// Replace the error-correction step
    pub fn with_corrector(mut self, corrector: Arc<dyn ErrorCorrector>) -> Self {
        self.corrector = corrector;
        self
    }

    /// Sample the symbol and decode it. Never panics on malformed input.
    pub fn decode(&self, grid: &BinaryGrid, geometry: &SymbolGeometry) -> DecodeOutcome {
        let outcome = sampler::sample(grid, geometry).and_then(|matrix| self.decode_modules(&matrix));
        if let Err(reason) = &outcome {
            debug!(%reason, version = geometry.version().number(), "decode failed");
        }
        outcome.into()
    }

    /// Decode an already sampled module matrix
    pub fn decode_matrix(&self, matrix: &ModuleMatrix) -> DecodeOutcome {
        self.decode_modules(matrix).into()
    }

    fn decode_modules(&self, matrix: &ModuleMatrix) -> Result<Vec<u8>, FailureReason> {
        sampler::check_timing(matrix, self.config.timing_tolerance)?;
        let format = FormatInfo::read(matrix)?;
        version::verify(matrix)?;

        let version = matrix.version();
        let func = FunctionMask::new(version);
        let codewords = read_codewords(matrix, &func, format.mask_pattern);
        debug!(
            version = version.number(),
            ec_level = ?format.ec_level,
            mask = format.mask_pattern as u8,
            codewords = codewords.len(),
            "symbol format"
        );

        let data = error_correction::correct(
            &codewords,
            version,
            format.ec_level,
            self.corrector.as_ref(),
        )?;
        decode_segments(&data, version)
    }
}

/// Decode with default configuration
pub fn decode(grid: &BinaryGrid, geometry: &SymbolGeometry) -> DecodeOutcome {
    QrDecoder::default().decode(grid, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::format::positions;
    use crate::models::{ECLevel, MaskPattern, Version};
    use crate::synth::encode_symbol;

    fn hello() -> ModuleMatrix {
        let version = Version::new(2).unwrap();
        encode_symbol(b"HELLO", version, ECLevel::M, MaskPattern::Pattern3).unwrap()
    }

    fn all_format_words() -> Vec<u16> {
        [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H]
            .into_iter()
            .flat_map(|ec_level| {
                (0..8).map(move |mask| {
                    FormatInfo {
                        ec_level,
                        mask_pattern: MaskPattern::from_bits(mask),
                    }
                    .encode()
                })
            })
            .collect()
    }

    fn write_format(matrix: &mut ModuleMatrix, word: u16) {
        let size = matrix.dimension();
        let modules = matrix.modules_mut();
        for copy in positions(size) {
            for (i, &(x, y)) in copy.iter().enumerate() {
                modules.set(x, y, (word >> i) & 1 == 1);
            }
        }
    }

    #[test]
    fn test_clean_symbol_decodes() {
        let outcome = QrDecoder::default().decode_matrix(&hello());
        assert_eq!(outcome.payload(), Some(&b"HELLO"[..]));
    }

    #[test]
    fn test_format_beyond_correction_is_corrupt() {
        let words = all_format_words();
        let far = (0u16..1 << 15)
            .find(|w| words.iter().all(|c| (c ^ w).count_ones() > 3))
            .unwrap();

        let mut matrix = hello();
        write_format(&mut matrix, far);
        assert_eq!(
            QrDecoder::default().decode_matrix(&matrix),
            DecodeOutcome::failure(FailureReason::FormatInfoCorrupt)
        );
    }

    #[test]
    fn test_correctable_format_damage_still_decodes() {
        let info = FormatInfo {
            ec_level: ECLevel::M,
            mask_pattern: MaskPattern::Pattern3,
        };
        let mut matrix = hello();
        write_format(&mut matrix, info.encode() ^ 0b100_0000_0001_0100);
        let outcome = QrDecoder::default().decode_matrix(&matrix);
        assert_eq!(outcome.payload(), Some(&b"HELLO"[..]));
    }

    #[test]
    fn test_complemented_format_is_another_codeword() {
        // Inverting every format module yields a valid word for a different
        // level/mask, so it cannot be told apart from a genuine symbol
        let info = FormatInfo {
            ec_level: ECLevel::M,
            mask_pattern: MaskPattern::Pattern3,
        };
        let mut matrix = hello();
        write_format(&mut matrix, !info.encode() & 0x7FFF);

        let read = FormatInfo::read(&matrix).unwrap();
        assert_ne!(read, info);
        assert!(QrDecoder::default().decode_matrix(&matrix).payload().is_none());
    }
}
