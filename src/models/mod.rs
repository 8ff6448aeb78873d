/// Luminance image the pipeline consumes
pub mod image_buffer;
/// Packed bit storage for binary grids and module matrices
pub mod matrix;
/// Result of one QR decode attempt
pub mod outcome;
/// Sub-pixel points
pub mod point;
/// Symbol versions, EC levels, masks and sampled module matrices
pub mod symbol;

pub use image_buffer::ImageBuffer;
pub use matrix::{BinaryGrid, BitMatrix};
pub use outcome::DecodeOutcome;
pub use point::Point;
pub use symbol::{ECLevel, MAX_VERSION, MaskPattern, ModuleMatrix, Version};
