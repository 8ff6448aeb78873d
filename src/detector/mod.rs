//! Symbol detection
//!
//! - Finder pattern location (the three square markers)
//! - Geometry resolution (triple selection, orientation, corners)

/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Finder triple selection and symbol frame
pub mod geometry;

pub use finder::{FinderCandidate, locate, locate_with};
pub use geometry::{SymbolGeometry, resolve, resolve_with};
