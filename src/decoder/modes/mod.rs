//! Per-mode segment body decoders
//!
//! Each takes the reader positioned after the character count and returns
//! the segment's bytes, or `None` when the bits run out or a group holds an
//! out-of-range value.
//! - Numeric: digits 0-9, three per 10 bits
//! - Alphanumeric: 45-symbol set, two per 11 bits
//! - Byte: raw 8-bit data

/// Alphanumeric segments
pub mod alphanumeric;
/// Byte segments
pub mod byte;
/// Numeric segments
pub mod numeric;
