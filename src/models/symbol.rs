use super::BitMatrix;

/// Highest symbol version this decoder handles
pub const MAX_VERSION: u8 = 8;

/// Symbol version (1..=[`MAX_VERSION`]); fixes the module dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u8);

impl Version {
    /// Version from its number, if supported
    pub fn new(number: u8) -> Option<Self> {
        (1..=MAX_VERSION).contains(&number).then_some(Self(number))
    }

    /// Version whose symbol is `dimension` modules wide, if legal
    pub fn from_dimension(dimension: usize) -> Option<Self> {
        if dimension < 21 || (dimension - 17) % 4 != 0 {
            return None;
        }
        u8::try_from((dimension - 17) / 4).ok().and_then(Self::new)
    }

    /// Version number
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Side length in modules (21, 25, ...)
    pub fn size(&self) -> usize {
        17 + 4 * self.0 as usize
    }

    /// Versions 7+ carry an explicit 18-bit version block
    pub fn has_version_info(&self) -> bool {
        self.0 >= 7
    }
}

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ECLevel {
    /// Low (~7% recovery capacity)
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity)
    H,
}

impl ECLevel {
    /// Level from the two format-information bits (01=L, 00=M, 11=Q, 10=H)
    pub fn from_format_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b01 => ECLevel::L,
            0b00 => ECLevel::M,
            0b11 => ECLevel::Q,
            _ => ECLevel::H,
        }
    }

    /// The two bits this level occupies in format information
    pub fn format_bits(&self) -> u8 {
        match self {
            ECLevel::L => 0b01,
            ECLevel::M => 0b00,
            ECLevel::Q => 0b11,
            ECLevel::H => 0b10,
        }
    }

    pub(crate) fn table_index(&self) -> usize {
        match self {
            ECLevel::L => 0,
            ECLevel::M => 1,
            ECLevel::Q => 2,
            ECLevel::H => 3,
        }
    }
}

/// Data mask pattern (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskPattern {
    /// (i + j) % 2 == 0
    Pattern0 = 0,
    /// i % 2 == 0
    Pattern1 = 1,
    /// j % 3 == 0
    Pattern2 = 2,
    /// (i + j) % 3 == 0
    Pattern3 = 3,
    /// (i/2 + j/3) % 2 == 0
    Pattern4 = 4,
    /// (i*j)%2 + (i*j)%3 == 0
    Pattern5 = 5,
    /// ((i*j)%2 + (i*j)%3) % 2 == 0
    Pattern6 = 6,
    /// ((i+j)%2 + (i*j)%3) % 2 == 0
    Pattern7 = 7,
}

impl MaskPattern {
    /// Mask pattern from the low three bits
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => MaskPattern::Pattern0,
            1 => MaskPattern::Pattern1,
            2 => MaskPattern::Pattern2,
            3 => MaskPattern::Pattern3,
            4 => MaskPattern::Pattern4,
            5 => MaskPattern::Pattern5,
            6 => MaskPattern::Pattern6,
            _ => MaskPattern::Pattern7,
        }
    }

    /// Whether the module at row `i`, column `j` is inverted by this mask
    pub fn is_masked(&self, i: usize, j: usize) -> bool {
        match self {
            MaskPattern::Pattern0 => (i + j) % 2 == 0,
            MaskPattern::Pattern1 => i % 2 == 0,
            MaskPattern::Pattern2 => j % 3 == 0,
            MaskPattern::Pattern3 => (i + j) % 3 == 0,
            MaskPattern::Pattern4 => (i / 2 + j / 3) % 2 == 0,
            MaskPattern::Pattern5 => (i * j) % 2 + (i * j) % 3 == 0,
            MaskPattern::Pattern6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
            MaskPattern::Pattern7 => ((i + j) % 2 + (i * j) % 3) % 2 == 0,
        }
    }
}

/// Sampled N×N module grid (true = dark) for one decode attempt.
///
/// Only constructible with a legal dimension; read-only after sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    version: Version,
    modules: BitMatrix,
}

impl ModuleMatrix {
    /// Wrap a square matrix whose side matches `version`
    pub fn new(version: Version, modules: BitMatrix) -> Option<Self> {
        let n = version.size();
        (modules.width() == n && modules.height() == n).then_some(Self { version, modules })
    }

    /// All-light matrix for `version`
    pub(crate) fn blank(version: Version) -> Self {
        let n = version.size();
        Self {
            version,
            modules: BitMatrix::new(n, n),
        }
    }

    pub(crate) fn modules_mut(&mut self) -> &mut BitMatrix {
        &mut self.modules
    }

    /// Symbol version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Side length N
    pub fn dimension(&self) -> usize {
        self.version.size()
    }

    /// Module at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    /// Underlying bits
    pub fn bits(&self) -> &BitMatrix {
        &self.modules
    }
}
