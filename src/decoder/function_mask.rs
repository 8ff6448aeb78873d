use crate::models::{BitMatrix, Version};

/// Alignment pattern center coordinates, indexed by version - 1
const ALIGNMENT_CENTERS: [&[usize]; 8] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
];

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
    version: Version,
}

impl FunctionMask {
    /// Mark finders, separators, timing, format, dark module, alignment and version areas
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut mask = BitMatrix::new(size, size);

        // Finder patterns + separators (up to 9x9 areas, clipped to bounds)
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_centers(version) {
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    mask.set(x, y, true);
                }
            }
        }

        // Format info areas
        for i in 0..9 {
            if i != 6 {
                mask.set(8, i, true);
                mask.set(i, 8, true);
            }
        }
        for i in 0..8 {
            mask.set(size - 1 - i, 8, true);
            mask.set(8, size - 1 - i, true);
        }

        // Dark module
        mask.set(8, size - 8, true);

        if version.has_version_info() {
            for dy in 0..6 {
                for dx in 0..3 {
                    mask.set(size - 11 + dx, dy, true);
                    mask.set(dy, size - 11 + dx, true);
                }
            }
        }

        Self { mask, version }
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version the mask was built for
    pub fn version(&self) -> Version {
        self.version
    }

    /// True when `(x, y)` is not a data module
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Number of modules available to codewords
    pub fn data_modules_count(&self) -> usize {
        self.size() * self.size() - self.mask.count_ones()
    }

    /// Data module coordinates `(x, y)` in codeword placement order.
    ///
    /// Column pairs are walked right to left, alternating upward and
    /// downward, with column 6 (vertical timing) skipped. Both the reader
    /// and the symbol writer use this order.
    pub fn placement_order(&self) -> Vec<(usize, usize)> {
        let size = self.size();
        let mut order = Vec::with_capacity(self.data_modules_count());
        let mut upward = true;
        let mut right = size as isize - 1;

        while right > 0 {
            if right == 6 {
                right -= 1;
            }
            for step in 0..size {
                let y = if upward { size - 1 - step } else { step };
                for x in [right as usize, right as usize - 1] {
                    if !self.is_function(x, y) {
                        order.push((x, y));
                    }
                }
            }
            upward = !upward;
            right -= 2;
        }

        order
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let size = mask.width();
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        let end_x = (x + 7 + 1).min(size);
        let end_y = (y + 7 + 1).min(size);
        for yy in start_y..end_y {
            for xx in start_x..end_x {
                mask.set(xx, yy, true);
            }
        }
    }
}

/// Alignment pattern centers `(x, y)` for a version, excluding the three
/// positions that would overlap a finder
pub fn alignment_centers(version: Version) -> Vec<(usize, usize)> {
    let coords = ALIGNMENT_CENTERS[version.number() as usize - 1];
    let last = coords.len().saturating_sub(1);
    let mut centers = Vec::new();
    for (i, &cy) in coords.iter().enumerate() {
        for (j, &cx) in coords.iter().enumerate() {
            let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_CODEWORDS: [usize; 8] = [26, 44, 70, 100, 134, 172, 196, 242];

    #[test]
    fn test_data_module_counts() {
        for number in 1..=8u8 {
            let version = Version::new(number).unwrap();
            let mask = FunctionMask::new(version);
            assert_eq!(
                mask.data_modules_count() / 8,
                RAW_CODEWORDS[number as usize - 1],
                "version {}",
                number
            );
        }
    }

    #[test]
    fn test_version_1_data_modules() {
        let mask = FunctionMask::new(Version::new(1).unwrap());
        assert_eq!(mask.data_modules_count(), 208);
        assert!(mask.is_function(0, 0));
        assert!(mask.is_function(8, 13));
        assert!(!mask.is_function(20, 20));
        assert!(!mask.is_function(9, 9));
    }

    #[test]
    fn test_alignment_centers() {
        assert!(alignment_centers(Version::new(1).unwrap()).is_empty());
        assert_eq!(alignment_centers(Version::new(2).unwrap()), vec![(18, 18)]);
        let v7 = alignment_centers(Version::new(7).unwrap());
        assert_eq!(v7.len(), 6);
        assert!(v7.contains(&(22, 22)));
        assert!(v7.contains(&(38, 38)));
        assert!(!v7.contains(&(6, 6)));
    }

    #[test]
    fn test_placement_order_covers_data_modules() {
        let mask = FunctionMask::new(Version::new(2).unwrap());
        let order = mask.placement_order();
        assert_eq!(order.len(), mask.data_modules_count());
        // starts in the bottom-right corner going up
        assert_eq!(order[0], (24, 24));
        assert_eq!(order[1], (23, 24));
        assert_eq!(order[2], (24, 23));
        let mut seen = std::collections::HashSet::new();
        assert!(order.iter().all(|p| seen.insert(*p)));
    }
}
