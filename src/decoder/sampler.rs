/// Grid projection and timing validation
use crate::detector::SymbolGeometry;
use crate::error::FailureReason;
use crate::models::{BinaryGrid, BitMatrix, ModuleMatrix, Point};
use crate::utils::geometry::PerspectiveTransform;
use tracing::trace;

/// Sample every module center of the symbol described by `geometry`.
///
/// Module centers that project outside the grid read as light.
pub fn sample(grid: &BinaryGrid, geometry: &SymbolGeometry) -> Result<ModuleMatrix, FailureReason> {
    let n = geometry.dimension();
    let side = n as f32;
    let module_space = [
        Point::new(0.0, 0.0),
        Point::new(side, 0.0),
        Point::new(side, side),
        Point::new(0.0, side),
    ];
    let transform = PerspectiveTransform::from_points(&module_space, geometry.corners())
        .ok_or(FailureReason::IncoherentGeometry)?;

    let (width, height) = (grid.width() as f32, grid.height() as f32);
    let modules = BitMatrix::from_fn(n, n, |x, y| {
        let p = transform.transform(&Point::new(x as f32 + 0.5, y as f32 + 0.5));
        if !(p.x >= 0.0 && p.y >= 0.0 && p.x < width && p.y < height) {
            return false;
        }
        grid.get(p.x as usize, p.y as usize)
    });

    ModuleMatrix::new(geometry.version(), modules).ok_or(FailureReason::IncoherentGeometry)
}

/// Fraction of timing modules (row 6 and column 6, between the finders)
/// that break the dark/light alternation
pub fn timing_error_rate(matrix: &ModuleMatrix) -> f32 {
    let n = matrix.dimension();
    let mut mismatches = 0usize;
    let mut total = 0usize;
    for i in 8..n - 8 {
        let expected = i % 2 == 0;
        mismatches += usize::from(matrix.get(i, 6) != expected);
        mismatches += usize::from(matrix.get(6, i) != expected);
        total += 2;
    }
    mismatches as f32 / total as f32
}

/// `TimingMismatch` when the error rate exceeds `tolerance`
pub fn check_timing(matrix: &ModuleMatrix, tolerance: f32) -> Result<(), FailureReason> {
    let rate = timing_error_rate(matrix);
    trace!(rate, tolerance, "timing strips");
    if rate > tolerance {
        Err(FailureReason::TimingMismatch)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    fn timing_matrix(version: Version, flips: usize) -> ModuleMatrix {
        let n = version.size();
        let mut modules = BitMatrix::new(n, n);
        for i in 8..n - 8 {
            modules.set(i, 6, i % 2 == 0);
            modules.set(6, i, i % 2 == 0);
        }
        for i in (8..n - 8).take(flips) {
            modules.toggle(i, 6);
        }
        ModuleMatrix::new(version, modules).unwrap()
    }

    #[test]
    fn test_clean_timing() {
        let m = timing_matrix(Version::new(2).unwrap(), 0);
        assert_eq!(timing_error_rate(&m), 0.0);
        assert_eq!(check_timing(&m, 0.25), Ok(()));
    }

    #[test]
    fn test_timing_tolerance() {
        // v1 has 5 + 5 timing modules; 2 flips = 20%, 3 flips = 30%
        let v1 = Version::new(1).unwrap();
        assert_eq!(check_timing(&timing_matrix(v1, 2), 0.25), Ok(()));
        assert_eq!(
            check_timing(&timing_matrix(v1, 3), 0.25),
            Err(FailureReason::TimingMismatch)
        );
    }

    #[test]
    fn test_blank_matrix_fails_timing() {
        let v = Version::new(4).unwrap();
        let m = ModuleMatrix::new(v, BitMatrix::new(33, 33)).unwrap();
        assert_eq!(check_timing(&m, 0.25), Err(FailureReason::TimingMismatch));
    }

    #[test]
    fn test_sample_axis_aligned_grid() {
        // 21x21 symbol, 3px modules, 6px margin; checkerboard of modules
        let version = Version::new(1).unwrap();
        let grid = BinaryGrid::from_fn(75, 75, |x, y| {
            if x < 6 || y < 6 || x >= 69 || y >= 69 {
                return false;
            }
            ((x - 6) / 3 + (y - 6) / 3) % 2 == 0
        });
        // Finder centers at module 3.5 -> pixel 6 + 10.5
        let geometry = SymbolGeometry::from_finder_centers(
            Point::new(16.5, 16.5),
            Point::new(58.5, 16.5),
            Point::new(16.5, 58.5),
            version,
        )
        .unwrap();
        let m = sample(&grid, &geometry).unwrap();
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(m.get(x, y), (x + y) % 2 == 0, "module ({}, {})", x, y);
            }
        }
    }
}
