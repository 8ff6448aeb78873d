//! Pick a finder triple and derive the symbol frame from it.
//!
//! The top-left finder sits at the (near) right angle; the sign of the
//! cross product of its two legs tells top-right from bottom-left, so any
//! in-plane rotation resolves to the same canonical orientation. The
//! bottom-right corner is inferred from the affine frame spanned by the
//! three centers.

use super::FinderCandidate;
use crate::config::ResolverConfig;
use crate::error::FailureReason;
use crate::models::{Point, Version};
use crate::utils::geometry::is_convex_quad;
use tracing::{debug, trace};

/// Candidates considered when forming triples
const MAX_RANKED: usize = 16;

/// Allowed deviation of the refined module size from the finder estimates
const MODULE_REFINE_TOLERANCE: f32 = 0.3;

/// Where the symbol sits in the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolGeometry {
    corners: [Point; 4],
    finders: [Point; 3],
    module_size: f32,
    rotation: f32,
    version: Version,
}

impl SymbolGeometry {
    /// Frame from the three finder centers (top-left, top-right, bottom-left).
    ///
    /// Fails with `IncoherentGeometry` when the outer corners are not a
    /// convex quadrilateral.
    pub fn from_finder_centers(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        version: Version,
    ) -> Result<Self, FailureReason> {
        let span = (version.size() - 7) as f32;
        let ex = top_left.to(&top_right);
        let ey = top_left.to(&bottom_left);
        let ex = Point::new(ex.x / span, ex.y / span);
        let ey = Point::new(ey.x / span, ey.y / span);

        // Finder centers sit at module (3.5, 3.5) from their corner
        let at = |u: f32, v: f32| top_left.offset(&ex, u - 3.5).offset(&ey, v - 3.5);
        let n = version.size() as f32;
        let corners = [at(0.0, 0.0), at(n, 0.0), at(n, n), at(0.0, n)];

        let module_size = (ex.norm() + ey.norm()) / 2.0;
        if !module_size.is_finite() || module_size <= 0.0 || !is_convex_quad(&corners) {
            return Err(FailureReason::IncoherentGeometry);
        }

        Ok(Self {
            corners,
            finders: [top_left, top_right, bottom_left],
            module_size,
            rotation: ex.y.atan2(ex.x),
            version,
        })
    }

    /// Outer corners: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Finder centers: top-left, top-right, bottom-left
    pub fn finders(&self) -> &[Point; 3] {
        &self.finders
    }

    /// Module width in pixels
    pub fn module_size(&self) -> f32 {
        self.module_size
    }

    /// Rotation of the top edge in radians (0 = upright)
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Symbol version implied by the finder spacing
    pub fn version(&self) -> Version {
        self.version
    }

    /// Side length N in modules
    pub fn dimension(&self) -> usize {
        self.version.size()
    }
}

/// Resolve with default parameters
pub fn resolve(candidates: &[FinderCandidate]) -> Result<SymbolGeometry, FailureReason> {
    resolve_with(candidates, &ResolverConfig::default())
}

/// Choose the best coherent finder triple and return its geometry.
///
/// Triples are tried in order of candidate score; the first that passes
/// every consistency check wins.
pub fn resolve_with(
    candidates: &[FinderCandidate],
    config: &ResolverConfig,
) -> Result<SymbolGeometry, FailureReason> {
    if candidates.len() < 3 {
        return Err(FailureReason::InsufficientPatterns);
    }

    let mut ranked: Vec<&FinderCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(MAX_RANKED);

    let n = ranked.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let triple = [ranked[i], ranked[j], ranked[k]];
                if let Some(geometry) = try_triple(triple, config) {
                    debug!(
                        version = geometry.version.number(),
                        module_size = geometry.module_size,
                        rotation = geometry.rotation,
                        "symbol geometry resolved"
                    );
                    return Ok(geometry);
                }
            }
        }
    }

    debug!(candidates = candidates.len(), "no coherent finder triple");
    Err(FailureReason::IncoherentGeometry)
}

fn try_triple(triple: [&FinderCandidate; 3], config: &ResolverConfig) -> Option<SymbolGeometry> {
    let widths = triple.map(|c| c.module_size);
    let min = widths.iter().copied().fold(f32::INFINITY, f32::min);
    let max = widths.iter().copied().fold(0.0, f32::max);
    if min <= 0.0 || max / min > 1.0 + config.module_tolerance {
        trace!(min, max, "module widths disagree");
        return None;
    }
    let module = widths.iter().sum::<f32>() / 3.0;

    let (tl, tr, bl) = order_finders(triple.map(|c| c.center), config.max_corner_cosine)?;
    let d_tr = tl.distance(&tr);
    let d_bl = tl.distance(&bl);

    // Each leg on its own must imply (nearly) the same version
    let leg_version = |d: f32| ((d / module + 7.0 - 17.0) / 4.0).round();
    if (leg_version(d_tr) - leg_version(d_bl)).abs() > 1.0 {
        trace!(d_tr, d_bl, "finder legs imply different sizes");
        return None;
    }

    let mean = (d_tr + d_bl) / 2.0;
    let number = ((mean / module + 7.0 - 17.0) / 4.0).round();
    if !(1.0..=f32::from(u8::MAX)).contains(&number) {
        return None;
    }
    let version = Version::new(number as u8)?;

    let refined = mean / (version.size() - 7) as f32;
    if (refined / module - 1.0).abs() > MODULE_REFINE_TOLERANCE {
        trace!(refined, module, "refined module size out of range");
        return None;
    }

    SymbolGeometry::from_finder_centers(tl, tr, bl, version).ok()
}

/// Order three centers as (top-left, top-right, bottom-left)
fn order_finders(points: [Point; 3], max_cosine: f32) -> Option<(Point, Point, Point)> {
    let corner_cosine = |i: usize| {
        let a = points[i];
        let v1 = a.to(&points[(i + 1) % 3]);
        let v2 = a.to(&points[(i + 2) % 3]);
        let denom = v1.norm() * v2.norm();
        if denom <= f32::EPSILON {
            f32::INFINITY
        } else {
            (v1.dot(&v2) / denom).abs()
        }
    };

    let corner = (0..3).min_by(|&a, &b| corner_cosine(a).total_cmp(&corner_cosine(b)))?;
    if corner_cosine(corner) >= max_cosine {
        return None;
    }

    let tl = points[corner];
    let p1 = points[(corner + 1) % 3];
    let p2 = points[(corner + 2) % 3];
    // Image y grows downward, so TL->TR x TL->BL is positive
    if tl.to(&p1).cross(&tl.to(&p2)) > 0.0 {
        Some((tl, p1, p2))
    } else {
        Some((tl, p2, p1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f32, y: f32, module: f32) -> FinderCandidate {
        FinderCandidate::new(x, y, module)
    }

    #[test]
    fn test_too_few_candidates() {
        let two = [candidate(20.0, 20.0, 4.0), candidate(120.0, 20.0, 4.0)];
        assert_eq!(resolve(&two), Err(FailureReason::InsufficientPatterns));
        assert_eq!(resolve(&[]), Err(FailureReason::InsufficientPatterns));
    }

    #[test]
    fn test_upright_triple() {
        // 21x21 at 4px: finder centers 14 modules apart
        let found = [
            candidate(30.0, 30.0, 4.0),
            candidate(86.0, 30.0, 4.0),
            candidate(30.0, 86.0, 4.0),
        ];
        let g = resolve(&found).unwrap();
        assert_eq!(g.dimension(), 21);
        assert!((g.module_size() - 4.0).abs() < 1e-3);
        assert!(g.rotation().abs() < 1e-3);
        assert!(g.corners()[0].distance(&Point::new(16.0, 16.0)) < 1e-3);
        assert!(g.corners()[2].distance(&Point::new(100.0, 100.0)) < 1e-3);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let a = candidate(30.0, 30.0, 4.0);
        let b = candidate(86.0, 30.0, 4.0);
        let c = candidate(30.0, 86.0, 4.0);
        let g1 = resolve(&[a, b, c]).unwrap();
        let g2 = resolve(&[c, a, b]).unwrap();
        assert_eq!(g1.finders(), g2.finders());
    }

    #[test]
    fn test_quarter_turn_assigns_corners() {
        // Symbol rotated 90 degrees clockwise: TL now top-right of image
        let found = [
            candidate(86.0, 30.0, 4.0),
            candidate(86.0, 86.0, 4.0),
            candidate(30.0, 30.0, 4.0),
        ];
        let g = resolve(&found).unwrap();
        assert_eq!(g.finders()[0], Point::new(86.0, 30.0));
        assert_eq!(g.finders()[1], Point::new(86.0, 86.0));
        assert_eq!(g.finders()[2], Point::new(30.0, 30.0));
        assert!((g.rotation() - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn test_module_width_disagreement() {
        let found = [
            candidate(20.0, 20.0, 4.0),
            candidate(120.0, 20.0, 4.0),
            candidate(20.0, 120.0, 5.2),
        ];
        assert_eq!(resolve(&found), Err(FailureReason::IncoherentGeometry));
    }

    #[test]
    fn test_collinear_triple() {
        let found = [
            candidate(20.0, 20.0, 4.0),
            candidate(80.0, 20.0, 4.0),
            candidate(140.0, 20.0, 4.0),
        ];
        assert_eq!(resolve(&found), Err(FailureReason::IncoherentGeometry));
    }

    #[test]
    fn test_too_large_symbol() {
        // spacing implies version > 8
        let found = [
            candidate(20.0, 20.0, 2.0),
            candidate(220.0, 20.0, 2.0),
            candidate(20.0, 220.0, 2.0),
        ];
        assert_eq!(resolve(&found), Err(FailureReason::IncoherentGeometry));
    }

    #[test]
    fn test_spurious_candidate_skipped() {
        let strong = |x, y| {
            let mut c = candidate(x, y, 4.0);
            c.score = 10.0;
            c
        };
        let found = [
            strong(30.0, 30.0),
            candidate(60.0, 64.0, 4.0),
            strong(86.0, 30.0),
            strong(30.0, 86.0),
        ];
        let g = resolve(&found).unwrap();
        assert_eq!(g.dimension(), 21);
    }
}
