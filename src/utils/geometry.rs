//! Projective mapping between symbol (module) space and image space.

use crate::models::Point;

/// 3x3 homography with `h33 = 1`
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveTransform {
    h: [f64; 8],
}

impl PerspectiveTransform {
    /// Transform mapping each `src[i]` onto `dst[i]`.
    ///
    /// Returns `None` when the correspondences are degenerate (three or more
    /// collinear points).
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        let mut a = [[0.0f64; 9]; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);
            a[2 * i] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy, dx];
            a[2 * i + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy, dy];
        }

        solve(a).map(|h| Self { h })
    }

    /// Map a point through the transform
    pub fn transform(&self, p: &Point) -> Point {
        let (x, y) = (p.x as f64, p.y as f64);
        let h = &self.h;
        let w = h[6] * x + h[7] * y + 1.0;
        if w.abs() < 1e-12 {
            return Point::new(f32::NAN, f32::NAN);
        }
        Point::new(
            ((h[0] * x + h[1] * y + h[2]) / w) as f32,
            ((h[3] * x + h[4] * y + h[5]) / w) as f32,
        )
    }
}

/// Gauss-Jordan elimination with partial pivoting on an 8x9 augmented matrix
#[allow(clippy::needless_range_loop)]
fn solve(mut a: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8).max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);

        let inv = 1.0 / a[col][col];
        for j in col..9 {
            a[col][j] *= inv;
        }
        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..9 {
                a[row][j] -= factor * a[col][j];
            }
        }
    }

    let mut h = [0.0f64; 8];
    for i in 0..8 {
        h[i] = a[i][8];
    }
    Some(h)
}

/// True when the quadrilateral (in order) is convex with non-zero area
pub fn is_convex_quad(corners: &[Point; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = a.to(&b).cross(&b.to(&c));
        if !cross.is_finite() || cross.abs() < 1e-3 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f32) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn test_scaling_transform() {
        let t = PerspectiveTransform::from_points(&square(100.0), &square(50.0)).unwrap();
        let p = t.transform(&Point::new(50.0, 50.0));
        assert!((p.x - 25.0).abs() < 1e-3 && (p.y - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_maps_corners_exactly() {
        let dst = [
            Point::new(10.0, 12.0),
            Point::new(90.0, 5.0),
            Point::new(95.0, 88.0),
            Point::new(8.0, 80.0),
        ];
        let t = PerspectiveTransform::from_points(&square(21.0), &dst).unwrap();
        for (s, d) in square(21.0).iter().zip(dst.iter()) {
            let p = t.transform(s);
            assert!(p.distance(d) < 1e-3, "{:?} -> {:?}, want {:?}", s, p, d);
        }
    }

    #[test]
    fn test_degenerate_points() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!(PerspectiveTransform::from_points(&square(1.0), &line).is_none());
    }

    #[test]
    fn test_convexity() {
        assert!(is_convex_quad(&square(10.0)));
        let bowtie = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        assert!(!is_convex_quad(&bowtie));
        assert!(!is_convex_quad(&[Point::default(); 4]));
    }
}
