/// Finder pattern detection using 1:1:3:1:1 run-ratio scanning with a
/// vertical cross-check
use crate::config::LocatorConfig;
use crate::models::{BinaryGrid, Point};
use tracing::trace;

/// Smallest grid (per side) that can hold a 7-module finder at 1px/module
pub const MIN_FINDER_SIZE: usize = 7;

const RATIO: [f32; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

/// A located finder pattern center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderCandidate {
    /// Sub-pixel center
    pub center: Point,
    /// Estimated module width in pixels
    pub module_size: f32,
    /// Quality: scan hits times mean ratio fit
    pub score: f32,
    /// Number of scan lines that confirmed this pattern
    pub hits: usize,
}

impl FinderCandidate {
    /// Candidate from a single confirmed hit with perfect fit
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            score: 1.0,
            hits: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    center: Point,
    module_size: f32,
    fit: f32,
}

#[derive(Debug, Clone, Copy)]
struct Cluster {
    center: Point,
    module_size: f32,
    fit_sum: f32,
    hits: usize,
}

impl Cluster {
    fn absorb(&mut self, center: Point, module_size: f32, fit_sum: f32, hits: usize) {
        let total = (self.hits + hits) as f32;
        let (a, b) = (self.hits as f32 / total, hits as f32 / total);
        self.center = Point::new(
            self.center.x * a + center.x * b,
            self.center.y * a + center.y * b,
        );
        self.module_size = self.module_size * a + module_size * b;
        self.fit_sum += fit_sum;
        self.hits += hits;
    }

    fn into_candidate(self) -> FinderCandidate {
        FinderCandidate {
            center: self.center,
            module_size: self.module_size,
            score: self.fit_sum,
            hits: self.hits,
        }
    }
}

/// Locate finder patterns with default parameters
pub fn locate(grid: &BinaryGrid) -> Vec<FinderCandidate> {
    locate_with(grid, &LocatorConfig::default())
}

/// Locate finder patterns.
///
/// Never fails: an empty vector means no pattern was confirmed. Candidates
/// are ordered by descending score, ties broken by position.
pub fn locate_with(grid: &BinaryGrid, config: &LocatorConfig) -> Vec<FinderCandidate> {
    let (width, height) = (grid.width(), grid.height());
    if width < MIN_FINDER_SIZE || height < MIN_FINDER_SIZE {
        return Vec::new();
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for y in (0..height).step_by(config.row_stride.max(1)) {
        for hit in scan_row(grid, y, config.ratio_tolerance) {
            merge_hit(&mut clusters, hit, config.merge_radius);
        }
    }
    let clusters = consolidate(clusters, config.merge_radius);

    let mut candidates: Vec<FinderCandidate> =
        clusters.into_iter().map(Cluster::into_candidate).collect();
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.center.y.total_cmp(&b.center.y))
            .then(a.center.x.total_cmp(&b.center.x))
    });

    trace!(count = candidates.len(), "finder candidates located");
    candidates
}

/// Runs of equal color along a row as (start, length, dark)
fn row_runs(grid: &BinaryGrid, y: usize) -> Vec<(usize, usize, bool)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut color = grid.get(0, y);
    for x in 1..grid.width() {
        let c = grid.get(x, y);
        if c != color {
            runs.push((start, x - start, color));
            start = x;
            color = c;
        }
    }
    runs.push((start, grid.width() - start, color));
    runs
}

fn scan_row(grid: &BinaryGrid, y: usize, tolerance: f32) -> Vec<Hit> {
    let runs = row_runs(grid, y);
    let mut hits = Vec::new();
    if runs.len() < 5 {
        return hits;
    }

    for window in runs.windows(5) {
        // Runs alternate, so a dark first run fixes the whole D-L-D-L-D shape
        if !window[0].2 {
            continue;
        }
        let lengths = [
            window[0].1,
            window[1].1,
            window[2].1,
            window[3].1,
            window[4].1,
        ];
        let Some(h_fit) = ratio_fit(&lengths, tolerance) else {
            continue;
        };
        let h_total: usize = lengths.iter().sum();
        let (center_start, center_len, _) = window[2];
        let cx = center_start as f32 + center_len as f32 / 2.0;

        let Some((cy, v_total, v_fit)) =
            cross_check_vertical(grid, cx as usize, y, h_total, tolerance)
        else {
            continue;
        };
        // A square marker has similar extents both ways
        let ratio = v_total as f32 / h_total as f32;
        if !(0.5..=2.0).contains(&ratio) {
            continue;
        }

        hits.push(Hit {
            center: Point::new(cx, cy),
            module_size: (h_total + v_total) as f32 / 14.0,
            fit: (h_fit + v_fit) / 2.0,
        });
    }

    hits
}

/// Fit of five runs to 1:1:3:1:1, in (0, 1], or `None` when any run deviates
/// from its expected length by more than `tolerance` (relative)
pub(crate) fn ratio_fit(lengths: &[usize; 5], tolerance: f32) -> Option<f32> {
    let total: usize = lengths.iter().sum();
    if total < MIN_FINDER_SIZE {
        return None;
    }
    let unit = total as f32 / 7.0;

    let mut deviation = 0.0;
    for (&len, &share) in lengths.iter().zip(RATIO.iter()) {
        let expected = unit * share;
        let dev = (len as f32 - expected).abs() / expected;
        if dev > tolerance {
            return None;
        }
        deviation += dev;
    }
    Some(1.0 - deviation / 5.0)
}

/// Confirm the ratio along column `x` through row `y`.
///
/// Returns the vertical center, the total run length and the fit.
fn cross_check_vertical(
    grid: &BinaryGrid,
    x: usize,
    y: usize,
    max_total: usize,
    tolerance: f32,
) -> Option<(f32, usize, f32)> {
    if !grid.get(x, y) {
        return None;
    }
    let height = grid.height();
    let limit = max_total * 2;

    // center run upwards (inclusive of y) and downwards
    let mut top = y;
    while top > 0 && grid.get(x, top - 1) {
        top -= 1;
    }
    let mut bottom = y + 1;
    while bottom < height && grid.get(x, bottom) {
        bottom += 1;
    }
    let center_len = bottom - top;

    let walk_up = |from: usize, dark: bool| -> usize {
        let mut n = 0;
        let mut row = from;
        while row > 0 && grid.get(x, row - 1) == dark && n <= limit {
            row -= 1;
            n += 1;
        }
        n
    };
    let walk_down = |from: usize, dark: bool| -> usize {
        let mut n = 0;
        let mut row = from;
        while row < height && grid.get(x, row) == dark && n <= limit {
            row += 1;
            n += 1;
        }
        n
    };

    let light_up = walk_up(top, false);
    let dark_up = walk_up(top.checked_sub(light_up)?, true);
    let light_down = walk_down(bottom, false);
    let dark_down = walk_down(bottom + light_down, true);

    let lengths = [dark_up, light_up, center_len, light_down, dark_down];
    if lengths.contains(&0) {
        return None;
    }
    let total: usize = lengths.iter().sum();
    if total > limit {
        return None;
    }
    let fit = ratio_fit(&lengths, tolerance)?;
    Some((top as f32 + center_len as f32 / 2.0, total, fit))
}

fn merge_hit(clusters: &mut Vec<Cluster>, hit: Hit, radius: f32) {
    let r2 = radius * radius;
    match clusters
        .iter_mut()
        .find(|c| c.center.distance_squared(&hit.center) < r2)
    {
        Some(cluster) => cluster.absorb(hit.center, hit.module_size, hit.fit, 1),
        None => clusters.push(Cluster {
            center: hit.center,
            module_size: hit.module_size,
            fit_sum: hit.fit,
            hits: 1,
        }),
    }
}

/// Second pass: running means can drift two clusters into each other's radius
fn consolidate(clusters: Vec<Cluster>, radius: f32) -> Vec<Cluster> {
    let r2 = radius * radius;
    let mut merged: Vec<Cluster> = Vec::with_capacity(clusters.len());
    for c in clusters {
        match merged
            .iter_mut()
            .find(|m| m.center.distance_squared(&c.center) < r2)
        {
            Some(m) => m.absorb(c.center, c.module_size, c.fit_sum, c.hits),
            None => merged.push(c),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Draw a 7x7-module finder centered at (cx, cy) with `unit` px modules
    fn draw_finder(grid: &mut BinaryGrid, cx: usize, cy: usize, unit: usize) {
        let half = 7 * unit / 2;
        for dy in 0..7 * unit {
            for dx in 0..7 * unit {
                let (mx, my) = (dx / unit, dy / unit);
                let ring = mx.min(my).min(6 - mx).min(6 - my);
                grid.set(cx - half + dx, cy - half + dy, ring != 1);
            }
        }
    }

    #[test]
    fn test_single_finder_centered() {
        let mut grid = BinaryGrid::new(60, 60);
        draw_finder(&mut grid, 30, 30, 4);
        let found = locate(&grid);
        assert_eq!(found.len(), 1, "got {:?}", found);
        let c = found[0];
        assert!((c.center.x - 30.0).abs() < 1.0 && (c.center.y - 30.0).abs() < 1.0);
        assert!((c.module_size - 4.0).abs() < 0.5);
        assert!(c.hits > 1);
    }

    #[test]
    fn test_horizontal_only_is_rejected() {
        // One row with the right ratio but no vertical support
        let mut grid = BinaryGrid::new(40, 10);
        let runs = [(2, 3, true), (5, 3, false), (8, 9, true), (17, 3, false), (20, 3, true)];
        for (start, len, dark) in runs {
            for x in start..start + len {
                grid.set(x, 5, dark);
            }
        }
        assert!(locate(&grid).is_empty());
    }

    #[test]
    fn test_tiny_grid_short_circuits() {
        let grid = BinaryGrid::from_fn(6, 40, |_, _| true);
        assert!(locate(&grid).is_empty());
    }

    #[test]
    fn test_ratio_fit() {
        assert_eq!(ratio_fit(&[3, 3, 9, 3, 3], 0.5), Some(1.0));
        assert!(ratio_fit(&[1, 1, 3, 1, 1], 0.5).is_some());
        assert!(ratio_fit(&[3, 3, 3, 3, 3], 0.5).is_none());
        assert!(ratio_fit(&[1, 1, 1, 1, 1], 0.5).is_none());
        let loose = ratio_fit(&[4, 3, 9, 3, 3], 0.5).unwrap();
        assert!(loose < 1.0 && loose > 0.5);
    }

    #[test]
    fn test_adjacent_hits_merge_once() {
        let mut grid = BinaryGrid::new(80, 80);
        draw_finder(&mut grid, 40, 40, 5);
        let found = locate(&grid);
        assert_eq!(found.len(), 1);
        // every row through the 3x3 core confirms the same pattern
        assert_eq!(found[0].hits, 15);
    }

    #[test]
    fn test_row_stride_reduces_hits() {
        let mut grid = BinaryGrid::new(80, 80);
        draw_finder(&mut grid, 40, 40, 5);
        let cfg = LocatorConfig {
            row_stride: 3,
            ..LocatorConfig::default()
        };
        let found = locate_with(&grid, &cfg);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].hits, 5);
    }
}
