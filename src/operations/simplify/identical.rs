use std::collections::HashSet;

use crate::math::polygon_2d::planar_key;
use crate::math::Point3;

/// Drops points whose planar coordinates exactly repeat an earlier point.
///
/// First occurrence wins. Returns the kept points and the number removed.
#[must_use]
pub fn remove_identical_points(points: &[Point3]) -> (Vec<Point3>, usize) {
    let mut seen = HashSet::with_capacity(points.len());
    let kept: Vec<Point3> = points
        .iter()
        .filter(|p| seen.insert(planar_key(p)))
        .copied()
        .collect();
    let removed = points.len() - kept.len();
    (kept, removed)
}

/// Number of points that exactly repeat an earlier point.
#[must_use]
pub fn count_identical_points(points: &[Point3]) -> usize {
    let mut seen = HashSet::with_capacity(points.len());
    points.iter().filter(|p| !seen.insert(planar_key(p))).count()
}
