use crate::math::{Point3, TOLERANCE};

use super::proximity::remove_close_points;

/// Proximity tolerance re-applied after every collinear removal.
pub const COLLINEAR_MERGE_TOLERANCE: f64 = 0.2;

/// Outcome of [`remove_collinearity`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollinearPurge {
    pub points: Vec<Point3>,
    /// Number of successful removal rounds.
    pub iterations: usize,
}

/// Removes interior points whose incoming and outgoing edges are parallel
/// within `angle_tolerance` (radians), one point at a time.
///
/// After every removal the sequence is re-merged at
/// [`COLLINEAR_MERGE_TOLERANCE`] and the scan restarts. Each round strictly
/// shrinks the sequence, so the loop runs at most `points.len()` times.
#[must_use]
pub fn remove_collinearity(points: &[Point3], angle_tolerance: f64) -> CollinearPurge {
    let cos_tolerance = angle_tolerance.cos();
    let mut current = points.to_vec();
    let mut iterations = 0;

    while current.len() >= 3 {
        let Some(index) = first_collinear_index(&current, cos_tolerance) else {
            break;
        };
        let before = current.len();
        current.remove(index);
        current = remove_close_points(&current, COLLINEAR_MERGE_TOLERANCE);
        debug_assert!(current.len() < before);
        iterations += 1;
    }

    CollinearPurge {
        points: current,
        iterations,
    }
}

/// First interior index that is collinear with its neighbours.
fn first_collinear_index(points: &[Point3], cos_tolerance: f64) -> Option<usize> {
    (1..points.len().saturating_sub(1)).find(|&i| is_collinear_at(points, i, cos_tolerance))
}

/// Whether the interior point `i` can be removed without changing the shape
/// beyond the angular tolerance. Endpoints are never candidates.
pub(crate) fn is_collinear_at(points: &[Point3], i: usize, cos_tolerance: f64) -> bool {
    if i == 0 || i + 1 >= points.len() {
        return false;
    }
    let incoming = points[i] - points[i - 1];
    let outgoing = points[i + 1] - points[i];
    let (len_in, len_out) = (incoming.norm(), outgoing.norm());
    if len_in < TOLERANCE || len_out < TOLERANCE {
        return true;
    }
    let cosine = (incoming.dot(&outgoing) / (len_in * len_out)).abs();
    cosine >= cos_tolerance
}
