use crate::math::Point3;

/// Merges points that lie closer than `tolerance` to the last kept point.
///
/// The walk starts at index 0 and repeatedly jumps to the next point that is
/// at least `tolerance` away from the current one, discarding everything in
/// between. The start point itself is only put back (at the front) when the
/// closing gap from the last kept point still exceeds `tolerance`.
///
/// The result is never longer than the input. When every point lies within
/// `tolerance` of the start the result collapses to that single point.
#[must_use]
pub fn remove_close_points(points: &[Point3], tolerance: f64) -> Vec<Point3> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut kept = Vec::with_capacity(n);
    let mut index = 0;
    while index < n {
        index = next_distant_index(points, index, tolerance);
        if index < n {
            kept.push(points[index]);
        }
    }

    match kept.last() {
        None => vec![points[0]],
        Some(last) => {
            if (points[0] - last).norm() > tolerance {
                kept.insert(0, points[0]);
            }
            kept
        }
    }
}

/// Index of the first point after `index` whose distance from
/// `points[index]` is not below `tolerance`, or `points.len()`.
fn next_distant_index(points: &[Point3], index: usize, tolerance: f64) -> usize {
    let mut step = 1;
    while index + step < points.len() {
        let d = (points[index + step] - points[index]).norm();
        if d < tolerance {
            step += 1;
        } else {
            break;
        }
    }
    index + step
}
