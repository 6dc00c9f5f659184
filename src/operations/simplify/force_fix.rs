use crate::math::polygon_2d::try_edge;
use crate::math::Point3;

/// Drops every point that starts an unbuildable edge (zero length or
/// non-finite), closing pair included, until a pass removes nothing or fewer
/// than 3 points remain.
#[must_use]
pub fn force_to_fix(points: &[Point3]) -> Vec<Point3> {
    let mut current = points.to_vec();
    loop {
        let fixed = fixed_once(&current);
        if fixed.len() == current.len() {
            return current;
        }
        current = fixed;
        if current.len() < 3 {
            return current;
        }
    }
}

/// One pass: keep `p[i]` only if `p[i] -> p[i + 1]` (wrapping) is buildable.
fn fixed_once(points: &[Point3]) -> Vec<Point3> {
    let n = points.len();
    (0..n)
        .filter(|&i| try_edge(&points[i], &points[(i + 1) % n]).is_some())
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn clean_polygon_is_unchanged() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)];
        assert_eq!(force_to_fix(&pts), pts);
    }

    #[test]
    fn repeated_point_is_dropped() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let out = force_to_fix(&pts);
        assert_eq!(out, vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
    }

    #[test]
    fn closing_duplicate_is_dropped() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        assert_eq!(force_to_fix(&pts), vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
    }

    #[test]
    fn nan_point_is_dropped() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(f64::NAN, 0.5), p(1.0, 1.0), p(0.0, 1.0)];
        let out = force_to_fix(&pts);
        assert!(out.iter().all(|q| q.x.is_finite()));
        assert!(out.len() < pts.len());
    }

    #[test]
    fn never_grows_and_is_idempotent() {
        let pts = vec![
            p(0.0, 0.0),
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
        ];
        let once = force_to_fix(&pts);
        assert!(once.len() <= pts.len());
        assert_eq!(force_to_fix(&once), once);
    }

    #[test]
    fn collapses_below_three() {
        let pts = vec![p(0.0, 0.0), p(0.0, 0.0), p(0.0, 0.0)];
        assert!(force_to_fix(&pts).len() < 3);
    }
}
