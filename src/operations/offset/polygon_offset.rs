use crate::math::IntPoint;
use crate::operations::boolean::{boolean_execute, ClipOp, FillRule};

/// Default miter limit as a multiple of `|delta|`. Joins whose miter would
/// reach further than this are bevelled.
pub const DEFAULT_MITER_LIMIT: f64 = 2.0;

/// Offsets integer polygon sets by a signed distance with mitered joins.
///
/// Positive `delta` grows the filled area, negative shrinks it. Input
/// orientation does not matter: the paths are first resolved under the
/// even-odd rule, so holes shrink when the region grows and vice versa.
/// Each ring is then offset independently and the raw rings are merged
/// under the positive fill rule, which removes the loops that appear where
/// an offset ring folds over itself.
#[derive(Debug, Clone)]
pub struct PolygonOffset {
    delta: f64,
    miter_limit: f64,
}

impl PolygonOffset {
    /// Creates an offset by `delta` with [`DEFAULT_MITER_LIMIT`].
    #[must_use]
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }

    /// Overrides the miter limit. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit.max(1.0);
        self
    }

    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Offsets `paths`, returning outer rings counter-clockwise and holes
    /// clockwise.
    #[must_use]
    pub fn execute(&self, paths: &[Vec<IntPoint>]) -> Vec<Vec<IntPoint>> {
        let normalized = boolean_execute(paths, &[], ClipOp::Xor, FillRule::EvenOdd);
        if self.delta.abs() < 0.5 || normalized.is_empty() {
            return normalized;
        }
        let raw: Vec<Vec<IntPoint>> = normalized
            .iter()
            .map(|ring| self.offset_ring(ring))
            .filter(|ring| ring.len() >= 3)
            .collect();
        boolean_execute(&raw, &[], ClipOp::Union, FillRule::Positive)
    }

    /// Raw offset of one ring. The result may self-intersect.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn offset_ring(&self, ring: &[IntPoint]) -> Vec<IntPoint> {
        let n = ring.len();
        let normals: Vec<(f64, f64)> =
            (0..n).map(|i| unit_normal(ring[i], ring[(i + 1) % n])).collect();
        let delta = self.delta;
        // 1 + cos of the join angle below which a miter is replaced by a bevel.
        let bevel_below = 2.0 / (self.miter_limit * self.miter_limit);

        let mut out = Vec::with_capacity(n * 2);
        let mut push = |x: f64, y: f64| {
            let p = IntPoint::new(x.round() as i64, y.round() as i64);
            if out.last() != Some(&p) {
                out.push(p);
            }
        };

        for i in 0..n {
            let (px, py) = (ring[i].x as f64, ring[i].y as f64);
            let k = normals[(i + n - 1) % n];
            let j = normals[i];
            let sin = k.0 * j.1 - j.0 * k.1;
            let cos = k.0 * j.0 + k.1 * j.1;

            if (sin * delta).abs() < 1.0 && cos > 0.0 {
                // Nearly straight: a single point suffices.
                push(px + k.0 * delta, py + k.1 * delta);
            } else if sin * delta < 0.0 {
                push(px + k.0 * delta, py + k.1 * delta);
                push(px, py);
                push(px + j.0 * delta, py + j.1 * delta);
            } else {
                let r = 1.0 + cos;
                if r >= bevel_below {
                    let q = delta / r;
                    push(px + (k.0 + j.0) * q, py + (k.1 + j.1) * q);
                } else {
                    push(px + k.0 * delta, py + k.1 * delta);
                    push(px + j.0 * delta, py + j.1 * delta);
                }
            }
        }
        if out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        out
    }
}

/// Right-hand unit normal of `a -> b`, which points outward on a
/// counter-clockwise ring.
#[allow(clippy::cast_precision_loss)]
fn unit_normal(a: IntPoint, b: IntPoint) -> (f64, f64) {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (0.0, 0.0);
    }
    (dy / length, -dx / length)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::twice_area;

    fn ip(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<IntPoint> {
        vec![ip(x0, y0), ip(x1, y0), ip(x1, y1), ip(x0, y1)]
    }

    fn bounds(ring: &[IntPoint]) -> (i64, i64, i64, i64) {
        let xs = ring.iter().map(|p| p.x);
        let ys = ring.iter().map(|p| p.y);
        (
            xs.clone().min().unwrap_or(0),
            ys.clone().min().unwrap_or(0),
            xs.max().unwrap_or(0),
            ys.max().unwrap_or(0),
        )
    }

    #[test]
    fn square_grows_with_sharp_corners() {
        let out = PolygonOffset::new(10.0).execute(&[rect(0, 0, 100, 100)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
        assert_eq!(bounds(&out[0]), (-10, -10, 110, 110));
        assert_eq!(twice_area(&out[0]), 2 * 120 * 120);
    }

    #[test]
    fn square_shrinks() {
        let out = PolygonOffset::new(-10.0).execute(&[rect(0, 0, 100, 100)]);
        assert_eq!(out.len(), 1);
        assert_eq!(bounds(&out[0]), (10, 10, 90, 90));
    }

    #[test]
    fn clockwise_input_behaves_like_counter_clockwise() {
        let mut ring = rect(0, 0, 100, 100);
        ring.reverse();
        let out = PolygonOffset::new(5.0).execute(&[ring]);
        assert_eq!(bounds(&out[0]), (-5, -5, 105, 105));
        assert!(twice_area(&out[0]) > 0);
    }

    #[test]
    fn thin_region_vanishes_under_erosion() {
        let out = PolygonOffset::new(-10.0).execute(&[rect(0, 0, 100, 15)]);
        assert!(out.is_empty());
    }

    #[test]
    fn hole_shrinks_when_region_grows() {
        let paths = vec![rect(0, 0, 100, 100), rect(40, 40, 60, 60)];
        let out = PolygonOffset::new(5.0).execute(&paths);
        assert_eq!(out.len(), 2);
        let hole = out.iter().find(|r| twice_area(r) < 0).unwrap();
        assert_eq!(bounds(hole), (45, 45, 55, 55));
    }

    #[test]
    fn hole_closes_under_large_dilation() {
        let paths = vec![rect(0, 0, 100, 100), rect(40, 40, 60, 60)];
        let out = PolygonOffset::new(15.0).execute(&paths);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn concave_corner_is_filled_by_union() {
        let l_shape = vec![ip(0, 0), ip(100, 0), ip(100, 50), ip(50, 50), ip(50, 100), ip(0, 100)];
        let out = PolygonOffset::new(10.0).execute(&[l_shape]);
        assert_eq!(out.len(), 1);
        assert_eq!(bounds(&out[0]), (-10, -10, 110, 110));
        assert_eq!(out[0].len(), 6);
    }

    #[test]
    fn zero_delta_only_normalizes() {
        let mut ring = rect(0, 0, 10, 10);
        ring.reverse();
        let out = PolygonOffset::new(0.0).execute(&[ring]);
        assert_eq!(out.len(), 1);
        assert_eq!(bounds(&out[0]), (0, 0, 10, 10));
        assert_eq!(twice_area(&out[0]), 200);
    }

    #[test]
    fn miter_limit_bevels_spikes() {
        let spike = vec![ip(0, 0), ip(100, 0), ip(50, 10)];
        let out = PolygonOffset::new(5.0).with_miter_limit(2.0).execute(&[spike]);
        let (x0, _, x1, _) = bounds(&out[0]);
        assert!(x0 > -20 && x1 < 120);
    }
}
