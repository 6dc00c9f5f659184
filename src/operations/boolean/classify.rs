use super::select::SideWindings;
use super::split::{cross, Fragment};

/// Horizontal bands over the fragment set, used to restrict ray queries to
/// fragments spanning the query height.
///
/// All coordinates here are doubled so fragment midpoints stay integral.
pub struct WindingIndex {
    y0: i128,
    span: i128,
    bands: Vec<Vec<usize>>,
}

impl WindingIndex {
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn new(fragments: &[Fragment]) -> Self {
        let active: Vec<usize> = (0..fragments.len())
            .filter(|&i| fragments[i].net != [0, 0])
            .collect();
        let (mut y0, mut y1) = (i128::MAX, i128::MIN);
        for &i in &active {
            let (lo, hi) = doubled_y_range(&fragments[i]);
            y0 = y0.min(lo);
            y1 = y1.max(hi);
        }
        if active.is_empty() {
            return Self { y0: 0, span: 1, bands: vec![Vec::new()] };
        }

        let count = ((active.len() as f64).sqrt() as usize).clamp(1, 1024);
        let mut index = Self {
            y0,
            span: y1 - y0 + 1,
            bands: vec![Vec::new(); count],
        };
        for i in active {
            let (lo, hi) = doubled_y_range(&fragments[i]);
            for band in index.band_of(lo)..=index.band_of(hi) {
                index.bands[band].push(i);
            }
        }
        index
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn band_of(&self, y: i128) -> usize {
        let count = self.bands.len() as i128;
        ((y - self.y0).clamp(0, self.span - 1) * count / self.span) as usize
    }

    fn candidates(&self, y: i128) -> &[usize] {
        &self.bands[self.band_of(y)]
    }
}

fn doubled_y_range(f: &Fragment) -> (i128, i128) {
    let (a, b) = (2 * i128::from(f.lo.y), 2 * i128::from(f.hi.y));
    (a.min(b), a.max(b))
}

/// Winding numbers of both operands immediately left and right of fragment
/// `target`.
///
/// A ray is cast in `+x` from the fragment midpoint. Vertices on the ray
/// count as lying just below it, so the sampled point sits on the `+x` side
/// of a non-horizontal fragment and on the `+y` side of a horizontal one.
#[must_use]
pub fn classify_fragment(
    fragments: &[Fragment],
    index: &WindingIndex,
    target: usize,
) -> SideWindings {
    let f = &fragments[target];
    let mx = i128::from(f.lo.x) + i128::from(f.hi.x);
    let my = i128::from(f.lo.y) + i128::from(f.hi.y);

    let mut sampled = [0i64; 2];
    for &i in index.candidates(my) {
        if i == target {
            continue;
        }
        let g = &fragments[i];
        let crossing = ray_crossing(g, mx, my);
        if crossing != 0 {
            sampled[0] += crossing * g.net[0];
            sampled[1] += crossing * g.net[1];
        }
    }

    let dx = f.hi.x - f.lo.x;
    let dy = f.hi.y - f.lo.y;
    let sampled_is_left = if dy == 0 { dx > 0 } else { dy < 0 };

    let other = |k: usize| {
        if sampled_is_left {
            sampled[k] - f.net[k]
        } else {
            sampled[k] + f.net[k]
        }
    };
    let opposite = [other(0), other(1)];
    if sampled_is_left {
        SideWindings { left: sampled, right: opposite }
    } else {
        SideWindings { left: opposite, right: sampled }
    }
}

/// Signed crossing of the directed fragment `lo -> hi` with the `+x` ray
/// from `(mx, my)` in doubled coordinates.
fn ray_crossing(g: &Fragment, mx: i128, my: i128) -> i64 {
    let (ax, ay) = (2 * i128::from(g.lo.x), 2 * i128::from(g.lo.y));
    let (bx, by) = (2 * i128::from(g.hi.x), 2 * i128::from(g.hi.y));
    let side = cross(bx - ax, by - ay, mx - ax, my - ay);
    if ay <= my {
        if by > my && side > 0 {
            return 1;
        }
    } else if by <= my && side < 0 {
        return -1;
    }
    0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::IntPoint;
    use crate::operations::boolean::split::{collect_segments, split_into_fragments, Operand};

    fn ip(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn square_fragments() -> Vec<Fragment> {
        let ring = vec![ip(0, 0), ip(10, 0), ip(10, 10), ip(0, 10)];
        split_into_fragments(&collect_segments(&[ring], Operand::Subject))
    }

    fn find(fragments: &[Fragment], lo: IntPoint, hi: IntPoint) -> usize {
        fragments
            .iter()
            .position(|f| f.lo == lo && f.hi == hi)
            .unwrap()
    }

    #[test]
    fn ccw_square_has_interior_on_the_left() {
        let fragments = square_fragments();
        let index = WindingIndex::new(&fragments);

        // Bottom edge runs lo -> hi counter-clockwise.
        let bottom = find(&fragments, ip(0, 0), ip(10, 0));
        let w = classify_fragment(&fragments, &index, bottom);
        assert_eq!(w.left[0], 1);
        assert_eq!(w.right[0], 0);

        // Left edge runs (0,0) -> (0,10) in canonical order, clockwise.
        let left = find(&fragments, ip(0, 0), ip(0, 10));
        let w = classify_fragment(&fragments, &index, left);
        assert_eq!(w.left[0], 0);
        assert_eq!(w.right[0], 1);

        let right = find(&fragments, ip(10, 0), ip(10, 10));
        let w = classify_fragment(&fragments, &index, right);
        assert_eq!(w.left[0], 1);
        assert_eq!(w.right[0], 0);

        let top = find(&fragments, ip(0, 10), ip(10, 10));
        let w = classify_fragment(&fragments, &index, top);
        assert_eq!(w.left[0], 0);
        assert_eq!(w.right[0], 1);
    }

    #[test]
    fn nested_squares_accumulate_winding() {
        let outer = vec![ip(0, 0), ip(10, 0), ip(10, 10), ip(0, 10)];
        let inner = vec![ip(2, 2), ip(8, 2), ip(8, 8), ip(2, 8)];
        let fragments = split_into_fragments(&collect_segments(&[outer, inner], Operand::Subject));
        let index = WindingIndex::new(&fragments);
        let inner_bottom = find(&fragments, ip(2, 2), ip(8, 2));
        let w = classify_fragment(&fragments, &index, inner_bottom);
        assert_eq!(w.left[0], 2);
        assert_eq!(w.right[0], 1);
    }

    #[test]
    fn clip_operand_is_tracked_separately() {
        let subject = vec![ip(0, 0), ip(10, 0), ip(10, 10), ip(0, 10)];
        let clip = vec![ip(5, 2), ip(20, 2), ip(20, 8), ip(5, 8)];
        let mut segments = collect_segments(&[subject], Operand::Subject);
        segments.extend(collect_segments(&[clip], Operand::Clip));
        let fragments = split_into_fragments(&segments);
        let index = WindingIndex::new(&fragments);
        let clip_left_edge = find(&fragments, ip(5, 2), ip(5, 8));
        let w = classify_fragment(&fragments, &index, clip_left_edge);
        // Inside the subject on both sides, inside the clip only on +x.
        assert_eq!(w.left, [1, 0]);
        assert_eq!(w.right, [1, 1]);
    }
}
