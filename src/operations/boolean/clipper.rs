use crate::math::IntPoint;
use crate::operations::offset::PolygonOffset;

use super::assemble::twice_area;
use super::engine::boolean_execute;
use super::select::{ClipOp, FillRule};
use super::split::cross;

/// A closed integer ring. The closing edge is implicit.
pub type IntPath = Vec<IntPoint>;

/// A counter-clockwise outer ring with the clockwise holes directly inside
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingGroup {
    pub outer: IntPath,
    pub holes: Vec<IntPath>,
}

/// Boolean set operations and offsets over integer ring sets.
///
/// Every operation reads its operands under the configured fill rule
/// (even-odd by default) and returns rings with outer boundaries
/// counter-clockwise and holes clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonClipper {
    fill: FillRule,
    miter_limit: f64,
}

impl Default for PolygonClipper {
    fn default() -> Self {
        Self {
            fill: FillRule::EvenOdd,
            miter_limit: crate::operations::offset::DEFAULT_MITER_LIMIT,
        }
    }
}

impl PolygonClipper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fill_rule(mut self, fill: FillRule) -> Self {
        self.fill = fill;
        self
    }

    #[must_use]
    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    #[must_use]
    pub fn fill_rule(&self) -> FillRule {
        self.fill
    }

    /// Resolves a single set against itself. Under even-odd filling,
    /// overlapping areas cancel and the result is a set of simple rings.
    #[must_use]
    pub fn union_xor(&self, sets: &[IntPath]) -> Vec<IntPath> {
        boolean_execute(sets, &[], ClipOp::Xor, self.fill)
    }

    #[must_use]
    pub fn intersect(&self, subject: &[IntPath], clip: &[IntPath]) -> Vec<IntPath> {
        boolean_execute(subject, clip, ClipOp::Intersect, self.fill)
    }

    #[must_use]
    pub fn union(&self, subject: &[IntPath], clip: &[IntPath]) -> Vec<IntPath> {
        boolean_execute(subject, clip, ClipOp::Union, self.fill)
    }

    #[must_use]
    pub fn difference(&self, subject: &[IntPath], clip: &[IntPath]) -> Vec<IntPath> {
        boolean_execute(subject, clip, ClipOp::Difference, self.fill)
    }

    #[must_use]
    pub fn xor(&self, subject: &[IntPath], clip: &[IntPath]) -> Vec<IntPath> {
        boolean_execute(subject, clip, ClipOp::Xor, self.fill)
    }

    /// Grows (`delta > 0`) or shrinks (`delta < 0`) the area covered by
    /// `sets` using miter joins.
    #[must_use]
    pub fn offset(&self, sets: &[IntPath], delta: f64) -> Vec<IntPath> {
        PolygonOffset::new(delta)
            .with_miter_limit(self.miter_limit)
            .execute(sets)
    }

    /// Pairs every clockwise ring with the smallest counter-clockwise ring
    /// containing it. Holes that no outer ring contains are returned
    /// separately.
    #[must_use]
    pub fn nest_holes(rings: Vec<IntPath>) -> (Vec<RingGroup>, Vec<IntPath>) {
        let (outers, holes): (Vec<IntPath>, Vec<IntPath>) =
            rings.into_iter().partition(|ring| twice_area(ring) > 0);
        let mut groups: Vec<RingGroup> = outers
            .into_iter()
            .map(|outer| RingGroup {
                outer,
                holes: Vec::new(),
            })
            .collect();

        let mut orphans = Vec::new();
        for hole in holes {
            let container = groups
                .iter()
                .enumerate()
                .filter(|(_, group)| ring_contains_ring(&group.outer, &hole))
                .min_by_key(|(_, group)| twice_area(&group.outer))
                .map(|(i, _)| i);
            match container {
                Some(i) => groups[i].holes.push(hole),
                None => orphans.push(hole),
            }
        }
        (groups, orphans)
    }

    /// The four corners of an axis-aligned rectangle as a counter-clockwise
    /// ring.
    #[must_use]
    pub fn rectangle(min: IntPoint, max: IntPoint) -> IntPath {
        vec![
            min,
            IntPoint::new(max.x, min.y),
            max,
            IntPoint::new(min.x, max.y),
        ]
    }
}

/// Decided by the first vertex of `inner` that is off the boundary of
/// `outer`.
fn ring_contains_ring(outer: &[IntPoint], inner: &[IntPoint]) -> bool {
    inner
        .iter()
        .find_map(|&p| point_in_ring(p, outer))
        .unwrap_or(false)
}

/// Exact even-odd point-in-ring test, `None` on the boundary.
fn point_in_ring(p: IntPoint, ring: &[IntPoint]) -> Option<bool> {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let side = cross(
            i128::from(b.x - a.x),
            i128::from(b.y - a.y),
            i128::from(p.x - a.x),
            i128::from(p.y - a.y),
        );
        let within_x = a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x);
        let within_y = a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y);
        if side == 0 && within_x && within_y {
            return None;
        }
        // The edge crosses the horizontal through `p` to its right.
        if (a.y > p.y) != (b.y > p.y) && (side > 0) == (b.y > a.y) {
            inside = !inside;
        }
    }
    Some(inside)
}
