use crate::math::IntPoint;

use super::assemble::assemble_rings;
use super::classify::{classify_fragment, WindingIndex};
use super::select::{select_fragment, ClipOp, FillRule, FragmentAction};
use super::split::{collect_segments, split_into_fragments, Operand};

/// Executes a boolean operation on two integer path sets.
///
/// Orchestrates the full pipeline: edge splitting, winding classification,
/// fragment selection and ring assembly. Result rings have their interior
/// on the left, so outer boundaries are counter-clockwise and holes are
/// clockwise.
#[must_use]
pub fn boolean_execute(
    subject: &[Vec<IntPoint>],
    clip: &[Vec<IntPoint>],
    op: ClipOp,
    fill: FillRule,
) -> Vec<Vec<IntPoint>> {
    // Step 1: bounding-box early-out
    if op == ClipOp::Intersect {
        match (int_bounds(subject), int_bounds(clip)) {
            (Some(a), Some(b)) if bounds_overlap(a, b) => {}
            _ => return Vec::new(),
        }
    }

    // Step 2: collect edges of both operands
    let mut segments = collect_segments(subject, Operand::Subject);
    segments.extend(collect_segments(clip, Operand::Clip));
    if segments.is_empty() {
        return Vec::new();
    }

    // Step 3: split at every intersection
    let fragments = split_into_fragments(&segments);
    let index = WindingIndex::new(&fragments);

    // Step 4: classify and select
    let mut boundary = Vec::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if fragment.net == [0, 0] {
            continue;
        }
        let sides = classify_fragment(&fragments, &index, i);
        match select_fragment(op, fill, sides) {
            FragmentAction::Keep => boundary.push((fragment.lo, fragment.hi)),
            FragmentAction::KeepFlipped => boundary.push((fragment.hi, fragment.lo)),
            FragmentAction::Discard => {}
        }
    }

    // Step 5: assemble rings
    assemble_rings(&boundary)
}

type IntBounds = (IntPoint, IntPoint);

fn int_bounds(paths: &[Vec<IntPoint>]) -> Option<IntBounds> {
    let mut points = paths.iter().flatten();
    let first = *points.next()?;
    Some(points.fold((first, first), |(lo, hi), p| {
        (
            IntPoint::new(lo.x.min(p.x), lo.y.min(p.y)),
            IntPoint::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    }))
}

fn bounds_overlap(a: IntBounds, b: IntBounds) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}
