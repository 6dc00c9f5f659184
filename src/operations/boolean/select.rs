/// Boolean operation applied to the subject and clip sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    Intersect,
    Union,
    Difference,
    Xor,
}

/// Rule turning a winding number into inside/outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
    Positive,
}

impl FillRule {
    #[must_use]
    pub fn is_inside(self, winding: i64) -> bool {
        match self {
            Self::EvenOdd => winding % 2 != 0,
            Self::NonZero => winding != 0,
            Self::Positive => winding > 0,
        }
    }
}

impl ClipOp {
    #[must_use]
    pub fn combine(self, in_subject: bool, in_clip: bool) -> bool {
        match self {
            Self::Intersect => in_subject && in_clip,
            Self::Union => in_subject || in_clip,
            Self::Difference => in_subject && !in_clip,
            Self::Xor => in_subject != in_clip,
        }
    }
}

/// Winding numbers of both operands on either side of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideWindings {
    pub left: [i64; 2],
    pub right: [i64; 2],
}

/// What to do with a fragment after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentAction {
    /// Boundary with the result on its left: keep as `lo -> hi`.
    Keep,
    /// Boundary with the result on its right: keep as `hi -> lo`.
    KeepFlipped,
    /// Not a boundary of the result.
    Discard,
}

/// Decides whether a fragment bounds the result of `op`.
#[must_use]
pub fn select_fragment(op: ClipOp, fill: FillRule, sides: SideWindings) -> FragmentAction {
    let inside = |w: [i64; 2]| op.combine(fill.is_inside(w[0]), fill.is_inside(w[1]));
    match (inside(sides.left), inside(sides.right)) {
        (true, false) => FragmentAction::Keep,
        (false, true) => FragmentAction::KeepFlipped,
        _ => FragmentAction::Discard,
    }
}
