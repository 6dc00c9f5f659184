use std::collections::HashMap;

use tracing::{trace, warn};

use crate::math::IntPoint;

/// Which input set a segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Subject,
    Clip,
}

impl Operand {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Subject => 0,
            Self::Clip => 1,
        }
    }
}

/// A directed ring edge tagged with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub a: IntPoint,
    pub b: IntPoint,
    pub operand: Operand,
}

/// A unique undirected piece of the arrangement with `lo < hi`.
///
/// `net[k]` is the signed multiplicity of operand `k` along `lo -> hi`:
/// every input piece running `lo -> hi` adds one, every piece running
/// `hi -> lo` subtracts one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub lo: IntPoint,
    pub hi: IntPoint,
    pub net: [i64; 2],
}

/// Collects the edges of every ring, closing edges included. Zero-length
/// edges are skipped.
#[must_use]
pub fn collect_segments(rings: &[Vec<IntPoint>], operand: Operand) -> Vec<Segment> {
    let mut out = Vec::new();
    for ring in rings {
        let n = ring.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if a != b {
                out.push(Segment { a, b, operand });
            }
        }
    }
    out
}

/// Upper bound on re-splitting rounds. Each round only runs when rounded
/// crossing points made pieces cross again.
const MAX_SPLIT_ROUNDS: usize = 64;

/// Splits every segment at every point where it meets another segment and
/// merges coincident pieces into [`Fragment`]s.
///
/// Crossing points are rounded to the grid, which bends the pieces ending
/// there. A bent piece may cross a segment it missed before, so splitting
/// repeats until no piece crosses another piece's interior.
#[must_use]
pub fn split_into_fragments(segments: &[Segment]) -> Vec<Fragment> {
    let mut pieces = segments.to_vec();
    for round in 1..=MAX_SPLIT_ROUNDS {
        let cuts = find_cuts(&pieces);
        let changed = pieces
            .iter()
            .zip(&cuts)
            .any(|(s, points)| points.iter().any(|&p| p != s.a && p != s.b));
        if !changed {
            break;
        }
        pieces = subdivide(&pieces, cuts);
        if round == MAX_SPLIT_ROUNDS {
            warn!(pieces = pieces.len(), "segment splitting did not settle");
        } else if round > 1 {
            trace!(round, pieces = pieces.len(), "re-split after rounding");
        }
    }
    merge_pieces(&pieces)
}

/// Points where each piece is met by another piece, endpoints included.
fn find_cuts(pieces: &[Segment]) -> Vec<Vec<IntPoint>> {
    let mut cuts: Vec<Vec<IntPoint>> = vec![Vec::new(); pieces.len()];

    // Sweep over x-intervals: only pairs whose x-ranges overlap are tested.
    let mut order: Vec<usize> = (0..pieces.len()).collect();
    order.sort_by_key(|&i| pieces[i].a.x.min(pieces[i].b.x));

    for (pos, &i) in order.iter().enumerate() {
        let si = &pieces[i];
        let max_x = si.a.x.max(si.b.x);
        for &j in &order[pos + 1..] {
            let sj = &pieces[j];
            if sj.a.x.min(sj.b.x) > max_x {
                break;
            }
            if !y_ranges_overlap(si, sj) {
                continue;
            }
            match intersect_segments(si.a, si.b, sj.a, sj.b) {
                Crossing::None => {}
                Crossing::Point(p) => {
                    cuts[i].push(p);
                    cuts[j].push(p);
                }
                Crossing::Overlap => {
                    cuts[i].extend(interior_points(si, &[sj.a, sj.b]));
                    cuts[j].extend(interior_points(sj, &[si.a, si.b]));
                }
            }
        }
    }
    cuts
}

/// Replaces every piece by the chain through its cut points. A rounded cut
/// point may lie slightly off the piece; it is still visited in order of its
/// projection, so the chain always starts at `a` and ends at `b`.
fn subdivide(pieces: &[Segment], cuts: Vec<Vec<IntPoint>>) -> Vec<Segment> {
    let mut out = Vec::with_capacity(pieces.len());
    for (piece, mut points) in pieces.iter().zip(cuts) {
        let (a, b) = (piece.a, piece.b);
        let length_sq = projection(a, b, b);
        points.retain(|&p| p != a && p != b);
        points.sort_by_key(|&p| projection(a, b, p).clamp(0, length_sq));
        points.dedup();

        let mut from = a;
        for to in points.into_iter().chain(std::iter::once(b)) {
            if to != from {
                out.push(Segment {
                    a: from,
                    b: to,
                    operand: piece.operand,
                });
                from = to;
            }
        }
    }
    out
}

/// Merges pieces with the same endpoints, summing their directions per
/// operand.
fn merge_pieces(pieces: &[Segment]) -> Vec<Fragment> {
    let mut merged: HashMap<(IntPoint, IntPoint), [i64; 2]> = HashMap::new();
    for piece in pieces {
        let (key, sign) = if piece.a < piece.b {
            ((piece.a, piece.b), 1)
        } else {
            ((piece.b, piece.a), -1)
        };
        merged.entry(key).or_default()[piece.operand.index()] += sign;
    }

    let mut fragments: Vec<Fragment> = merged
        .into_iter()
        .map(|((lo, hi), net)| Fragment { lo, hi, net })
        .collect();
    fragments.sort_by_key(|f| (f.lo, f.hi));
    fragments
}

fn y_ranges_overlap(s: &Segment, t: &Segment) -> bool {
    s.a.y.min(s.b.y) <= t.a.y.max(t.b.y) && t.a.y.min(t.b.y) <= s.a.y.max(s.b.y)
}

/// Position of `p` along `a -> b`, scaled by `|b - a|`.
fn projection(a: IntPoint, b: IntPoint, p: IntPoint) -> i128 {
    let (dx, dy) = (i128::from(b.x - a.x), i128::from(b.y - a.y));
    i128::from(p.x - a.x) * dx + i128::from(p.y - a.y) * dy
}

/// Points of `candidates` strictly inside the collinear segment `s`.
fn interior_points<'a>(
    s: &'a Segment,
    candidates: &'a [IntPoint],
) -> impl Iterator<Item = IntPoint> + 'a {
    let length_sq = projection(s.a, s.b, s.b);
    candidates.iter().copied().filter(move |&p| {
        let t = projection(s.a, s.b, p);
        t > 0 && t < length_sq
    })
}

pub(crate) fn cross(ax: i128, ay: i128, bx: i128, by: i128) -> i128 {
    ax * by - ay * bx
}

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    None,
    /// A single shared point, rounded to the integer grid.
    Point(IntPoint),
    /// The segments are collinear and share more than a point.
    Overlap,
}

/// Exact segment/segment test on integer coordinates.
///
/// Touching and crossing are detected exactly; the crossing point itself is
/// rounded to the nearest grid point.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn intersect_segments(p1: IntPoint, p2: IntPoint, q1: IntPoint, q2: IntPoint) -> Crossing {
    let (rx, ry) = (i128::from(p2.x - p1.x), i128::from(p2.y - p1.y));
    let (sx, sy) = (i128::from(q2.x - q1.x), i128::from(q2.y - q1.y));
    let (qpx, qpy) = (i128::from(q1.x - p1.x), i128::from(q1.y - p1.y));

    let mut denom = cross(rx, ry, sx, sy);
    if denom == 0 {
        if cross(qpx, qpy, rx, ry) != 0 {
            return Crossing::None;
        }
        // Collinear: overlapping if the projections share more than a point.
        let len_sq = rx * rx + ry * ry;
        let t0 = qpx * rx + qpy * ry;
        let t1 = i128::from(q2.x - p1.x) * rx + i128::from(q2.y - p1.y) * ry;
        let (lo, hi) = (t0.min(t1), t0.max(t1));
        if hi <= 0 || lo >= len_sq {
            return if hi == 0 || lo == len_sq {
                Crossing::Point(if hi == 0 { p1 } else { p2 })
            } else {
                Crossing::None
            };
        }
        return Crossing::Overlap;
    }

    let mut t_num = cross(qpx, qpy, sx, sy);
    let mut u_num = cross(qpx, qpy, rx, ry);
    if denom < 0 {
        denom = -denom;
        t_num = -t_num;
        u_num = -u_num;
    }
    if t_num < 0 || t_num > denom || u_num < 0 || u_num > denom {
        return Crossing::None;
    }

    let point = if t_num == 0 {
        p1
    } else if t_num == denom {
        p2
    } else if u_num == 0 {
        q1
    } else if u_num == denom {
        q2
    } else {
        let t = t_num as f64 / denom as f64;
        IntPoint::new(
            (p1.x as f64 + rx as f64 * t).round() as i64,
            (p1.y as f64 + ry as f64 * t).round() as i64,
        )
    };
    Crossing::Point(point)
}
