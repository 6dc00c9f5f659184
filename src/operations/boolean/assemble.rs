use std::collections::HashMap;
use std::f64::consts::TAU;

use tracing::warn;

use crate::math::IntPoint;

use super::split::cross;

/// Links directed boundary edges into closed rings.
///
/// At a vertex with several outgoing edges the walk takes the sharpest left
/// turn, so regions that only touch at a point come out as separate rings.
/// Walks that dead-end are dropped and reported. Exactly collinear vertices are removed
/// and rings that end up with fewer than 3 vertices or zero area are
/// discarded.
#[must_use]
pub fn assemble_rings(edges: &[(IntPoint, IntPoint)]) -> Vec<Vec<IntPoint>> {
    let mut outgoing: HashMap<IntPoint, Vec<usize>> = HashMap::new();
    for (i, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    let mut open_walks = 0_usize;

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let origin = edges[start].0;
        let mut ring = vec![origin];
        let mut current = start;
        let closed = loop {
            let (from, to) = edges[current];
            if to == origin {
                break true;
            }
            ring.push(to);
            let Some(next) = next_edge(edges, &outgoing, &used, from, to) else {
                break false;
            };
            used[next] = true;
            current = next;
        };
        if !closed {
            open_walks += 1;
            continue;
        }
        let ring = strip_collinear(ring);
        if ring.len() >= 3 && twice_area(&ring) != 0 {
            rings.push(ring);
        }
    }
    if open_walks > 0 {
        warn!(open_walks, edges = edges.len(), "boundary walks did not close");
    }
    rings
}

/// Unused edge leaving `at` with the smallest clockwise angle from the
/// reversed incoming direction.
fn next_edge(
    edges: &[(IntPoint, IntPoint)],
    outgoing: &HashMap<IntPoint, Vec<usize>>,
    used: &[bool],
    from: IntPoint,
    at: IntPoint,
) -> Option<usize> {
    let back = direction_angle(from, at)?;
    outgoing
        .get(&at)?
        .iter()
        .copied()
        .filter(|&i| !used[i])
        .map(|i| {
            let out = direction_angle(edges[i].1, at).unwrap_or(back);
            let mut clockwise = (back - out).rem_euclid(TAU);
            if clockwise <= 0.0 {
                clockwise = TAU;
            }
            (i, clockwise)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Angle of the direction `at -> to`.
#[allow(clippy::cast_precision_loss)]
fn direction_angle(to: IntPoint, at: IntPoint) -> Option<f64> {
    if to == at {
        return None;
    }
    Some(((to.y - at.y) as f64).atan2((to.x - at.x) as f64))
}

/// Removes vertices lying exactly on the line through their neighbours,
/// spikes included.
fn strip_collinear(ring: Vec<IntPoint>) -> Vec<IntPoint> {
    let mut out: Vec<IntPoint> = Vec::with_capacity(ring.len());
    for p in ring {
        while out.len() >= 2 && turn(out[out.len() - 2], out[out.len() - 1], p) == 0 {
            out.pop();
        }
        out.push(p);
    }
    // Seam between the last and first vertex.
    while out.len() >= 3 {
        let n = out.len();
        if turn(out[n - 2], out[n - 1], out[0]) == 0 {
            out.pop();
        } else if turn(out[n - 1], out[0], out[1]) == 0 {
            out.remove(0);
        } else {
            break;
        }
    }
    out
}

fn turn(prev: IntPoint, cur: IntPoint, next: IntPoint) -> i128 {
    cross(
        i128::from(cur.x - prev.x),
        i128::from(cur.y - prev.y),
        i128::from(next.x - cur.x),
        i128::from(next.y - cur.y),
    )
}

/// Twice the signed area of an integer ring.
#[must_use]
pub fn twice_area(ring: &[IntPoint]) -> i128 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn ring_edges(ring: &[IntPoint]) -> Vec<(IntPoint, IntPoint)> {
        let n = ring.len();
        (0..n).map(|i| (ring[i], ring[(i + 1) % n])).collect()
    }

    #[test]
    fn single_square() {
        let square = vec![ip(0, 0), ip(2, 0), ip(2, 2), ip(0, 2)];
        let rings = assemble_rings(&ring_edges(&square));
        assert_eq!(rings.len(), 1);
        assert_eq!(twice_area(&rings[0]), 8);
    }

    #[test]
    fn split_edges_are_merged_back() {
        let square = vec![ip(0, 0), ip(1, 0), ip(2, 0), ip(2, 2), ip(0, 2)];
        let rings = assemble_rings(&ring_edges(&square));
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
    }

    #[test]
    fn corner_touching_squares_stay_separate() {
        let mut edges = ring_edges(&[ip(0, 0), ip(1, 0), ip(1, 1), ip(0, 1)]);
        edges.extend(ring_edges(&[ip(1, 1), ip(2, 1), ip(2, 2), ip(1, 2)]));
        let rings = assemble_rings(&edges);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.len() == 4 && twice_area(r) == 2));
    }

    #[test]
    fn open_chain_is_dropped() {
        let edges = vec![(ip(0, 0), ip(1, 0)), (ip(1, 0), ip(1, 1))];
        assert!(assemble_rings(&edges).is_empty());
    }

    #[test]
    fn degenerate_ring_is_dropped() {
        let edges = vec![(ip(0, 0), ip(1, 0)), (ip(1, 0), ip(0, 0))];
        assert!(assemble_rings(&edges).is_empty());
    }

    #[test]
    fn orientation_is_preserved() {
        let cw = vec![ip(0, 0), ip(0, 3), ip(3, 3), ip(3, 0)];
        let rings = assemble_rings(&ring_edges(&cw));
        assert_eq!(twice_area(&rings[0]), -18);
    }
}
