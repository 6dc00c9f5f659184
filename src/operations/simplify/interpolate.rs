use crate::math::Point3;

/// Densifies a point sequence with evenly spaced points along every edge
/// longer than `segment_length`.
///
/// Every edge (plus the closing edge when `closed`) contributes its start
/// point and, when longer than `segment_length`, `floor(L / segment_length) - 1`
/// further evenly spaced points. The end point of an edge is left to the
/// following edge, so an open sequence does not re-emit its last vertex.
#[must_use]
pub fn interpolate(points: &[Point3], closed: bool, segment_length: f64) -> Vec<Point3> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n);
    for pair in points.windows(2) {
        densify_edge(&pair[0], &pair[1], segment_length, &mut out);
    }
    if closed {
        densify_edge(&points[n - 1], &points[0], segment_length, &mut out);
    }
    out
}

/// Points emitted for the single edge `a -> b`: `max(1, floor(L / k))` of them.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn densify_edge(a: &Point3, b: &Point3, k: f64, out: &mut Vec<Point3>) {
    let length = (b - a).norm();
    if length > k {
        let count = (length / k).floor() as usize;
        let step = (b - a) / count as f64;
        out.extend((0..count).map(|i| a + step * i as f64));
    } else {
        out.push(*a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn single_edge_count_is_floor_of_ratio() {
        let cases = [
            (10.0, 1.0, 10),
            (10.5, 1.0, 10),
            (2.5, 1.0, 2),
            (0.7, 1.0, 1),
            (1.0, 1.0, 1),
        ];
        for (d, l, expected) in cases {
            let out = interpolate(&[p(0.0, 0.0), p(d, 0.0)], false, l);
            assert_eq!(out.len(), expected, "d = {d}");
        }
    }

    #[test]
    fn points_are_evenly_spaced_from_the_start() {
        let out = interpolate(&[p(0.0, 0.0), p(10.0, 0.0)], false, 4.0);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].x, 0.0);
        assert_relative_eq!(out[1].x, 5.0);
    }

    #[test]
    fn closed_square_includes_closing_edge() {
        let square = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        let out = interpolate(&square, true, 1.0);
        assert_eq!(out.len(), 16);
        assert_relative_eq!(out[15].y, 1.0);
    }

    #[test]
    fn original_vertices_are_preserved_in_order() {
        let square = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        let out = interpolate(&square, true, 1.5);
        let mut cursor = 0;
        for v in &square {
            let found = out[cursor..].iter().position(|q| q == v);
            assert!(found.is_some(), "missing vertex {v:?}");
            cursor += found.unwrap_or(0) + 1;
        }
    }

    #[test]
    fn z_is_interpolated() {
        let out = interpolate(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 8.0)],
            false,
            1.0,
        );
        assert_relative_eq!(out[2].z, 4.0);
    }
}
