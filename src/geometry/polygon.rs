use crate::math::polygon_2d::{almost_equal, signed_area_2d, vertex_centroid};
use crate::math::{Aabb2, Point3};

/// An ordered point sequence with a closed/open flag.
///
/// Closed polygons are stored in reduced form: the repeated closing point is
/// never part of `points`, the closure lives in `closed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point3>,
    closed: bool,
}

impl Polygon {
    /// Builds a polygon from raw input, treating it as closed when the first
    /// and last points coincide. The closing point is dropped.
    #[must_use]
    pub fn from_raw(mut points: Vec<Point3>) -> Self {
        let closed = points.len() > 1
            && almost_equal(&points[0], &points[points.len() - 1]);
        if closed {
            points.pop();
        }
        Self { points, closed }
    }

    /// Builds a polygon with an explicit closure hint. The points are stored
    /// as given.
    #[must_use]
    pub fn with_closed(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the polygon can be realized as a boundary (3 or more points).
    #[must_use]
    pub fn is_realizable(&self) -> bool {
        self.points.len() >= 3
    }

    /// Whether every point has exactly the same z.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_planar(&self) -> bool {
        match self.points.first() {
            Some(first) => self.points.iter().all(|p| p.z == first.z),
            None => true,
        }
    }

    /// Planar range of the points.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(&self.points)
    }

    #[must_use]
    pub fn centroid(&self) -> Point3 {
        vertex_centroid(&self.points)
    }

    /// Signed planar area of the reduced ring.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area_2d(&self.points)
    }

    /// Consecutive point pairs, including the closing pair iff closed.
    pub fn edges(&self) -> impl Iterator<Item = (&Point3, &Point3)> + '_ {
        let n = self.points.len();
        let count = match (self.closed, n) {
            (_, 0 | 1) => 0,
            (true, _) => n,
            (false, _) => n - 1,
        };
        (0..count).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    /// The reduced points followed by the first point again when closed.
    #[must_use]
    pub fn to_closed_points(&self) -> Vec<Point3> {
        let mut out = self.points.clone();
        if self.closed {
            if let Some(first) = self.points.first() {
                out.push(*first);
            }
        }
        out
    }

    /// Returns a polygon with the same closure and new points.
    #[must_use]
    pub(crate) fn with_points(&self, points: Vec<Point3>) -> Self {
        Self {
            points,
            closed: self.closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn from_raw_detects_closure() {
        let poly = Polygon::from_raw(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)]);
        assert!(poly.is_closed());
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn from_raw_keeps_open_polyline() {
        let poly = Polygon::from_raw(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
        assert!(!poly.is_closed());
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn with_closed_stores_points_verbatim() {
        let poly = Polygon::with_closed(vec![p(0.0, 0.0), p(1.0, 0.0), p(0.0, 0.0)], true);
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn edges_include_closing_pair_only_when_closed() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)];
        assert_eq!(Polygon::with_closed(pts.clone(), true).edges().count(), 3);
        assert_eq!(Polygon::with_closed(pts, false).edges().count(), 2);
        assert_eq!(Polygon::with_closed(vec![p(0.0, 0.0)], true).edges().count(), 0);
    }

    #[test]
    fn closed_points_repeat_the_start() {
        let poly = Polygon::with_closed(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)], true);
        let pts = poly.to_closed_points();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], pts[3]);
    }

    #[test]
    fn planarity() {
        let flat = Polygon::with_closed(vec![p(0.0, 0.0), p(1.0, 0.0)], false);
        assert!(flat.is_planar());
        let sloped = Polygon::with_closed(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.5)],
            false,
        );
        assert!(!sloped.is_planar());
    }
}
