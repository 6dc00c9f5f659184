use super::{Point3, Vector3, TOLERANCE};

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Vertex average of a point sequence. Returns the origin for an empty slice.
#[must_use]
pub fn vertex_centroid(points: &[Point3]) -> Point3 {
    let n = points.len();
    if n == 0 {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / n as f64;
    Point3::new(
        points.iter().map(|p| p.x).sum::<f64>() * inv_n,
        points.iter().map(|p| p.y).sum::<f64>() * inv_n,
        points.iter().map(|p| p.z).sum::<f64>() * inv_n,
    )
}

/// Tolerance-based point equality used to detect explicitly closed input.
#[must_use]
pub fn almost_equal(a: &Point3, b: &Point3) -> bool {
    (b - a).norm() < TOLERANCE * 1e3
}

/// Exact planar key of a point: the bit patterns of x and y, with `-0.0`
/// folded onto `0.0` so that the two zeros share a key.
#[must_use]
pub fn planar_key(p: &Point3) -> (u64, u64) {
    fn bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0_f64.to_bits()
        } else {
            v.to_bits()
        }
    }
    (bits(p.x), bits(p.y))
}

/// A straight segment that is known to be buildable: finite endpoints and a
/// non-zero length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point3,
    pub end: Point3,
    pub length: f64,
}

impl Edge {
    /// Unit direction from `start` to `end`.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        (self.end - self.start) / self.length
    }
}

/// Attempts to build an edge between two points.
///
/// Returns `None` when either endpoint is not finite or the points coincide
/// within [`TOLERANCE`].
#[must_use]
pub fn try_edge(start: &Point3, end: &Point3) -> Option<Edge> {
    if !is_finite(start) || !is_finite(end) {
        return None;
    }
    let length = (end - start).norm();
    if !length.is_finite() || length < TOLERANCE {
        return None;
    }
    Some(Edge {
        start: *start,
        end: *end,
        length,
    })
}

fn is_finite(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// An axis-aligned rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb2 {
    /// Creates a rectangle from its extreme coordinates.
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Planar range of a point sequence, `None` if it is empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grows the rectangle to contain `p`.
    pub fn include(&mut self, p: &Point3) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// The four corners at height `z`, counter-clockwise from the minimum.
    #[must_use]
    pub fn corners(&self, z: f64) -> [Point3; 4] {
        [
            Point3::new(self.min_x, self.min_y, z),
            Point3::new(self.max_x, self.min_y, z),
            Point3::new(self.max_x, self.max_y, z),
            Point3::new(self.min_x, self.max_y, z),
        ]
    }
}
