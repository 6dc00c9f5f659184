//! Triangulated terrain built from contour lines.

use std::collections::HashSet;

use spade::handles::FixedVertexHandle;
use spade::{
    DelaunayTriangulation, HasPosition, Point2 as SpadePoint2, PositionInTriangulation,
    Triangulation,
};
use tracing::{debug, warn};

use crate::error::{ProbeError, Result};
use crate::geometry::Polygon;
use crate::grid::TerrainProbe;
use crate::math::polygon_2d::planar_key;
use crate::math::{Point2, Point3, TOLERANCE};
use crate::operations::simplify::Pipeline;

/// Parameters for turning contour lines into terrain points.
#[derive(Debug, Clone, Copy)]
pub struct ContourParams {
    /// Points closer than this along a contour are merged.
    pub proximity: f64,
    /// Contours are densified to at most this spacing.
    pub interpolation: f64,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            proximity: 5.0,
            interpolation: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TerrainVertex {
    position: SpadePoint2<f64>,
    height: f64,
}

impl HasPosition for TerrainVertex {
    type Scalar = f64;

    fn position(&self) -> SpadePoint2<f64> {
        self.position
    }
}

/// A Delaunay TIN over terrain sample points.
///
/// Points whose planar position exactly repeats an earlier point, or that
/// the triangulation refuses, are counted in [`failed_points`](Self::failed_points)
/// instead of being inserted.
pub struct TerrainSurface {
    tin: DelaunayTriangulation<TerrainVertex>,
    failed_points: usize,
}

impl TerrainSurface {
    /// Triangulates the given sample points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut tin = DelaunayTriangulation::<TerrainVertex>::new();
        let mut seen = HashSet::new();
        let mut failed_points = 0;

        for p in points {
            if !seen.insert(planar_key(&p)) {
                failed_points += 1;
                continue;
            }
            let vertex = TerrainVertex {
                position: SpadePoint2::new(p.x, p.y),
                height: p.z,
            };
            if let Err(err) = tin.insert(vertex) {
                warn!(x = p.x, y = p.y, %err, "terrain point rejected");
                failed_points += 1;
            }
        }

        debug!(
            vertices = tin.num_vertices(),
            triangles = tin.num_inner_faces(),
            failed_points,
            "built terrain surface"
        );
        Self { tin, failed_points }
    }

    /// Prepares every contour with `close(proximity)` then
    /// `interpolate(interpolation)` and triangulates all resulting points.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either parameter is not positive and finite.
    pub fn from_contours(contours: &[Vec<Point3>], params: &ContourParams) -> Result<Self> {
        let pipeline = Pipeline::contour(params.proximity, params.interpolation);
        let mut points = Vec::new();
        for contour in contours {
            let prepared = pipeline.run(&Polygon::from_raw(contour.clone()))?;
            points.extend(prepared.into_points());
        }
        Ok(Self::from_points(points))
    }

    /// Points that were not inserted: exact planar duplicates and points the
    /// triangulation rejected.
    #[must_use]
    pub fn failed_points(&self) -> usize {
        self.failed_points
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.tin.num_vertices()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.tin.num_inner_faces()
    }

    /// Whether `(x, y)` lies inside or on the convex hull of the samples.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.triangle_count() > 0
            && !matches!(
                self.tin.locate(SpadePoint2::new(x, y)),
                PositionInTriangulation::OutsideOfConvexHull(_)
                    | PositionInTriangulation::NoTriangulation
            )
    }

    /// Linearly interpolated elevation at `(x, y)`, `None` outside the
    /// surface.
    #[must_use]
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        if self.triangle_count() == 0 {
            return None;
        }
        let query = Point2::new(x, y);
        match self.tin.locate(SpadePoint2::new(x, y)) {
            PositionInTriangulation::OnVertex(v) => Some(self.height(v)),
            PositionInTriangulation::OnEdge(edge) => {
                let [a, b] = self.tin.directed_edge(edge).vertices().map(|v| v.fix());
                Some(interpolate_on_segment(
                    (self.planar(a), self.height(a)),
                    (self.planar(b), self.height(b)),
                    &query,
                ))
            }
            PositionInTriangulation::OnFace(face) => {
                let [a, b, c] = self.tin.face(face).vertices().map(|v| v.fix());
                barycentric_height(
                    [
                        (self.planar(a), self.height(a)),
                        (self.planar(b), self.height(b)),
                        (self.planar(c), self.height(c)),
                    ],
                    &query,
                )
            }
            PositionInTriangulation::OutsideOfConvexHull(_)
            | PositionInTriangulation::NoTriangulation => None,
        }
    }

    fn height(&self, v: FixedVertexHandle) -> f64 {
        self.tin.vertex(v).data().height
    }

    fn planar(&self, v: FixedVertexHandle) -> Point2 {
        let p = self.tin.vertex(v).position();
        Point2::new(p.x, p.y)
    }
}

impl TerrainProbe for TerrainSurface {
    fn probe(&self, point: &Point3) -> std::result::Result<bool, ProbeError> {
        if self.triangle_count() == 0 {
            return Err(ProbeError::Unavailable("terrain has no triangles".into()));
        }
        Ok(self.contains(point.x, point.y))
    }
}

fn interpolate_on_segment(a: (Point2, f64), b: (Point2, f64), q: &Point2) -> f64 {
    let ab = b.0 - a.0;
    let length_sq = ab.norm_squared();
    if length_sq < TOLERANCE * TOLERANCE {
        return a.1;
    }
    let t = ((*q - a.0).dot(&ab) / length_sq).clamp(0.0, 1.0);
    a.1 + (b.1 - a.1) * t
}

fn barycentric_height(corners: [(Point2, f64); 3], q: &Point2) -> Option<f64> {
    let [(a, ha), (b, hb), (c, hc)] = corners;
    let (v0, v1, v2) = (b - a, c - a, *q - a);
    let det = v0.x * v1.y - v1.x * v0.y;
    if det.abs() < TOLERANCE {
        return None;
    }
    let wb = (v2.x * v1.y - v1.x * v2.y) / det;
    let wc = (v0.x * v2.y - v2.x * v0.y) / det;
    let wa = 1.0 - wb - wc;
    Some(wa * ha + wb * hb + wc * hc)
}
