//! Point-sequence simplification: deduplication, proximity merging,
//! collinearity removal, interpolation and degenerate-edge elimination.
//!
//! Every step is a pure transform from one [`Polygon`] to the next. The
//! [`PolygonProcessor`] keeps the raw input for [`PolygonProcessor::reset`]
//! and replaces its [`ProcessingState`] wholesale after each step, so nothing
//! derived from an earlier point layout can outlive an edit.

mod collinear;
mod force_fix;
mod identical;
mod interpolate;
mod proximity;

pub use collinear::{remove_collinearity, CollinearPurge, COLLINEAR_MERGE_TOLERANCE};
pub use force_fix::force_to_fix;
pub use identical::{count_identical_points, remove_identical_points};
pub use interpolate::interpolate;
pub use proximity::remove_close_points;

use tracing::trace;

use crate::error::{ConfigError, GeometryError, Result};
use crate::geometry::Polygon;
use crate::math::Point3;

/// A single simplification step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessStep {
    /// Replace every z with `elevation`.
    Flatten { elevation: f64 },
    /// Drop exact planar duplicates, first occurrence wins.
    RemoveIdenticalPoints,
    /// Merge points closer than `tolerance`.
    RemoveClosePoints { tolerance: f64 },
    /// Remove interior points within `angle` radians of a straight line.
    RemoveCollinearity { angle: f64 },
    /// Densify edges longer than `segment_length`.
    Interpolate { segment_length: f64 },
    /// Drop points that start unbuildable edges.
    ForceToFix,
}

impl ProcessStep {
    /// Checks the step's numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NonPositive` for a negative or non-finite
    /// tolerance/angle, or a non-positive interpolation length.
    pub fn validate(&self) -> Result<()> {
        let (name, value, allow_zero) = match *self {
            Self::Flatten { elevation } if !elevation.is_finite() => {
                ("elevation", elevation, false)
            }
            Self::RemoveClosePoints { tolerance } => ("proximity tolerance", tolerance, true),
            Self::RemoveCollinearity { angle } => ("collinearity angle", angle, true),
            Self::Interpolate { segment_length } => ("interpolation length", segment_length, false),
            _ => return Ok(()),
        };
        let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
        if ok {
            Ok(())
        } else {
            Err(ConfigError::NonPositive { name, value }.into())
        }
    }

    /// Applies the step to `polygon`, returning the new polygon and the
    /// number of points removed (zero for steps that do not remove).
    ///
    /// # Errors
    ///
    /// Returns an error if the step's parameter is invalid.
    pub fn apply(&self, polygon: &Polygon) -> Result<(Polygon, usize)> {
        self.validate()?;
        let points = polygon.points();
        let next = match *self {
            Self::Flatten { elevation } => points
                .iter()
                .map(|p| Point3::new(p.x, p.y, elevation))
                .collect(),
            Self::RemoveIdenticalPoints => remove_identical_points(points).0,
            Self::RemoveClosePoints { tolerance } => remove_close_points(points, tolerance),
            Self::RemoveCollinearity { angle } => remove_collinearity(points, angle).points,
            Self::Interpolate { segment_length } => {
                interpolate(points, polygon.is_closed(), segment_length)
            }
            Self::ForceToFix => force_to_fix(points),
        };
        let removed = points.len().saturating_sub(next.len());
        trace!(step = ?self, before = points.len(), after = next.len(), "simplify step");
        Ok((polygon.with_points(next), removed))
    }
}

/// Minimum and maximum edge length of a point sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLengths {
    pub min: f64,
    pub max: f64,
}

/// Computes min/max edge length, closing edge included iff the polygon is
/// closed.
///
/// # Errors
///
/// Returns `GeometryError::TooFewPoints` for fewer than 2 points.
pub fn edge_lengths(polygon: &Polygon) -> Result<EdgeLengths> {
    if polygon.len() < 2 {
        return Err(GeometryError::TooFewPoints {
            count: polygon.len(),
            required: 2,
        }
        .into());
    }
    let mut lengths = polygon.edges().map(|(a, b)| (b - a).norm());
    let first = lengths.next().unwrap_or(0.0);
    let (min, max) = lengths.fold((first, first), |(lo, hi), l| (lo.min(l), hi.max(l)));
    Ok(EdgeLengths { min, max })
}

/// What is known about the current point layout of a [`PolygonProcessor`].
///
/// Rebuilt from scratch after every step: only the step that produced the
/// current points is recorded, and edge lengths are cached only until the
/// next step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessingState {
    last_step: Option<ProcessStep>,
    edge_lengths: Option<EdgeLengths>,
}

impl ProcessingState {
    #[must_use]
    pub fn last_step(&self) -> Option<ProcessStep> {
        self.last_step
    }

    /// Tolerance of the proximity merge, if that was the last step.
    #[must_use]
    pub fn proximity_tolerance(&self) -> Option<f64> {
        match self.last_step {
            Some(ProcessStep::RemoveClosePoints { tolerance }) => Some(tolerance),
            _ => None,
        }
    }

    /// Angle of the collinearity purge, if that was the last step.
    #[must_use]
    pub fn collinearity_angle(&self) -> Option<f64> {
        match self.last_step {
            Some(ProcessStep::RemoveCollinearity { angle }) => Some(angle),
            _ => None,
        }
    }

    /// Interpolation length, if interpolation was the last step.
    #[must_use]
    pub fn interpolation_length(&self) -> Option<f64> {
        match self.last_step {
            Some(ProcessStep::Interpolate { segment_length }) => Some(segment_length),
            _ => None,
        }
    }

    #[must_use]
    pub fn edge_lengths(&self) -> Option<EdgeLengths> {
        self.edge_lengths
    }
}

/// An ordered list of steps applied one after another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    steps: Vec<ProcessStep>,
}

impl Pipeline {
    #[must_use]
    pub fn new(steps: Vec<ProcessStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    /// Appends a step.
    #[must_use]
    pub fn then(mut self, step: ProcessStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Road centerline preparation before clipping:
    /// flatten(0), dedupe, merge(`proximity`), collinear(`angle`).
    #[must_use]
    pub fn road_preprocess(proximity: f64, angle: f64) -> Self {
        Self::new(vec![
            ProcessStep::Flatten { elevation: 0.0 },
            ProcessStep::RemoveIdenticalPoints,
            ProcessStep::RemoveClosePoints { tolerance: proximity },
            ProcessStep::RemoveCollinearity { angle },
        ])
    }

    /// Cleanup of dequantized clip results:
    /// dedupe, merge(`proximity`), force-fix, collinear(`angle`).
    #[must_use]
    pub fn region_cleanup(proximity: f64, angle: f64) -> Self {
        Self::new(vec![
            ProcessStep::RemoveIdenticalPoints,
            ProcessStep::RemoveClosePoints { tolerance: proximity },
            ProcessStep::ForceToFix,
            ProcessStep::RemoveCollinearity { angle },
        ])
    }

    /// Building footprint preparation:
    /// flatten(0), dedupe, merge(`proximity`), exact collinear, force-fix.
    #[must_use]
    pub fn footprint(proximity: f64) -> Self {
        Self::new(vec![
            ProcessStep::Flatten { elevation: 0.0 },
            ProcessStep::RemoveIdenticalPoints,
            ProcessStep::RemoveClosePoints { tolerance: proximity },
            ProcessStep::RemoveCollinearity { angle: 0.0 },
            ProcessStep::ForceToFix,
        ])
    }

    /// Contour preparation for terrain points: merge(`proximity`), then
    /// interpolate(`segment_length`).
    #[must_use]
    pub fn contour(proximity: f64, segment_length: f64) -> Self {
        Self::new(vec![
            ProcessStep::RemoveClosePoints { tolerance: proximity },
            ProcessStep::Interpolate { segment_length },
        ])
    }

    /// Runs every step on `polygon`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step's parameter is invalid. Parameters are
    /// checked before the first step runs.
    pub fn run(&self, polygon: &Polygon) -> Result<Polygon> {
        for step in &self.steps {
            step.validate()?;
        }
        let mut current = polygon.clone();
        for step in &self.steps {
            current = step.apply(&current)?.0;
        }
        Ok(current)
    }
}

/// Owns one polygon through a sequence of simplification steps.
#[derive(Debug, Clone)]
pub struct PolygonProcessor {
    initial: Polygon,
    current: Polygon,
    state: ProcessingState,
}

impl PolygonProcessor {
    /// Starts from raw input, detecting closure from the first/last point.
    #[must_use]
    pub fn new(raw: Vec<Point3>) -> Self {
        Self::from_polygon(Polygon::from_raw(raw))
    }

    /// Starts from raw input with an explicit closure hint.
    #[must_use]
    pub fn with_closed(raw: Vec<Point3>, closed: bool) -> Self {
        Self::from_polygon(Polygon::with_closed(raw, closed))
    }

    #[must_use]
    pub fn from_polygon(polygon: Polygon) -> Self {
        Self {
            initial: polygon.clone(),
            current: polygon,
            state: ProcessingState::default(),
        }
    }

    #[must_use]
    pub fn polygon(&self) -> &Polygon {
        &self.current
    }

    #[must_use]
    pub fn into_polygon(self) -> Polygon {
        self.current
    }

    /// The polygon as it was before any step.
    #[must_use]
    pub fn initial(&self) -> &Polygon {
        &self.initial
    }

    #[must_use]
    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Applies one step and returns the number of points it removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the step's parameter is invalid; the polygon is
    /// left untouched in that case.
    pub fn apply(&mut self, step: ProcessStep) -> Result<usize> {
        let (next, removed) = step.apply(&self.current)?;
        self.current = next;
        self.state = ProcessingState {
            last_step: Some(step),
            edge_lengths: None,
        };
        Ok(removed)
    }

    /// Applies every step of `pipeline` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any step's parameter is invalid.
    pub fn run(&mut self, pipeline: &Pipeline) -> Result<()> {
        for step in pipeline.steps() {
            step.validate()?;
        }
        for &step in pipeline.steps() {
            self.apply(step)?;
        }
        Ok(())
    }

    /// Projects every point onto the plane `z = elevation`.
    ///
    /// # Errors
    ///
    /// Returns an error if `elevation` is not finite.
    pub fn flatten(&mut self, elevation: f64) -> Result<()> {
        self.apply(ProcessStep::Flatten { elevation }).map(|_| ())
    }

    /// Drops exact planar duplicates and returns how many were removed.
    pub fn remove_identical_points(&mut self) -> usize {
        let (kept, removed) = remove_identical_points(self.current.points());
        self.replace(kept, ProcessStep::RemoveIdenticalPoints);
        removed
    }

    /// Number of exact planar duplicates, without modifying anything.
    #[must_use]
    pub fn count_identical_points(&self) -> usize {
        count_identical_points(self.current.points())
    }

    /// Merges points closer than `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is negative or not finite.
    pub fn remove_close_points(&mut self, tolerance: f64) -> Result<usize> {
        self.apply(ProcessStep::RemoveClosePoints { tolerance })
    }

    /// Removes collinear interior points (angle in radians, 0 = exact).
    ///
    /// # Errors
    ///
    /// Returns an error if `angle` is negative or not finite.
    pub fn remove_collinearity(&mut self, angle: f64) -> Result<usize> {
        self.apply(ProcessStep::RemoveCollinearity { angle })
    }

    /// Densifies edges longer than `segment_length`.
    ///
    /// # Errors
    ///
    /// Returns an error if `segment_length` is not positive and finite.
    pub fn interpolate(&mut self, segment_length: f64) -> Result<()> {
        self.apply(ProcessStep::Interpolate { segment_length }).map(|_| ())
    }

    /// Drops points that start unbuildable edges until stable.
    pub fn force_to_fix_list(&mut self) -> usize {
        let fixed = force_to_fix(self.current.points());
        let removed = self.current.len() - fixed.len();
        self.replace(fixed, ProcessStep::ForceToFix);
        removed
    }

    /// Computes and caches the min/max edge length.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::TooFewPoints` for fewer than 2 points.
    pub fn load_edge_lengths(&mut self) -> Result<EdgeLengths> {
        let lengths = edge_lengths(&self.current)?;
        self.state.edge_lengths = Some(lengths);
        Ok(lengths)
    }

    /// Restores the raw input and forgets every derived value.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.state = ProcessingState::default();
    }

    fn replace(&mut self, points: Vec<Point3>, step: ProcessStep) {
        self.current = self.current.with_points(points);
        self.state = ProcessingState {
            last_step: Some(step),
            edge_lengths: None,
        };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square_raw() -> Vec<Point3> {
        vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(0.0, 0.0)]
    }

    #[test]
    fn square_footprint_reduces_to_four_corners() {
        let mut proc = PolygonProcessor::new(square_raw());
        proc.flatten(0.0).unwrap();
        proc.remove_identical_points();
        proc.remove_close_points(0.5).unwrap();
        proc.remove_collinearity(0.0).unwrap();
        let poly = proc.polygon();
        assert!(poly.is_closed());
        assert_eq!(poly.points(), &[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]);
    }

    #[test]
    fn flatten_sets_uniform_height() {
        let mut proc = PolygonProcessor::with_closed(
            vec![Point3::new(0.0, 0.0, 3.0), Point3::new(1.0, 0.0, 7.0)],
            false,
        );
        proc.flatten(2.5).unwrap();
        assert!(proc.polygon().points().iter().all(|q| (q.z - 2.5).abs() < f64::EPSILON));
        assert!(proc.polygon().is_planar());
    }

    #[test]
    fn state_tracks_only_the_last_step() {
        let mut proc = PolygonProcessor::new(square_raw());
        proc.remove_close_points(0.5).unwrap();
        assert_eq!(proc.state().proximity_tolerance(), Some(0.5));
        proc.interpolate(2.0).unwrap();
        assert_eq!(proc.state().proximity_tolerance(), None);
        assert_eq!(proc.state().interpolation_length(), Some(2.0));
        proc.remove_collinearity(0.1).unwrap();
        assert_eq!(proc.state().interpolation_length(), None);
        assert_eq!(proc.state().collinearity_angle(), Some(0.1));
    }

    #[test]
    fn edge_length_cache_is_dropped_by_any_step() {
        let mut proc = PolygonProcessor::new(square_raw());
        let lengths = proc.load_edge_lengths().unwrap();
        assert_relative_eq!(lengths.min, 10.0);
        assert_relative_eq!(lengths.max, 10.0);
        assert!(proc.state().edge_lengths().is_some());
        proc.interpolate(3.0).unwrap();
        assert!(proc.state().edge_lengths().is_none());
        let lengths = proc.load_edge_lengths().unwrap();
        assert_relative_eq!(lengths.max, 10.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn edge_lengths_respect_closure() {
        let open = Polygon::with_closed(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 3.0)], false);
        let closed = Polygon::with_closed(open.points().to_vec(), true);
        assert_relative_eq!(edge_lengths(&open).unwrap().max, 3.0);
        assert_relative_eq!(edge_lengths(&closed).unwrap().max, 10f64.sqrt());
        assert!(edge_lengths(&Polygon::with_closed(vec![p(0.0, 0.0)], true)).is_err());
    }

    #[test]
    fn reset_restores_reduced_input() {
        let mut proc = PolygonProcessor::new(square_raw());
        proc.interpolate(1.0).unwrap();
        assert_eq!(proc.polygon().len(), 40);
        proc.reset();
        assert_eq!(proc.polygon().len(), 4);
        assert!(proc.polygon().is_closed());
        assert_eq!(*proc.state(), ProcessingState::default());
    }

    #[test]
    fn identical_removal_reports_count() {
        let mut proc = PolygonProcessor::with_closed(
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)],
            true,
        );
        assert_eq!(proc.count_identical_points(), 2);
        assert_eq!(proc.remove_identical_points(), 2);
        assert_eq!(proc.count_identical_points(), 0);
    }

    #[test]
    fn invalid_parameters_leave_polygon_untouched() {
        let mut proc = PolygonProcessor::new(square_raw());
        assert!(proc.remove_close_points(-1.0).is_err());
        assert!(proc.interpolate(0.0).is_err());
        assert!(proc.remove_collinearity(f64::NAN).is_err());
        assert_eq!(proc.polygon().len(), 4);
        assert!(proc.state().last_step().is_none());
    }

    #[test]
    fn pipeline_checks_every_step_before_running() {
        let pipeline = Pipeline::new(vec![
            ProcessStep::RemoveIdenticalPoints,
            ProcessStep::Interpolate { segment_length: -1.0 },
        ]);
        let mut proc = PolygonProcessor::new(square_raw());
        assert!(proc.run(&pipeline).is_err());
        assert!(proc.state().last_step().is_none());
    }

    #[test]
    fn footprint_preset_cleans_noisy_outline() {
        let raw = vec![
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 0.0),
            p(10.1, 0.2),
            p(10.0, 10.0),
            p(0.0, 10.0),
            p(0.0, 0.0),
        ];
        let out = Pipeline::footprint(0.5).run(&Polygon::from_raw(raw)).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.is_closed());
    }

    #[test]
    fn contour_preset_densifies() {
        let contour =
            Polygon::from_raw(vec![p(0.0, 0.0), p(30.0, 0.0), p(30.0, 0.2), p(60.0, 0.0)]);
        let out = Pipeline::contour(5.0, 10.0).run(&contour).unwrap();
        assert!(!out.is_closed());
        assert!(out.len() >= 6);
    }
}
