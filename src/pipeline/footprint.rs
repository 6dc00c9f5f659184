use tracing::debug;

use crate::error::Result;
use crate::geometry::Polygon;
use crate::operations::simplify::Pipeline;

use super::params::ProcessParams;

/// Building outlines after cleanup.
#[derive(Debug, Clone, Default)]
pub struct PreparedFootprints {
    /// Outlines with at least 3 points, in input order.
    pub polygons: Vec<Polygon>,
    /// Outlines that collapsed below 3 points.
    pub degenerate: usize,
}

/// Runs the footprint preset on every outline: flatten to 0, dedupe, merge
/// points within `params.proximity`, drop exactly collinear points and
/// unbuildable edges.
///
/// # Errors
///
/// Returns a `ConfigError` if `params.proximity` is invalid.
pub fn prepare_footprints(
    footprints: &[Polygon],
    params: &ProcessParams,
) -> Result<PreparedFootprints> {
    let pipeline = Pipeline::footprint(params.proximity);
    let mut prepared = PreparedFootprints::default();
    for (index, footprint) in footprints.iter().enumerate() {
        let polygon = pipeline.run(footprint)?;
        if polygon.is_realizable() {
            prepared.polygons.push(polygon);
        } else {
            debug!(index, points = polygon.len(), "footprint degenerated");
            prepared.degenerate += 1;
        }
    }
    Ok(prepared)
}
