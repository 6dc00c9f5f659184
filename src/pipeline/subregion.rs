use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{GeometryError, InputError, Result, SiteError};
use crate::geometry::Polygon;
use crate::grid::{RegionGrid, TerrainProbe};
use crate::math::polygon_2d::Aabb2;
use crate::math::{IntPoint, Quantizer};
use crate::operations::boolean::{IntPath, PolygonClipper, RingGroup};
use crate::operations::simplify::Pipeline;

use super::params::SubregionParams;
use super::store::{BoundarySink, RegionBoundary};

/// Outcome of one [`SubregionPipeline::run`].
///
/// Per-polygon problems never abort a run; they are tallied here.
#[derive(Debug, Clone)]
pub struct SubregionReport<H> {
    /// The grid with validity flags and the region polygons of every cell.
    pub grid: RegionGrid,
    /// Handles returned by the sink, one per cell with geometry, in cell
    /// order.
    pub handles: Vec<H>,
    /// Cells whose subregion the sink rejected.
    pub failed_attempts: usize,
    /// Loops that collapsed below 3 points during cleanup, or holes that no
    /// outer loop contains.
    pub dropped_polygons: usize,
    /// Roads left out of the union: degenerate after preprocessing or not
    /// representable on the integer grid.
    pub skipped_roads: usize,
    /// Every loop of the rejected cells, kept for diagnostics.
    pub failed_polygons: Vec<Polygon>,
}

impl<H> SubregionReport<H> {
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.grid.cells().len()
    }

    #[must_use]
    pub fn valid_cells(&self) -> usize {
        self.grid.valid_count()
    }

    #[must_use]
    pub fn cells_with_geometry(&self) -> usize {
        self.grid
            .cells()
            .iter()
            .filter(|c| !c.polygons().is_empty())
            .count()
    }

    #[must_use]
    pub fn grid_dimensions(&self) -> (usize, usize) {
        (self.grid.x_count(), self.grid.y_count())
    }
}

/// Clips a road network against a terrain-validated grid and emits one
/// closed boundary per resulting region.
#[derive(Debug, Clone)]
pub struct SubregionPipeline {
    params: SubregionParams,
    clipper: PolygonClipper,
}

impl SubregionPipeline {
    /// # Errors
    ///
    /// Returns a `ConfigError` if `params` does not validate.
    pub fn new(params: SubregionParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            clipper: PolygonClipper::new(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &SubregionParams {
        &self.params
    }

    /// Runs the full pipeline over `roads`.
    ///
    /// 1. Each road is flattened and simplified.
    /// 2. The grid covers the bounding box of the prepared roads and its
    ///    cells are validated against `probe`.
    /// 3. All roads are quantized and merged once under the even-odd rule.
    /// 4. Every valid cell is clipped independently (in parallel).
    /// 5. Each cell's rings are grouped into outer loops with their holes,
    ///    dequantized, cleaned and handed to `sink` as one subregion, in
    ///    cell order.
    ///
    /// # Errors
    ///
    /// - `InputError::Empty` if `roads` is empty or every road is empty
    /// - `InputError::ZeroArea` if the roads span no area
    pub fn run<P, S>(
        &self,
        roads: &[Polygon],
        probe: &P,
        sink: &mut S,
    ) -> Result<SubregionReport<S::Handle>>
    where
        P: TerrainProbe + ?Sized,
        S: BoundarySink,
    {
        if roads.is_empty() {
            return Err(InputError::Empty.into());
        }
        let process = &self.params.process;
        let quantizer = Quantizer::new(self.params.exponent)?;

        let preprocess = Pipeline::road_preprocess(process.proximity, process.collinearity_angle);
        let prepared = roads
            .iter()
            .map(|road| preprocess.run(road))
            .collect::<Result<Vec<_>>>()?;

        let bounds = prepared
            .iter()
            .filter_map(Polygon::bounds)
            .reduce(|a, b| a.union(&b))
            .ok_or(InputError::Empty)?;

        let mut grid = RegionGrid::build(bounds, self.params.target_cell_size)?;
        grid.probe_cells(probe);

        let mut skipped_roads = 0;
        let mut rings: Vec<IntPath> = Vec::with_capacity(prepared.len());
        for (index, road) in prepared.iter().enumerate() {
            if !road.is_realizable() {
                debug!(index, points = road.len(), "road degenerate after preprocessing");
                skipped_roads += 1;
                continue;
            }
            match quantizer.quantize_polygon(road.points()) {
                Ok(ring) => rings.push(ring),
                Err(err) => {
                    warn!(index, %err, "road skipped");
                    skipped_roads += 1;
                }
            }
        }
        let road_union = self.clipper.union_xor(&rings);
        let union_bounds: Vec<(IntPoint, IntPoint)> =
            road_union.iter().map(|r| ring_bounds(r)).collect();
        debug!(
            roads = rings.len(),
            union_rings = road_union.len(),
            "merged road network"
        );

        let clipped: Vec<(usize, Vec<RingGroup>, usize)> = grid
            .cells()
            .par_iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_valid())
            .map(|(index, cell)| {
                let rings =
                    self.clip_cell(&road_union, &union_bounds, cell.bounds(), &quantizer);
                let (groups, orphans) = PolygonClipper::nest_holes(rings);
                (index, groups, orphans.len())
            })
            .collect();

        let cleanup = Pipeline::region_cleanup(process.proximity, process.collinearity_angle);
        let mut handles = Vec::new();
        let mut failed_attempts = 0;
        let mut dropped_polygons = 0;
        let mut failed_polygons = Vec::new();

        for (index, groups, orphans) in clipped {
            if orphans > 0 {
                warn!(cell = index, orphans, "holes outside every outer loop dropped");
                dropped_polygons += orphans;
            }
            let mut regions = Vec::with_capacity(groups.len());
            for group in &groups {
                let outer = match clean_loop(&cleanup, &quantizer, &group.outer) {
                    Ok(outer) => outer,
                    Err(SiteError::Geometry(err)) => {
                        let holes = group.holes.len();
                        debug!(cell = index, %err, holes, "outer loop dropped");
                        dropped_polygons += 1 + holes;
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                let mut holes = Vec::with_capacity(group.holes.len());
                for hole in &group.holes {
                    match clean_loop(&cleanup, &quantizer, hole) {
                        Ok(hole) => holes.push(hole),
                        Err(SiteError::Geometry(err)) => {
                            debug!(cell = index, %err, "hole dropped");
                            dropped_polygons += 1;
                        }
                        Err(err) => return Err(err),
                    }
                }
                regions.push(RegionBoundary::new(outer, holes));
            }
            if regions.is_empty() {
                continue;
            }

            let loops: Vec<Polygon> = regions
                .iter()
                .flat_map(|region| region.loops())
                .cloned()
                .collect();
            match sink.emit(&regions) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!(cell = index, %err, loops = loops.len(), "subregion rejected");
                    failed_attempts += 1;
                    failed_polygons.extend(loops.iter().cloned());
                }
            }
            grid.cells_mut()[index].set_polygons(loops);
        }

        let report = SubregionReport {
            grid,
            handles,
            failed_attempts,
            dropped_polygons,
            skipped_roads,
            failed_polygons,
        };
        info!(
            cells = report.total_cells(),
            valid = report.valid_cells(),
            with_geometry = report.cells_with_geometry(),
            emitted = report.handles.len(),
            failed = report.failed_attempts,
            dropped = report.dropped_polygons,
            skipped_roads = report.skipped_roads,
            "subregion pipeline finished"
        );
        Ok(report)
    }

    /// Cuts the road network to one cell and removes slivers narrower than
    /// the erosion distance.
    fn clip_cell(
        &self,
        road_union: &[IntPath],
        union_bounds: &[(IntPoint, IntPoint)],
        cell: &Aabb2,
        quantizer: &Quantizer,
    ) -> Vec<IntPath> {
        let (min, max) = match (
            quantizer.quantize(&cell.corners(0.0)[0]),
            quantizer.quantize(&cell.corners(0.0)[2]),
        ) {
            (Ok(min), Ok(max)) => (min, max),
            (Err(err), _) | (_, Err(err)) => {
                warn!(%err, "cell outside the integer range");
                return Vec::new();
            }
        };
        let rect = vec![PolygonClipper::rectangle(min, max)];

        // Rings whose bounds miss the cell cannot wind around any of it.
        let local: Vec<IntPath> = road_union
            .iter()
            .zip(union_bounds)
            .filter(|(_, (lo, hi))| {
                lo.x <= max.x && min.x <= hi.x && lo.y <= max.y && min.y <= hi.y
            })
            .map(|(ring, _)| ring.clone())
            .collect();
        if local.is_empty() {
            return Vec::new();
        }

        #[allow(clippy::cast_precision_loss)]
        let (erosion, dilation) = (
            quantizer.erosion_delta() as f64,
            quantizer.dilation_delta() as f64,
        );
        let candidate = self.clipper.intersect(&local, &rect);
        let negative = self.clipper.intersect(&rect, &candidate);
        let eroded = self.clipper.offset(&negative, -erosion);
        let restored = self.clipper.offset(&eroded, dilation);
        self.clipper.intersect(&restored, &rect)
    }
}

/// Dequantizes one ring at `z = 0` and runs the cleanup preset on it.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if fewer than 3 points survive, or a
/// `ConfigError` from the cleanup parameters.
fn clean_loop(cleanup: &Pipeline, quantizer: &Quantizer, ring: &[IntPoint]) -> Result<Polygon> {
    let raw = Polygon::with_closed(quantizer.dequantize_polygon(ring, 0.0), true);
    let polygon = cleanup.run(&raw)?;
    if !polygon.is_realizable() {
        return Err(GeometryError::Degenerate(format!(
            "{} of {} points left after cleanup",
            polygon.len(),
            ring.len()
        ))
        .into());
    }
    Ok(polygon)
}

fn ring_bounds(ring: &[IntPoint]) -> (IntPoint, IntPoint) {
    ring.iter().fold(
        (IntPoint::new(i64::MAX, i64::MAX), IntPoint::new(i64::MIN, i64::MIN)),
        |(lo, hi), p| {
            (
                IntPoint::new(lo.x.min(p.x), lo.y.min(p.y)),
                IntPoint::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{ConstructionError, ProbeError};
    use crate::math::Point3;
    use crate::pipeline::{RegionId, RegionStore, SubregionParams};
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from_raw(vec![
            Point3::new(x0, y0, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x0, y1, 0.0),
            Point3::new(x0, y0, 0.0),
        ])
    }

    fn on_terrain(_: &Point3) -> std::result::Result<bool, ProbeError> {
        Ok(true)
    }

    fn pipeline(target: f64) -> SubregionPipeline {
        SubregionPipeline::new(SubregionParams::with_cell_size(target)).unwrap()
    }

    /// Rejects every second subregion.
    struct FlakySink {
        calls: usize,
        store: RegionStore,
    }

    impl BoundarySink for FlakySink {
        type Handle = RegionId;

        fn emit(
            &mut self,
            regions: &[RegionBoundary],
        ) -> std::result::Result<RegionId, ConstructionError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(ConstructionError::Rejected("flaky".into()));
            }
            self.store.emit(regions)
        }
    }

    #[test]
    fn disjoint_squares_come_back_per_cell() {
        let roads = vec![square(0.0, 0.0, 10.0, 10.0), square(20.0, 0.0, 30.0, 10.0)];
        let mut store = RegionStore::new();
        let report = pipeline(10.0).run(&roads, &on_terrain, &mut store).unwrap();

        assert_eq!(report.grid_dimensions(), (3, 1));
        assert_eq!(report.valid_cells(), 3);
        assert_eq!(report.handles.len(), 2);
        assert_eq!(report.cells_with_geometry(), 2);
        assert_eq!(report.failed_attempts, 0);
        assert!(report.grid.cell(1, 0).unwrap().polygons().is_empty());

        for (handle, expected_min_x) in report.handles.iter().zip([0.0, 20.0]) {
            let regions = store.get(*handle).unwrap();
            assert_eq!(regions.len(), 1);
            assert!(regions[0].holes.is_empty());
            let outer = &regions[0].outer;
            assert_eq!(outer.len(), 4);
            let bounds = outer.bounds().unwrap();
            assert_relative_eq!(bounds.min_x, expected_min_x, epsilon = 1e-4);
            assert_relative_eq!(bounds.max_x, expected_min_x + 10.0, epsilon = 1e-4);
            assert_relative_eq!(bounds.min_y, 0.0, epsilon = 1e-4);
            assert_relative_eq!(bounds.max_y, 10.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn cells_are_smaller_than_target() {
        let roads = vec![square(0.0, 0.0, 25.0, 10.0)];
        let mut store = RegionStore::new();
        let report = pipeline(10.0).run(&roads, &on_terrain, &mut store).unwrap();

        assert_eq!(report.grid_dimensions(), (3, 1));
        let (w, h) = report.grid.cell_size();
        assert_relative_eq!(w, 8.333_333_333_333_334, epsilon = 1e-9);
        assert_relative_eq!(h, 10.0);
        assert_eq!(report.handles.len(), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn sink_failures_are_counted_and_retained() {
        let roads = vec![square(0.0, 0.0, 25.0, 10.0)];
        let mut sink = FlakySink {
            calls: 0,
            store: RegionStore::new(),
        };
        let report = pipeline(10.0).run(&roads, &on_terrain, &mut sink).unwrap();

        assert_eq!(sink.calls, 3);
        assert_eq!(report.handles.len(), 2);
        assert_eq!(report.failed_attempts, 1);
        assert_eq!(report.failed_polygons.len(), 1);
        assert_eq!(report.cells_with_geometry(), 3);
    }

    #[test]
    fn off_terrain_cells_are_skipped() {
        let roads = vec![square(0.0, 0.0, 10.0, 10.0), square(20.0, 0.0, 30.0, 10.0)];
        let probe = |p: &Point3| -> std::result::Result<bool, ProbeError> { Ok(p.x <= 20.0) };
        let mut store = RegionStore::new();
        let report = pipeline(10.0).run(&roads, &probe, &mut store).unwrap();

        assert_eq!(report.valid_cells(), 2);
        assert_eq!(report.handles.len(), 1);
        assert!(report.grid.cell(2, 0).unwrap().polygons().is_empty());
    }

    #[test]
    fn degenerate_and_overflowing_roads_are_skipped() {
        let roads = vec![
            square(0.0, 0.0, 10.0, 10.0),
            Polygon::from_raw(vec![
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.1, 1.0, 0.0),
                Point3::new(1.1, 1.1, 0.0),
            ]),
            square(1.0e11, 0.0, 1.0e11 + 10.0, 10.0),
        ];
        let mut store = RegionStore::new();
        let report = pipeline(6.0e10).run(&roads, &on_terrain, &mut store).unwrap();

        assert_eq!(report.skipped_roads, 2);
        assert_eq!(report.grid_dimensions(), (2, 1));
        assert_eq!(report.handles.len(), 1);
    }

    #[test]
    fn fatal_errors_are_input_and_config_only() {
        let mut store = RegionStore::new();
        assert!(matches!(
            pipeline(10.0).run(&[], &on_terrain, &mut store),
            Err(SiteError::Input(InputError::Empty))
        ));

        let line = vec![Polygon::from_raw(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
        ])];
        assert!(matches!(
            pipeline(10.0).run(&line, &on_terrain, &mut store),
            Err(SiteError::Input(InputError::ZeroArea { .. }))
        ));

        assert!(matches!(
            SubregionPipeline::new(SubregionParams::with_cell_size(0.0)),
            Err(SiteError::Config(_))
        ));
    }

    #[test]
    fn thin_slivers_are_removed_by_the_offset_pass() {
        // A 15 cm wide spur off a 10 m block disappears, the block survives.
        let roads = vec![
            square(0.0, 0.0, 10.0, 10.0),
            square(10.0, 4.0, 18.0, 4.15),
        ];
        let mut params = SubregionParams::with_cell_size(20.0);
        params.process.proximity = 0.01;
        let mut store = RegionStore::new();
        let report = SubregionPipeline::new(params)
            .unwrap()
            .run(&roads, &on_terrain, &mut store)
            .unwrap();

        assert_eq!(report.grid_dimensions(), (1, 1));
        assert_eq!(report.skipped_roads, 0);

        assert_eq!(report.handles.len(), 1);
        let bounds = store.get(report.handles[0]).unwrap()[0].outer.bounds().unwrap();
        assert!(bounds.max_x < 10.01);
    }

    #[test]
    fn ring_road_is_one_subregion_with_a_hole() {
        let roads = vec![square(0.0, 0.0, 30.0, 30.0), square(10.0, 10.0, 20.0, 20.0)];
        let mut store = RegionStore::new();
        let report = pipeline(50.0).run(&roads, &on_terrain, &mut store).unwrap();

        assert_eq!(report.grid_dimensions(), (1, 1));
        assert_eq!(report.handles.len(), 1);
        assert_eq!(report.dropped_polygons, 0);
        assert_eq!(report.grid.cell(0, 0).unwrap().polygons().len(), 2);

        let regions = store.get(report.handles[0]).unwrap();
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.holes.len(), 1);
        assert_relative_eq!(region.outer.signed_area(), 900.0, epsilon = 1e-6);
        assert_relative_eq!(region.holes[0].signed_area(), -100.0, epsilon = 1e-2);
        assert_relative_eq!(region.area(), 800.0, epsilon = 1e-2);
    }

    #[test]
    fn rejected_cell_keeps_all_its_loops() {
        let roads = vec![square(0.0, 0.0, 30.0, 30.0), square(10.0, 10.0, 20.0, 20.0)];
        let mut sink = FlakySink {
            calls: 1,
            store: RegionStore::new(),
        };
        let report = pipeline(50.0).run(&roads, &on_terrain, &mut sink).unwrap();

        assert_eq!(sink.calls, 2);
        assert!(report.handles.is_empty());
        assert_eq!(report.failed_attempts, 1);
        assert_eq!(report.failed_polygons.len(), 2);
    }

    #[test]
    fn collapsed_loops_are_degenerate() {
        let quantizer = Quantizer::default();
        let cleanup = Pipeline::region_cleanup(0.5, 4.0_f64.to_radians());
        let tiny = vec![IntPoint::new(0, 0), IntPoint::new(10_000, 0), IntPoint::new(0, 10_000)];
        assert!(matches!(
            clean_loop(&cleanup, &quantizer, &tiny),
            Err(SiteError::Geometry(GeometryError::Degenerate(_)))
        ));

        let block = PolygonClipper::rectangle(IntPoint::new(0, 0), IntPoint::new(500_000, 500_000));
        let polygon = clean_loop(&cleanup, &quantizer, &block).unwrap();
        assert_eq!(polygon.len(), 4);
    }
}
