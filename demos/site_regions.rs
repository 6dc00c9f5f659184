//! Site region demo: a sloped terrain from contour lines, a small road
//! network, and the grid-partitioned road subregions cut from it.
//!
//! Usage:
//! ```text
//! cargo run --example site_regions
//! cargo run --example site_regions -- 25      # target cell size
//! RUST_LOG=siteprep=debug cargo run --example site_regions
//! ```

use siteprep::geometry::Polygon;
use siteprep::math::Point3;
use siteprep::pipeline::{
    prepare_footprints, RegionBoundary, RegionStore, SubregionParams, SubregionPipeline,
};
use siteprep::terrain::{ContourParams, TerrainSurface};
use siteprep::Result;

fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Polygon::from_raw(vec![
        Point3::new(x0, y0, 0.0),
        Point3::new(x1, y0, 0.0),
        Point3::new(x1, y1, 0.0),
        Point3::new(x0, y1, 0.0),
        Point3::new(x0, y0, 0.0),
    ])
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for siteprep.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("siteprep=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let target = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f64>().ok())
        .unwrap_or(50.0);

    // Contours every 20 m rising 2 m each, covering 200 x 120.
    let contours: Vec<Vec<Point3>> = (0..7)
        .map(|i| {
            let y = f64::from(i) * 20.0;
            let z = 2.0 * f64::from(i);
            vec![Point3::new(-10.0, y, z), Point3::new(210.0, y, z)]
        })
        .collect();
    let terrain = TerrainSurface::from_contours(&contours, &ContourParams::default())?;
    println!(
        "terrain: {} vertices, {} triangles, {} failed points",
        terrain.vertex_count(),
        terrain.triangle_count(),
        terrain.failed_points()
    );

    // Two crossing streets and a cul-de-sac spur.
    let roads = vec![
        rectangle(0.0, 50.0, 200.0, 62.0),
        rectangle(90.0, 0.0, 102.0, 120.0),
        rectangle(150.0, 62.0, 158.0, 100.0),
    ];
    let footprints = vec![rectangle(20.0, 10.0, 40.0, 30.0), rectangle(120.0, 80.0, 121.0, 80.2)];

    let params = SubregionParams::with_cell_size(target);
    let prepared = prepare_footprints(&footprints, &params.process)?;
    println!(
        "footprints: {} kept, {} degenerate",
        prepared.polygons.len(),
        prepared.degenerate
    );

    let mut store = RegionStore::new();
    let report = SubregionPipeline::new(params)?.run(&roads, &terrain, &mut store)?;
    let (columns, rows) = report.grid_dimensions();
    println!(
        "grid: {columns} x {rows} cells, {} valid, {} with geometry",
        report.valid_cells(),
        report.cells_with_geometry()
    );
    println!(
        "regions: {} emitted, {} failed, {} dropped, {} roads skipped",
        report.handles.len(),
        report.failed_attempts,
        report.dropped_polygons,
        report.skipped_roads
    );
    for (id, regions) in store.iter() {
        let holes: usize = regions.iter().map(|region| region.holes.len()).sum();
        let area: f64 = regions.iter().map(RegionBoundary::area).sum();
        println!(
            "  {id:?}: {} boundaries, {holes} holes, {area:.1} m2",
            regions.len()
        );
        for region in regions {
            if let Some(bounds) = region.outer.bounds() {
                println!(
                    "    {} points, [{:.2}, {:.2}] - [{:.2}, {:.2}]",
                    region.outer.len(),
                    bounds.min_x,
                    bounds.min_y,
                    bounds.max_x,
                    bounds.max_y
                );
            }
        }
    }
    Ok(())
}
