//! End-to-end site preparation: footprint cleanup and grid-partitioned
//! road subregions.

mod footprint;
mod params;
mod store;
mod subregion;

pub use footprint::{prepare_footprints, PreparedFootprints};
pub use params::{ProcessParams, SubregionParams};
pub use store::{BoundarySink, RegionBoundary, RegionId, RegionStore};
pub use subregion::{SubregionPipeline, SubregionReport};
