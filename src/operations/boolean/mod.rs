mod assemble;
mod classify;
mod clipper;
mod engine;
mod select;
mod split;

pub use assemble::twice_area;
pub use clipper::{IntPath, PolygonClipper, RingGroup};
pub use engine::boolean_execute;
pub use select::{ClipOp, FillRule};
pub use split::{intersect_segments, Crossing};
