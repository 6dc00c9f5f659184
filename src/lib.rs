pub mod error;
pub mod geometry;
pub mod grid;
pub mod math;
pub mod operations;
pub mod pipeline;
pub mod terrain;

pub use error::{Result, SiteError};
