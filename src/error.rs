use thiserror::Error;

/// Top-level error type for the site geometry core.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Errors related to degenerate geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("polygon has {count} points, at least {required} are required")]
    TooFewPoints { count: usize, required: usize },
}

/// Errors raised while mapping coordinates onto the integer grid.
#[derive(Debug, Error)]
pub enum NumericError {
    #[error("coordinate {value} does not fit the integer range at exponent {exponent}")]
    Overflow { value: f64, exponent: u32 },
}

/// The terrain probe could not answer for a point.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("terrain probe unavailable: {0}")]
    Unavailable(String),
}

/// A boundary sink refused to realize a polygon.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("boundary rejected: {0}")]
    Rejected(String),
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("quantization exponent {0} is out of range [0, 9]")]
    ExponentOutOfRange(u32),

    #[error("target cell size {target} needs {cells} cells, at most {limit} are allowed")]
    TooManyCells { target: f64, cells: f64, limit: usize },
}

/// Malformed pipeline input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no polygons were supplied")]
    Empty,

    #[error("bounding box has zero extent ({width} x {height})")]
    ZeroArea { width: f64, height: f64 },
}

/// Convenience type alias for results using [`SiteError`].
pub type Result<T> = std::result::Result<T, SiteError>;
