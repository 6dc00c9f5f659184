use crate::error::{ConfigError, Result};
use crate::math::quantize::MAX_EXPONENT;

/// Tolerances shared by the polygon simplification presets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParams {
    /// Points closer than this are merged.
    pub proximity: f64,
    /// Interior points whose turn is below this angle (radians) are removed.
    pub collinearity_angle: f64,
    /// Default densification spacing.
    pub interpolation: f64,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            proximity: 0.5,
            collinearity_angle: 4.0_f64.to_radians(),
            interpolation: 1.0,
        }
    }
}

impl ProcessParams {
    /// # Errors
    ///
    /// Returns `ConfigError::NonPositive` for a negative or non-finite
    /// tolerance, or a non-positive interpolation length.
    pub fn validate(&self) -> Result<()> {
        non_negative("proximity", self.proximity)?;
        non_negative("collinearity angle", self.collinearity_angle)?;
        positive("interpolation length", self.interpolation)
    }
}

/// Configuration of a [`SubregionPipeline`](super::SubregionPipeline) run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubregionParams {
    /// Requested side length of a grid cell. Actual cells may be smaller.
    pub target_cell_size: f64,
    /// Decimal digits kept when quantizing coordinates.
    pub exponent: u32,
    pub process: ProcessParams,
}

impl Default for SubregionParams {
    fn default() -> Self {
        Self {
            target_cell_size: 100.0,
            exponent: 5,
            process: ProcessParams::default(),
        }
    }
}

impl SubregionParams {
    /// Default parameters with the given target cell size.
    #[must_use]
    pub fn with_cell_size(target_cell_size: f64) -> Self {
        Self {
            target_cell_size,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` for a non-positive cell size, an exponent
    /// above 9, or invalid process tolerances.
    pub fn validate(&self) -> Result<()> {
        positive("target cell size", self.target_cell_size)?;
        if self.exponent > MAX_EXPONENT {
            return Err(ConfigError::ExponentOutOfRange(self.exponent).into());
        }
        self.process.validate()
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value }.into())
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value }.into())
    }
}
