use crate::error::{ConfigError, NumericError, Result};

use super::Point3;

/// Largest magnitude a quantized coordinate may take.
///
/// Every integer up to `2^53` is exactly representable as `f64`, and the
/// clipping engine's doubled cross products of such values fit in `i128`.
pub const MAX_QUANTIZED: i64 = 1 << 53;

/// Largest supported quantization exponent.
pub const MAX_EXPONENT: u32 = 9;

/// A fixed-point coordinate pair consumed by the clipping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntPoint {
    pub x: i64,
    pub y: i64,
}

impl IntPoint {
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Maps planar coordinates onto the integer grid `floor(coord * 10^E)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    exponent: u32,
    scale: f64,
}

impl Quantizer {
    /// Creates a quantizer for the given power-of-ten exponent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ExponentOutOfRange` if `exponent > 9`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn new(exponent: u32) -> Result<Self> {
        if exponent > MAX_EXPONENT {
            return Err(ConfigError::ExponentOutOfRange(exponent).into());
        }
        Ok(Self {
            exponent,
            scale: 10f64.powi(exponent as i32),
        })
    }

    #[must_use]
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// The scale factor `10^E`.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Integer erosion distance of the cell clip idiom, `10^(E-1)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn erosion_delta(&self) -> i64 {
        (self.scale / 10.0).round() as i64
    }

    /// Integer dilation distance of the cell clip idiom, `10^(E-1) + 3`.
    #[must_use]
    pub fn dilation_delta(&self) -> i64 {
        self.erosion_delta() + 3
    }

    /// Quantizes the planar coordinates of `p`.
    ///
    /// # Errors
    ///
    /// Returns `NumericError::Overflow` if a scaled coordinate is not finite
    /// or exceeds [`MAX_QUANTIZED`].
    pub fn quantize(&self, p: &Point3) -> Result<IntPoint> {
        Ok(IntPoint::new(self.scale_axis(p.x)?, self.scale_axis(p.y)?))
    }

    /// Reconstructs a point from its quantized form, injecting `z`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn dequantize(&self, q: IntPoint, z: f64) -> Point3 {
        Point3::new(q.x as f64 / self.scale, q.y as f64 / self.scale, z)
    }

    /// Quantizes a whole sequence, failing before anything is returned if a
    /// single point is out of range.
    ///
    /// # Errors
    ///
    /// Returns `NumericError::Overflow` for the first out-of-range point.
    pub fn quantize_polygon(&self, points: &[Point3]) -> Result<Vec<IntPoint>> {
        points.iter().map(|p| self.quantize(p)).collect()
    }

    /// Dequantizes a ring at constant height `z`.
    #[must_use]
    pub fn dequantize_polygon(&self, ring: &[IntPoint], z: f64) -> Vec<Point3> {
        ring.iter().map(|&q| self.dequantize(q, z)).collect()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn scale_axis(&self, value: f64) -> Result<i64> {
        let scaled = (value * self.scale).floor();
        if !scaled.is_finite() || scaled.abs() > MAX_QUANTIZED as f64 {
            return Err(NumericError::Overflow {
                value,
                exponent: self.exponent,
            }
            .into());
        }
        Ok(scaled as i64)
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            exponent: 5,
            scale: 1e5,
        }
    }
}
