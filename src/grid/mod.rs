//! Regular partitioning of a site bounding box into rectangular cells.

use tracing::{debug, warn};

use crate::error::{ConfigError, InputError, ProbeError, Result};
use crate::geometry::Polygon;
use crate::math::polygon_2d::Aabb2;
use crate::math::Point3;

/// Largest number of cells a grid may have.
pub const MAX_CELLS: usize = 1 << 22;

/// Answers whether a planar location lies on the terrain.
///
/// An `Err` means the probe could not answer; callers treat it like `false`.
pub trait TerrainProbe {
    /// # Errors
    ///
    /// Returns [`ProbeError::Unavailable`] if the terrain cannot be queried.
    fn probe(&self, point: &Point3) -> std::result::Result<bool, ProbeError>;
}

impl<F> TerrainProbe for F
where
    F: Fn(&Point3) -> std::result::Result<bool, ProbeError>,
{
    fn probe(&self, point: &Point3) -> std::result::Result<bool, ProbeError> {
        self(point)
    }
}

/// One rectangular cell of a [`RegionGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    column: usize,
    row: usize,
    bounds: Aabb2,
    valid: bool,
    polygons: Vec<Polygon>,
}

impl GridCell {
    /// `(column, row)` of the cell, counted from the minimum corner.
    #[must_use]
    pub fn index(&self) -> (usize, usize) {
        (self.column, self.row)
    }

    #[must_use]
    pub fn bounds(&self) -> &Aabb2 {
        &self.bounds
    }

    /// Whether all four corners were reported on the terrain.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Region polygons produced for this cell.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub(crate) fn set_polygons(&mut self, polygons: Vec<Polygon>) {
        self.polygons = polygons;
    }

    /// The cell outline as a closed counter-clockwise polygon at `z = 0`.
    #[must_use]
    pub fn rectangle(&self) -> Polygon {
        Polygon::with_closed(self.bounds.corners(0.0).to_vec(), true)
    }
}

/// A grid of equally sized cells exactly covering a bounding box.
///
/// Cell counts are `ceil(extent / target)` per axis, so the actual cell size
/// is `extent / count` and never exceeds the target. Neighbouring cells share
/// the same boundary value: each grid line is computed once.
#[derive(Debug, Clone)]
pub struct RegionGrid {
    bounds: Aabb2,
    target: f64,
    xs: Vec<f64>,
    ys: Vec<f64>,
    cells: Vec<GridCell>,
}

impl RegionGrid {
    /// Partitions `bounds` into cells of at most `target` per side.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NonPositive` if `target` is not positive and finite
    /// - `ConfigError::TooManyCells` if the grid would exceed [`MAX_CELLS`]
    /// - `InputError::ZeroArea` if either extent of `bounds` is not positive
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn build(bounds: Aabb2, target: f64) -> Result<Self> {
        if !(target.is_finite() && target > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "target cell size",
                value: target,
            }
            .into());
        }
        let (width, height) = (bounds.width(), bounds.height());
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(InputError::ZeroArea { width, height }.into());
        }

        let columns = (width / target).ceil().max(1.0);
        let rows = (height / target).ceil().max(1.0);
        if columns * rows > MAX_CELLS as f64 {
            return Err(ConfigError::TooManyCells {
                target,
                cells: columns * rows,
                limit: MAX_CELLS,
            }
            .into());
        }
        let (x_count, y_count) = (columns as usize, rows as usize);
        let xs = grid_lines(bounds.min_x, bounds.max_x, x_count);
        let ys = grid_lines(bounds.min_y, bounds.max_y, y_count);

        let mut cells = Vec::with_capacity(x_count * y_count);
        for row in 0..y_count {
            for column in 0..x_count {
                cells.push(GridCell {
                    column,
                    row,
                    bounds: Aabb2::new(xs[column], ys[row], xs[column + 1], ys[row + 1]),
                    valid: false,
                    polygons: Vec::new(),
                });
            }
        }

        debug!(x_count, y_count, width, height, target, "built region grid");
        Ok(Self {
            bounds,
            target,
            xs,
            ys,
            cells,
        })
    }

    #[must_use]
    pub fn bounds(&self) -> &Aabb2 {
        &self.bounds
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn x_count(&self) -> usize {
        self.xs.len() - 1
    }

    #[must_use]
    pub fn y_count(&self) -> usize {
        self.ys.len() - 1
    }

    /// Actual `(width, height)` of every cell.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.bounds.width() / self.x_count() as f64,
            self.bounds.height() / self.y_count() as f64,
        )
    }

    /// Cells in row-major order starting from the minimum corner.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [GridCell] {
        &mut self.cells
    }

    #[must_use]
    pub fn cell(&self, column: usize, row: usize) -> Option<&GridCell> {
        if column >= self.x_count() || row >= self.y_count() {
            return None;
        }
        self.cells.get(row * self.x_count() + column)
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.valid).count()
    }

    /// Marks each cell valid iff all four of its corners probe `true`.
    ///
    /// Every grid node is probed once; an unavailable probe counts as
    /// `false`. Returns the number of valid cells.
    pub fn probe_cells<P: TerrainProbe + ?Sized>(&mut self, probe: &P) -> usize {
        let stride = self.xs.len();
        let mut on_terrain = Vec::with_capacity(stride * self.ys.len());
        for &y in &self.ys {
            for &x in &self.xs {
                let point = Point3::new(x, y, 0.0);
                let answer = probe.probe(&point).unwrap_or_else(|err| {
                    warn!(x, y, %err, "terrain probe failed, treating corner as off-terrain");
                    false
                });
                on_terrain.push(answer);
            }
        }

        for cell in &mut self.cells {
            let (c, r) = (cell.column, cell.row);
            cell.valid = on_terrain[r * stride + c]
                && on_terrain[r * stride + c + 1]
                && on_terrain[(r + 1) * stride + c]
                && on_terrain[(r + 1) * stride + c + 1];
        }
        let valid = self.valid_count();
        debug!(valid, total = self.cells.len(), "probed grid cells");
        valid
    }
}

/// `count + 1` line positions from `min` to `max`, the last one exactly `max`.
#[allow(clippy::cast_precision_loss)]
fn grid_lines(min: f64, max: f64, count: usize) -> Vec<f64> {
    let step = (max - min) / count as f64;
    (0..=count)
        .map(|i| if i == count { max } else { min + step * i as f64 })
        .collect()
}
