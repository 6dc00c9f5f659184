use slotmap::SlotMap;

use crate::error::ConstructionError;
use crate::geometry::Polygon;
use crate::math::polygon_2d::try_edge;

slotmap::new_key_type! {
    /// Unique identifier for a subregion in a [`RegionStore`].
    pub struct RegionId;
}

/// One outer boundary with the holes it encloses.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    /// Counter-clockwise outer loop.
    pub outer: Polygon,
    /// Clockwise hole loops.
    pub holes: Vec<Polygon>,
}

impl RegionBoundary {
    #[must_use]
    pub fn new(outer: Polygon, holes: Vec<Polygon>) -> Self {
        Self { outer, holes }
    }

    /// The outer loop followed by the holes.
    pub fn loops(&self) -> impl Iterator<Item = &Polygon> + '_ {
        std::iter::once(&self.outer).chain(&self.holes)
    }

    /// Enclosed area: the outer loop's area minus the holes'.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| h.signed_area().abs()).sum();
        self.outer.signed_area().abs() - holes
    }
}

/// Receives the boundaries of one subregion and realizes them.
pub trait BoundarySink {
    /// What the sink hands back for a realized subregion.
    type Handle;

    /// # Errors
    ///
    /// Returns `ConstructionError::Rejected` if the boundaries cannot be
    /// realized.
    fn emit(&mut self, regions: &[RegionBoundary]) -> Result<Self::Handle, ConstructionError>;
}

/// In-memory arena of subregions, each a set of region boundaries.
#[derive(Debug, Default)]
pub struct RegionStore {
    subregions: SlotMap<RegionId, Vec<RegionBoundary>>,
}

impl RegionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: RegionId) -> Option<&[RegionBoundary]> {
        self.subregions.get(id).map(Vec::as_slice)
    }

    pub fn remove(&mut self, id: RegionId) -> Option<Vec<RegionBoundary>> {
        self.subregions.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subregions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subregions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &[RegionBoundary])> {
        self.subregions.iter().map(|(id, regions)| (id, regions.as_slice()))
    }
}

impl BoundarySink for RegionStore {
    type Handle = RegionId;

    /// Stores every loop closed. The set must not be empty, each loop needs
    /// at least 3 points and every edge, the closing one included, must be
    /// buildable.
    fn emit(&mut self, regions: &[RegionBoundary]) -> Result<RegionId, ConstructionError> {
        if regions.is_empty() {
            return Err(ConstructionError::Rejected("no boundaries".into()));
        }
        let closed: Vec<RegionBoundary> = regions
            .iter()
            .map(|region| -> Result<RegionBoundary, ConstructionError> {
                let holes = region
                    .holes
                    .iter()
                    .map(closed_loop)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RegionBoundary::new(closed_loop(&region.outer)?, holes))
            })
            .collect::<Result<_, _>>()?;
        Ok(self.subregions.insert(closed))
    }
}

fn closed_loop(boundary: &Polygon) -> Result<Polygon, ConstructionError> {
    if boundary.len() < 3 {
        return Err(ConstructionError::Rejected(format!(
            "loop has {} points",
            boundary.len()
        )));
    }
    let closed = Polygon::with_closed(boundary.points().to_vec(), true);
    if let Some(i) = closed.edges().position(|(a, b)| try_edge(a, b).is_none()) {
        return Err(ConstructionError::Rejected(format!("edge {i} is degenerate")));
    }
    Ok(closed)
}
