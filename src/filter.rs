use crate::error::{Result, TileGridError};
use crate::grid::{tile_polygon, Coordinate};
use crate::layer::VectorLayer;
use geo::Intersects;
use log::debug;
use rayon::prelude::*;
use std::collections::HashSet;

/// Prunes or validates a coordinate set
///
/// Filters never add coordinates and never mutate their input; each stage
/// returns a new collection, so one filter chain can serve concurrent
/// pipelines.
pub trait CoordinatesFilter: Send + Sync {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>>;
}

/// Removes repeated coordinate pairs, keeping the first occurrence
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicatesFilter;

impl DuplicatesFilter {
    pub fn new() -> Self {
        Self
    }
}

impl CoordinatesFilter for DuplicatesFilter {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>> {
        let mut seen = HashSet::with_capacity(coordinates.len());
        Ok(coordinates
            .iter()
            .filter(|&&coordinate| seen.insert(coordinate))
            .copied()
            .collect())
    }
}

/// Keeps coordinates where the index-aligned mask entry is true
#[derive(Debug, Clone)]
pub struct MaskFilter {
    mask: Vec<bool>,
}

impl MaskFilter {
    pub fn new(mask: Vec<bool>) -> Self {
        Self { mask }
    }
}

impl CoordinatesFilter for MaskFilter {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>> {
        if self.mask.len() != coordinates.len() {
            return Err(TileGridError::LengthMismatch {
                mask_len: self.mask.len(),
                coordinates_len: coordinates.len(),
            });
        }
        Ok(coordinates
            .iter()
            .zip(&self.mask)
            .filter(|(_, &keep)| keep)
            .map(|(&coordinate, _)| coordinate)
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFilterMode {
    Difference,
    Intersection,
    Union,
}

/// Set algebra against another coordinate set
///
/// Both inputs are treated as sets of pairs: order and duplicates within
/// each are ignored, and the result is duplicate-free. Difference and
/// intersection keep the primary input's original relative order; union
/// appends the unseen part of `other` in its order.
#[derive(Debug, Clone)]
pub struct SetFilter {
    other: Vec<Coordinate>,
    mode: SetFilterMode,
}

impl SetFilter {
    pub fn new(other: Vec<Coordinate>, mode: SetFilterMode) -> Self {
        Self { other, mode }
    }
}

impl CoordinatesFilter for SetFilter {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>> {
        let other_set: HashSet<Coordinate> = self.other.iter().copied().collect();
        let mut seen = HashSet::with_capacity(coordinates.len());
        let mut result: Vec<Coordinate> = coordinates
            .iter()
            .filter(|&&coordinate| match self.mode {
                SetFilterMode::Difference => !other_set.contains(&coordinate),
                SetFilterMode::Intersection => other_set.contains(&coordinate),
                SetFilterMode::Union => true,
            })
            .filter(|&&coordinate| seen.insert(coordinate))
            .copied()
            .collect();

        if self.mode == SetFilterMode::Union {
            result.extend(
                self.other
                    .iter()
                    .filter(|&&coordinate| seen.insert(coordinate))
                    .copied(),
            );
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeospatialFilterMode {
    Difference,
    Intersection,
}

/// Keeps coordinates by the spatial relationship of their tile to a
/// reference layer
///
/// Difference keeps tiles not overlapping the reference geometries,
/// intersection keeps tiles overlapping them. Boundary contact counts as
/// overlap.
pub struct GeospatialFilter {
    tile_size: i32,
    layer: VectorLayer,
    mode: GeospatialFilterMode,
}

impl GeospatialFilter {
    /// Fails if the tile size is not positive or the reference layer's
    /// spatial reference differs from `epsg_code`.
    pub fn new(
        tile_size: i32,
        epsg_code: u32,
        layer: VectorLayer,
        mode: GeospatialFilterMode,
    ) -> Result<Self> {
        if tile_size < 1 {
            return Err(TileGridError::InvalidTileSize(tile_size));
        }
        if layer.epsg_code != epsg_code {
            return Err(TileGridError::CrsMismatch {
                expected: epsg_code,
                actual: layer.epsg_code,
            });
        }
        Ok(Self {
            tile_size,
            layer,
            mode,
        })
    }
}

impl CoordinatesFilter for GeospatialFilter {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>> {
        // Each tile is independent; the ordered parallel map keeps the
        // row-major input order in the output.
        let survivors: Vec<Coordinate> = coordinates
            .par_iter()
            .filter_map(|&coordinate| {
                let tile = tile_polygon(coordinate, self.tile_size);
                let overlaps = self
                    .layer
                    .geometries()
                    .any(|geometry| tile.intersects(geometry));
                let keep = match self.mode {
                    GeospatialFilterMode::Difference => !overlaps,
                    GeospatialFilterMode::Intersection => overlaps,
                };
                keep.then_some(coordinate)
            })
            .collect();
        debug!(
            "Geospatial filter kept {} of {} coordinates",
            survivors.len(),
            coordinates.len()
        );
        Ok(survivors)
    }
}

/// Applies filters strictly in list order; the empty chain is the identity
///
/// Fails fast: the first stage error aborts the chain with no partial
/// result.
pub struct CompositeFilter {
    filters: Vec<Box<dyn CoordinatesFilter>>,
}

impl CompositeFilter {
    pub fn new(filters: Vec<Box<dyn CoordinatesFilter>>) -> Self {
        Self { filters }
    }
}

impl CoordinatesFilter for CompositeFilter {
    fn apply(&self, coordinates: &[Coordinate]) -> Result<Vec<Coordinate>> {
        let mut current = coordinates.to_vec();
        for filter in &self.filters {
            current = filter.apply(&current)?;
        }
        Ok(current)
    }
}
