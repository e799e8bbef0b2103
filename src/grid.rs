use crate::bounding_box::BoundingBox;
use crate::error::{Result, TileGridError};
use crate::layer::{Feature, VectorLayer};
use geo::{coord, Geometry, Polygon, Rect};
use log::debug;
use rayon::prelude::*;

/// Lower-left origin of one tile, in ground units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Computes the tile origins covering a bounding box in row-major order
/// (x varies fastest within a y band).
///
/// With `quantize` the box is first expanded outward to the tile grid, so
/// the tiling is aligned and covers the box exactly. Without it the box is
/// enumerated as-is and the trailing tile per axis may extend past
/// `x_max`/`y_max`; the caller accepts that overcoverage.
pub fn compute_coordinates(
    bounding_box: &BoundingBox,
    tile_size: i32,
    quantize: bool,
) -> Result<Vec<Coordinate>> {
    if tile_size < 1 {
        return Err(TileGridError::InvalidTileSize(tile_size));
    }

    let bounding_box = if quantize {
        bounding_box.quantize(tile_size)?
    } else {
        *bounding_box
    };

    let tiles_x = (bounding_box.width() + tile_size - 1) / tile_size;
    let tiles_y = (bounding_box.height() + tile_size - 1) / tile_size;
    debug!(
        "Computing coordinates: {}x{} tiles of size {} over ({}, {}, {}, {})",
        tiles_x,
        tiles_y,
        tile_size,
        bounding_box.x_min(),
        bounding_box.y_min(),
        bounding_box.x_max(),
        bounding_box.y_max()
    );

    let mut coordinates = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for y in (bounding_box.y_min()..bounding_box.y_max()).step_by(tile_size as usize) {
        for x in (bounding_box.x_min()..bounding_box.x_max()).step_by(tile_size as usize) {
            coordinates.push(Coordinate::new(x, y));
        }
    }
    Ok(coordinates)
}

/// Axis-aligned square `[x, x + tile_size] x [y, y + tile_size]`
pub(crate) fn tile_polygon(coordinate: Coordinate, tile_size: i32) -> Polygon<f64> {
    Rect::new(
        coord! { x: f64::from(coordinate.x), y: f64::from(coordinate.y) },
        coord! {
            x: f64::from(coordinate.x + tile_size),
            y: f64::from(coordinate.y + tile_size),
        },
    )
    .to_polygon()
}

/// Materializes tile polygons for the coordinates, preserving input order
pub fn generate_tiles(coordinates: &[Coordinate], tile_size: i32) -> Result<Vec<Polygon<f64>>> {
    if tile_size < 1 {
        return Err(TileGridError::InvalidTileSize(tile_size));
    }

    // Ordered parallel map, so index alignment with the input survives
    let tiles = coordinates
        .par_iter()
        .map(|&coordinate| tile_polygon(coordinate, tile_size))
        .collect();
    Ok(tiles)
}

/// Computes coordinates and materializes them into a vector layer tagged
/// with `epsg_code`
pub fn generate_grid(
    bounding_box: &BoundingBox,
    tile_size: i32,
    epsg_code: u32,
    quantize: bool,
) -> Result<VectorLayer> {
    let coordinates = compute_coordinates(bounding_box, tile_size, quantize)?;
    let tiles = generate_tiles(&coordinates, tile_size)?;
    let features = tiles
        .into_iter()
        .map(|tile| Feature::new(Geometry::Polygon(tile)))
        .collect();
    Ok(VectorLayer::new(features, epsg_code))
}

/// Binds one bounding box and spatial reference for repeated grid derivation
///
/// Holds no caches; every call recomputes from the stored bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGenerator {
    bounding_box: BoundingBox,
    epsg_code: u32,
}

impl GridGenerator {
    pub fn new(bounding_box: BoundingBox, epsg_code: u32) -> Self {
        Self {
            bounding_box,
            epsg_code,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn epsg_code(&self) -> u32 {
        self.epsg_code
    }

    pub fn compute_coordinates(&self, tile_size: i32, quantize: bool) -> Result<Vec<Coordinate>> {
        compute_coordinates(&self.bounding_box, tile_size, quantize)
    }

    pub fn generate_grid(&self, tile_size: i32, quantize: bool) -> Result<VectorLayer> {
        generate_grid(&self.bounding_box, tile_size, self.epsg_code, quantize)
    }

    /// Replaces the stored bounding box with its quantization to `step`
    pub fn quantize(&mut self, step: i32) -> Result<()> {
        self.bounding_box.quantize_in_place(step)
    }
}
