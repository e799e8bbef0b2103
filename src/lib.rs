// Library exports for testing and reuse

pub mod bounding_box;
pub mod error;
pub mod filter;
pub mod grid;
pub mod layer;
pub mod postprocess;

// Re-export commonly used types
pub use bounding_box::BoundingBox;
pub use error::{Result, TileGridError};
pub use filter::{
    CompositeFilter, CoordinatesFilter, DuplicatesFilter, GeospatialFilter, GeospatialFilterMode,
    MaskFilter, SetFilter, SetFilterMode,
};
pub use grid::{compute_coordinates, generate_grid, generate_tiles, Coordinate, GridGenerator};
pub use layer::{AttributeValue, Feature, VectorLayer};
pub use postprocess::{
    ClipPostprocessor, CompositePostprocessor, FieldNamePostprocessor, FillPostprocessor,
    GeodataPostprocessor, SievePostprocessor, SimplifyPostprocessor, ValuePostprocessor,
};
