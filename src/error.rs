use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileGridError {
    #[error("Invalid bounding box ({x_min}, {y_min}, {x_max}, {y_max}): x_min must be less than x_max and y_min less than y_max")]
    InvalidBoundingBox {
        x_min: i32,
        y_min: i32,
        x_max: i32,
        y_max: i32,
    },

    #[error("Mask length mismatch: {mask_len} mask entries for {coordinates_len} coordinates")]
    LengthMismatch {
        mask_len: usize,
        coordinates_len: usize,
    },

    #[error("CRS mismatch: expected EPSG:{expected}, got EPSG:{actual}")]
    CrsMismatch { expected: u32, actual: u32 },

    #[error("Invalid tile size: {0} (must be positive)")]
    InvalidTileSize(i32),

    #[error("Invalid quantization step: {0} (must be positive)")]
    InvalidQuantizeStep(i32),
}

pub type Result<T> = std::result::Result<T, TileGridError>;
