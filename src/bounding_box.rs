use crate::error::{Result, TileGridError};
use crate::layer::{Feature, VectorLayer};
use geo::{coord, Geometry, Rect};
use log::debug;

/// Axis-aligned rectangle in a projected coordinate reference system
///
/// Invariant: `x_min < x_max` and `y_min < y_max`, enforced on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x_min: i32,
    y_min: i32,
    x_max: i32,
    y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Result<Self> {
        if x_min >= x_max || y_min >= y_max {
            return Err(TileGridError::InvalidBoundingBox {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    pub fn x_min(&self) -> i32 {
        self.x_min
    }

    pub fn y_min(&self) -> i32 {
        self.y_min
    }

    pub fn x_max(&self) -> i32 {
        self.x_max
    }

    pub fn y_max(&self) -> i32 {
        self.y_max
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// Expands the box outward so all four edges lie on multiples of `step`.
    ///
    /// The minimum corner is rounded down and the maximum corner up, so the
    /// result always contains the original box. Edges already on the grid
    /// are kept, which makes the operation idempotent. Uses the Euclidean
    /// remainder so negative coordinates round away from zero.
    pub fn quantize(&self, step: i32) -> Result<Self> {
        let (x_min, y_min, x_max, y_max) = self.quantized_corners(step)?;
        debug!(
            "Quantized ({}, {}, {}, {}) to ({}, {}, {}, {}) with step {}",
            self.x_min, self.y_min, self.x_max, self.y_max, x_min, y_min, x_max, y_max, step
        );
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// In-place form of [`quantize`](Self::quantize), same numeric results
    pub fn quantize_in_place(&mut self, step: i32) -> Result<()> {
        *self = self.quantize(step)?;
        Ok(())
    }

    fn quantized_corners(&self, step: i32) -> Result<(i32, i32, i32, i32)> {
        if step < 1 {
            return Err(TileGridError::InvalidQuantizeStep(step));
        }
        let x_min = self.x_min - self.x_min.rem_euclid(step);
        let y_min = self.y_min - self.y_min.rem_euclid(step);
        let x_max = self.x_max + (step - self.x_max.rem_euclid(step)).rem_euclid(step);
        let y_max = self.y_max + (step - self.y_max.rem_euclid(step)).rem_euclid(step);
        Ok((x_min, y_min, x_max, y_max))
    }

    /// Single-feature vector layer holding the box polygon
    pub fn to_layer(&self, epsg_code: u32) -> VectorLayer {
        let polygon = Rect::new(
            coord! { x: f64::from(self.x_min), y: f64::from(self.y_min) },
            coord! { x: f64::from(self.x_max), y: f64::from(self.y_max) },
        )
        .to_polygon();
        VectorLayer::new(vec![Feature::new(Geometry::Polygon(polygon))], epsg_code)
    }
}

impl From<BoundingBox> for (i32, i32, i32, i32) {
    fn from(bounding_box: BoundingBox) -> Self {
        (
            bounding_box.x_min,
            bounding_box.y_min,
            bounding_box.x_max,
            bounding_box.y_max,
        )
    }
}

impl TryFrom<(i32, i32, i32, i32)> for BoundingBox {
    type Error = TileGridError;

    fn try_from(corners: (i32, i32, i32, i32)) -> Result<Self> {
        Self::new(corners.0, corners.1, corners.2, corners.3)
    }
}

impl<'a> IntoIterator for &'a BoundingBox {
    type Item = i32;
    type IntoIter = std::array::IntoIter<i32, 4>;

    /// Iterates the corners in `(x_min, y_min, x_max, y_max)` order
    fn into_iter(self) -> Self::IntoIter {
        [self.x_min, self.y_min, self.x_max, self.y_max].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let bounding_box = BoundingBox::new(-128, -128, 128, 128).unwrap();
        assert_eq!(bounding_box.width(), 256);
        assert_eq!(bounding_box.height(), 256);
    }

    #[test]
    fn test_new_rejects_inverted_y() {
        let result = BoundingBox::new(0, 0, 10, -5);
        assert_eq!(
            result,
            Err(TileGridError::InvalidBoundingBox {
                x_min: 0,
                y_min: 0,
                x_max: 10,
                y_max: -5,
            })
        );
    }

    #[test]
    fn test_new_rejects_degenerate_x() {
        assert!(BoundingBox::new(10, 0, 10, 5).is_err());
    }

    #[test]
    fn test_quantize_expands_outward() {
        let bounding_box = BoundingBox::new(-130, -130, 129, 129).unwrap();
        let quantized = bounding_box.quantize(128).unwrap();
        let corners: (i32, i32, i32, i32) = quantized.into();
        assert_eq!(corners, (-256, -256, 256, 256));
    }

    #[test]
    fn test_quantize_keeps_aligned_edges() {
        let bounding_box = BoundingBox::new(-128, -128, 128, 128).unwrap();
        let quantized = bounding_box.quantize(128).unwrap();
        assert_eq!(quantized, bounding_box);
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let bounding_box = BoundingBox::new(-363, 27, 1001, 1984).unwrap();
        let once = bounding_box.quantize(128).unwrap();
        let twice = once.quantize(128).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_quantize_contains_original() {
        let bounding_box = BoundingBox::new(-363, 27, 1001, 1984).unwrap();
        let quantized = bounding_box.quantize(100).unwrap();
        assert!(quantized.x_min() <= bounding_box.x_min());
        assert!(quantized.y_min() <= bounding_box.y_min());
        assert!(quantized.x_max() >= bounding_box.x_max());
        assert!(quantized.y_max() >= bounding_box.y_max());
        assert_eq!(quantized.width() % 100, 0);
        assert_eq!(quantized.height() % 100, 0);
    }

    #[test]
    fn test_quantize_in_place_matches_out_of_place() {
        let bounding_box = BoundingBox::new(-130, -130, 129, 129).unwrap();
        let out_of_place = bounding_box.quantize(128).unwrap();
        let mut in_place = bounding_box;
        in_place.quantize_in_place(128).unwrap();
        assert_eq!(in_place, out_of_place);
    }

    #[test]
    fn test_quantize_rejects_non_positive_step() {
        let bounding_box = BoundingBox::new(0, 0, 10, 10).unwrap();
        assert_eq!(
            bounding_box.quantize(0),
            Err(TileGridError::InvalidQuantizeStep(0))
        );
        assert_eq!(
            bounding_box.quantize(-128),
            Err(TileGridError::InvalidQuantizeStep(-128))
        );
    }

    #[test]
    fn test_to_layer() {
        let bounding_box = BoundingBox::new(-128, -128, 128, 128).unwrap();
        let layer = bounding_box.to_layer(25832);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.epsg_code, 25832);
    }

    #[test]
    fn test_tuple_round_trip() {
        let bounding_box = BoundingBox::try_from((-128, -128, 128, 128)).unwrap();
        let corners: (i32, i32, i32, i32) = bounding_box.into();
        assert_eq!(corners, (-128, -128, 128, 128));
    }

    #[test]
    fn test_iterates_corners_in_order() {
        let bounding_box = BoundingBox::new(-128, -64, 128, 256).unwrap();
        let corners: Vec<i32> = (&bounding_box).into_iter().collect();
        assert_eq!(corners, vec![-128, -64, 128, 256]);
    }
}
