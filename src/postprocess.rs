use crate::error::{Result, TileGridError};
use crate::layer::{AttributeValue, Feature, VectorLayer};
use geo::{
    Area, BooleanOps, Geometry, Intersects, LineString, MultiLineString, MultiPolygon, Polygon,
    SimplifyVwPreserve,
};
use log::debug;
use std::collections::BTreeMap;

/// Refines an already-produced vector layer
///
/// Transforms are geometry-preserving or row-count-reducing, never
/// row-adding, and never mutate their input layer.
pub trait GeodataPostprocessor: Send + Sync {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer>;
}

/// Intersects every geometry with a fixed mask layer
///
/// Geometries fully outside the mask are dropped; attributes of the
/// survivors are kept.
pub struct ClipPostprocessor {
    mask: MultiPolygon<f64>,
    epsg_code: u32,
}

impl ClipPostprocessor {
    pub fn new(mask: VectorLayer) -> Self {
        let mask_union = union_polygons(&mask);
        Self {
            mask: mask_union,
            epsg_code: mask.epsg_code,
        }
    }
}

/// Dissolves the polygonal parts of a layer into one multipolygon
fn union_polygons(layer: &VectorLayer) -> MultiPolygon<f64> {
    let mut result = MultiPolygon::new(Vec::new());
    for geometry in layer.geometries() {
        let part = match geometry {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon.clone()]),
            Geometry::MultiPolygon(multi_polygon) => multi_polygon.clone(),
            _ => continue,
        };
        result = if result.0.is_empty() {
            part
        } else {
            result.union(&part)
        };
    }
    result
}

impl GeodataPostprocessor for ClipPostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        if layer.epsg_code != self.epsg_code {
            return Err(TileGridError::CrsMismatch {
                expected: self.epsg_code,
                actual: layer.epsg_code,
            });
        }

        let features = layer
            .features
            .iter()
            .filter_map(|feature| {
                clip_geometry(&feature.geometry, &self.mask).map(|geometry| Feature {
                    geometry,
                    attributes: feature.attributes.clone(),
                })
            })
            .collect::<Vec<_>>();
        debug!("Clip kept {} of {} features", features.len(), layer.len());
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

fn clip_geometry(geometry: &Geometry<f64>, mask: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => {
            clip_polygonal(&MultiPolygon::new(vec![polygon.clone()]), mask)
        }
        Geometry::MultiPolygon(multi_polygon) => clip_polygonal(multi_polygon, mask),
        Geometry::LineString(line_string) => {
            clip_lineal(&MultiLineString::new(vec![line_string.clone()]), mask)
        }
        Geometry::MultiLineString(multi_line_string) => clip_lineal(multi_line_string, mask),
        other => {
            if other.intersects(mask) {
                Some(other.clone())
            } else {
                None
            }
        }
    }
}

fn clip_polygonal(
    multi_polygon: &MultiPolygon<f64>,
    mask: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    let clipped = multi_polygon.intersection(mask);
    if clipped.0.is_empty() {
        None
    } else if clipped.0.len() == 1 {
        let polygon = clipped.0.into_iter().next()?;
        Some(Geometry::Polygon(polygon))
    } else {
        Some(Geometry::MultiPolygon(clipped))
    }
}

fn clip_lineal(
    multi_line_string: &MultiLineString<f64>,
    mask: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    let clipped = mask.clip(multi_line_string, false);
    if clipped.0.is_empty() {
        None
    } else if clipped.0.len() == 1 {
        let line_string = clipped.0.into_iter().next()?;
        Some(Geometry::LineString(line_string))
    } else {
        Some(Geometry::MultiLineString(clipped))
    }
}

/// Removes interior rings whose enclosed area is below `max_area`
#[derive(Debug, Clone, Copy)]
pub struct FillPostprocessor {
    max_area: f64,
}

impl FillPostprocessor {
    pub fn new(max_area: f64) -> Self {
        Self { max_area }
    }

    fn fill_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        let interiors: Vec<LineString<f64>> = polygon
            .interiors()
            .iter()
            .filter(|ring| ring_area(ring) >= self.max_area)
            .cloned()
            .collect();
        Polygon::new(polygon.exterior().clone(), interiors)
    }
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), Vec::new()).unsigned_area()
}

impl GeodataPostprocessor for FillPostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let features = layer
            .features
            .iter()
            .map(|feature| {
                let geometry = match &feature.geometry {
                    Geometry::Polygon(polygon) => Geometry::Polygon(self.fill_polygon(polygon)),
                    Geometry::MultiPolygon(multi_polygon) => Geometry::MultiPolygon(
                        MultiPolygon::new(
                            multi_polygon
                                .0
                                .iter()
                                .map(|polygon| self.fill_polygon(polygon))
                                .collect(),
                        ),
                    ),
                    other => other.clone(),
                };
                Feature {
                    geometry,
                    attributes: feature.attributes.clone(),
                }
            })
            .collect();
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

/// Drops whole features whose geometry area is below `min_area`
#[derive(Debug, Clone, Copy)]
pub struct SievePostprocessor {
    min_area: f64,
}

impl SievePostprocessor {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }
}

impl GeodataPostprocessor for SievePostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let features: Vec<Feature> = layer
            .features
            .iter()
            .filter(|feature| feature.geometry.unsigned_area() >= self.min_area)
            .cloned()
            .collect();
        debug!("Sieve kept {} of {} features", features.len(), layer.len());
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

/// Topology-preserving simplification at a fixed tolerance
#[derive(Debug, Clone, Copy)]
pub struct SimplifyPostprocessor {
    tolerance: f64,
}

impl SimplifyPostprocessor {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl GeodataPostprocessor for SimplifyPostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let features = layer
            .features
            .iter()
            .map(|feature| {
                let geometry = match &feature.geometry {
                    Geometry::Polygon(polygon) => {
                        Geometry::Polygon(polygon.simplify_vw_preserve(&self.tolerance))
                    }
                    Geometry::MultiPolygon(multi_polygon) => {
                        Geometry::MultiPolygon(multi_polygon.simplify_vw_preserve(&self.tolerance))
                    }
                    Geometry::LineString(line_string) => {
                        Geometry::LineString(line_string.simplify_vw_preserve(&self.tolerance))
                    }
                    Geometry::MultiLineString(multi_line_string) => Geometry::MultiLineString(
                        multi_line_string.simplify_vw_preserve(&self.tolerance),
                    ),
                    other => other.clone(),
                };
                Feature {
                    geometry,
                    attributes: feature.attributes.clone(),
                }
            })
            .collect();
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

/// Renames attribute fields by an explicit mapping
///
/// Unmapped field names pass through unchanged.
#[derive(Debug, Clone)]
pub struct FieldNamePostprocessor {
    mapping: BTreeMap<String, String>,
}

impl FieldNamePostprocessor {
    pub fn new(mapping: BTreeMap<String, String>) -> Self {
        Self { mapping }
    }
}

impl GeodataPostprocessor for FieldNamePostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let features = layer
            .features
            .iter()
            .map(|feature| {
                let attributes = feature
                    .attributes
                    .iter()
                    .map(|(name, value)| {
                        let name = self.mapping.get(name).unwrap_or(name).clone();
                        (name, value.clone())
                    })
                    .collect();
                Feature {
                    geometry: feature.geometry.clone(),
                    attributes,
                }
            })
            .collect();
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

/// Remaps values of one attribute field by explicit old-new pairs
///
/// Unmapped values and features without the field pass through unchanged.
#[derive(Debug, Clone)]
pub struct ValuePostprocessor {
    mapping: Vec<(AttributeValue, AttributeValue)>,
    field_name: String,
}

impl ValuePostprocessor {
    pub fn new(mapping: Vec<(AttributeValue, AttributeValue)>, field_name: &str) -> Self {
        Self {
            mapping,
            field_name: field_name.to_string(),
        }
    }
}

impl GeodataPostprocessor for ValuePostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let features = layer
            .features
            .iter()
            .map(|feature| {
                let mut feature = feature.clone();
                if let Some(value) = feature.attributes.get_mut(&self.field_name) {
                    if let Some((_, new_value)) =
                        self.mapping.iter().find(|(old_value, _)| old_value == &*value)
                    {
                        *value = new_value.clone();
                    }
                }
                feature
            })
            .collect();
        Ok(VectorLayer::new(features, layer.epsg_code))
    }
}

/// Applies postprocessors strictly in list order; the empty chain is the
/// identity
///
/// Fails fast: the first stage error aborts the chain with no partial
/// result.
pub struct CompositePostprocessor {
    postprocessors: Vec<Box<dyn GeodataPostprocessor>>,
}

impl CompositePostprocessor {
    pub fn new(postprocessors: Vec<Box<dyn GeodataPostprocessor>>) -> Self {
        Self { postprocessors }
    }
}

impl GeodataPostprocessor for CompositePostprocessor {
    fn apply(&self, layer: &VectorLayer) -> Result<VectorLayer> {
        let mut current = layer.clone();
        for postprocessor in &self.postprocessors {
            current = postprocessor.apply(&current)?;
        }
        Ok(current)
    }
}
