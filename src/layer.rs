use geo::Geometry;
use std::collections::BTreeMap;

/// Attribute value of a vector feature
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Geometry with its attribute table row
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }
}

/// Collection of features with a spatial reference
///
/// The EPSG code is carried explicitly and checked by every geospatial
/// operation that combines two layers.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub features: Vec<Feature>,
    pub epsg_code: u32,
}

impl VectorLayer {
    pub fn new(features: Vec<Feature>, epsg_code: u32) -> Self {
        Self {
            features,
            epsg_code,
        }
    }

    /// Layer with no features, keeping the spatial reference
    pub fn empty(epsg_code: u32) -> Self {
        Self {
            features: Vec::new(),
            epsg_code,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Geometries in feature order
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().map(|feature| &feature.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};

    #[test]
    fn test_feature_attributes() {
        let geometry = Geometry::Polygon(polygon![
            (x: 0., y: 0.),
            (x: 1., y: 0.),
            (x: 1., y: 1.),
            (x: 0., y: 1.),
        ]);
        let feature = Feature::new(geometry)
            .with_attribute("class", AttributeValue::Text("building".to_string()))
            .with_attribute("id", AttributeValue::Int(7));

        assert_eq!(feature.attributes.len(), 2);
        assert_eq!(
            feature.attributes.get("id"),
            Some(&AttributeValue::Int(7))
        );
    }

    #[test]
    fn test_empty_layer_keeps_epsg_code() {
        let layer = VectorLayer::empty(25832);
        assert!(layer.is_empty());
        assert_eq!(layer.len(), 0);
        assert_eq!(layer.epsg_code, 25832);
    }
}
