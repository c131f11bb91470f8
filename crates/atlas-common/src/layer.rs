//! Feature layers before and after normalization.

use geo::{BoundingRect, Geometry};
use serde_json::Value;

use crate::collection::to_geojson_geometry;
use crate::BoundingBox;

/// Attribute table row of a feature.
pub type Attributes = serde_json::Map<String, Value>;

/// A feature as supplied by the source reader.
#[derive(Debug, Clone)]
pub struct SourceFeature {
    /// Geometry with its original 2, 3 or 4 ordinates per position
    pub geometry: Option<geojson::Geometry>,
    pub properties: Attributes,
}

/// A layer as supplied by the source reader, not yet normalized.
#[derive(Debug, Clone)]
pub struct SourceLayer {
    /// Display name, usually the file stem
    pub name: String,

    /// Path or identifier the layer was read from
    pub path: String,

    /// Declared CRS identifier, `None` when the source declares nothing
    pub declared_crs: Option<String>,

    pub features: Vec<SourceFeature>,
}

/// A normalized feature: valid, two-dimensional, in the reference CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Attributes,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>, properties: Attributes) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Attribute value, treating JSON null as absent.
    pub fn attribute(&self, column: &str) -> Option<&Value> {
        self.properties.get(column).filter(|v| !v.is_null())
    }
}

/// A named, ordered sequence of normalized features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub name: String,
    pub path: String,
    pub crs: crate::Crs,
    pub features: Vec<Feature>,
}

impl FeatureLayer {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        crs: crate::Crs,
        features: Vec<Feature>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            crs,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether any feature carries the column.
    ///
    /// GeoJSON has no fixed schema, so a column counts as present as soon
    /// as one feature has the key, even with a null value.
    pub fn has_column(&self, column: &str) -> bool {
        self.features
            .iter()
            .any(|f| f.properties.contains_key(column))
    }

    /// First non-null value of a column in feature order.
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.features.iter().find_map(|f| f.attribute(column))
    }

    /// Set a column to the same value on every feature.
    pub fn set_column(&mut self, column: &str, value: Value) {
        for feature in &mut self.features {
            feature.properties.insert(column.to_string(), value.clone());
        }
    }

    /// Combined extent of every geometry, `None` for an empty layer.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .map(BoundingBox::from)
            .reduce(|acc, b| acc.union(&b))
    }
}

impl From<FeatureLayer> for SourceLayer {
    /// Hand a normalized layer back as source input, declaring its CRS.
    fn from(layer: FeatureLayer) -> Self {
        SourceLayer {
            name: layer.name,
            path: layer.path,
            declared_crs: Some(layer.crs.to_string()),
            features: layer
                .features
                .into_iter()
                .map(|f| SourceFeature {
                    geometry: Some(to_geojson_geometry(&f.geometry)),
                    properties: f.properties,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Crs;
    use geo::{point, polygon};
    use serde_json::json;

    fn props(value: Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_bounding_box_spans_all_features() {
        let layer = FeatureLayer::new(
            "test",
            "test.geojson",
            Crs::WGS84,
            vec![
                Feature::new(
                    polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)].into(),
                    Attributes::new(),
                ),
                Feature::new(point!(x: 3.0, y: -2.0).into(), Attributes::new()),
            ],
        );
        assert_eq!(
            layer.bounding_box(),
            Some(BoundingBox::new(0.0, -2.0, 3.0, 1.0))
        );
    }

    #[test]
    fn test_empty_layer_has_no_bounds() {
        let layer = FeatureLayer::new("empty", "empty.geojson", Crs::WGS84, vec![]);
        assert!(layer.bounding_box().is_none());
    }

    #[test]
    fn test_first_value_skips_nulls() {
        let layer = FeatureLayer::new(
            "years",
            "years.geojson",
            Crs::WGS84,
            vec![
                Feature::new(point!(x: 0.0, y: 0.0).into(), props(json!({"year": null}))),
                Feature::new(point!(x: 0.0, y: 0.0).into(), props(json!({"year": 2010}))),
            ],
        );
        assert!(layer.has_column("year"));
        assert_eq!(layer.first_value("year"), Some(&json!(2010)));
        assert!(layer.first_value("soil_use").is_none());
    }
}
