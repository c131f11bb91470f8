//! Common test fixtures for urban-atlas tests.
//!
//! This module provides canned geometries and layer builders that
//! represent the usual shapes of municipal, land-use and point data.

use atlas_common::{Attributes, Crs, Feature, FeatureLayer, SourceFeature, SourceLayer};
use geo::{polygon, Geometry, Polygon};
use geojson::{Geometry as GeoJsonGeometry, Position, Value as GeoJsonValue};
use serde_json::Value;

/// Common bounding boxes as (min_x, min_y, max_x, max_y) in degrees.
pub mod bbox {
    /// Default viewport around Jundiaí, SP
    pub const JUNDIAI: (f64, f64, f64, f64) = (-47.2, -23.3, -46.7, -23.0);

    /// Unit box at the origin
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 0.0, 1.0, 1.0);
}

/// Axis-aligned rectangle polygon.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ]
}

/// Square polygon with its lower-left corner at (x, y).
pub fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    rectangle(x, y, x + size, y + size)
}

/// Self-intersecting "figure eight" polygon over the unit square.
///
/// The ring crosses itself at (0.5, 0.5), so it is topologically invalid
/// although it encloses two valid triangles.
pub fn bowtie() -> Polygon<f64> {
    polygon![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 1.0, y: 0.0),
        (x: 0.0, y: 1.0),
        (x: 0.0, y: 0.0),
    ]
}

/// Attribute map from a JSON object literal; non-objects give an empty map.
pub fn props(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// Source polygon with one ring, optionally carrying an elevation ordinate.
pub fn raw_rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64, z: Option<f64>) -> GeoJsonGeometry {
    let pos = |x: f64, y: f64| -> Position {
        match z {
            Some(z) => vec![x, y, z],
            None => vec![x, y],
        }
    };
    GeoJsonGeometry::new(GeoJsonValue::Polygon(vec![vec![
        pos(min_x, min_y),
        pos(max_x, min_y),
        pos(max_x, max_y),
        pos(min_x, max_y),
        pos(min_x, min_y),
    ]]))
}

/// Source polygon from explicit rings of raw positions.
pub fn raw_polygon(rings: &[&[(f64, f64)]]) -> GeoJsonGeometry {
    GeoJsonGeometry::new(GeoJsonValue::Polygon(
        rings
            .iter()
            .map(|ring| ring.iter().map(|&(x, y)| vec![x, y]).collect())
            .collect(),
    ))
}

/// Source point from raw ordinates.
pub fn raw_point(ordinates: &[f64]) -> GeoJsonGeometry {
    GeoJsonGeometry::new(GeoJsonValue::Point(ordinates.to_vec()))
}

/// Build a source layer as a reader would supply it.
pub fn source_layer(
    path: &str,
    declared_crs: Option<&str>,
    features: Vec<(Option<GeoJsonGeometry>, Value)>,
) -> SourceLayer {
    let name = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    SourceLayer {
        name,
        path: path.to_string(),
        declared_crs: declared_crs.map(str::to_string),
        features: features
            .into_iter()
            .map(|(geometry, properties)| SourceFeature {
                geometry,
                properties: props(properties),
            })
            .collect(),
    }
}

/// Build an already-normalized layer in WGS84.
pub fn feature_layer(path: &str, features: Vec<(Geometry<f64>, Value)>) -> FeatureLayer {
    let name = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    FeatureLayer::new(
        name,
        path,
        Crs::WGS84,
        features
            .into_iter()
            .map(|(geometry, properties)| Feature::new(geometry, props(properties)))
            .collect(),
    )
}

/// Normalized layer holding a single rectangle with the given extent.
pub fn extent_layer(path: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> FeatureLayer {
    feature_layer(
        path,
        vec![(rectangle(min_x, min_y, max_x, max_y).into(), Value::Null)],
    )
}
