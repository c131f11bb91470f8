//! GeoJSON FeatureCollection documents, read and written with the
//! `geojson` crate.
//!
//! Positions are kept exactly as written (2 to 4 ordinates) on the way in,
//! so normalization decides what to drop. The legacy `crs` member and the
//! collection `name` are not part of RFC 7946 and live in the foreign
//! members.

use geojson::{FeatureCollection, GeoJson, Geometry as GeoJsonGeometry};

use crate::Feature;

/// Parse a document that must be a FeatureCollection.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, String> {
    match text.parse::<GeoJson>().map_err(|e| e.to_string())? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(_) => Err("expected a FeatureCollection, found a Feature".to_string()),
        GeoJson::Geometry(_) => Err("expected a FeatureCollection, found a bare Geometry".to_string()),
    }
}

fn foreign_member<'a>(fc: &'a FeatureCollection, key: &str) -> Option<&'a serde_json::Value> {
    fc.foreign_members.as_ref().and_then(|m| m.get(key))
}

/// CRS name declared through `{"crs": {"type": "name", "properties": {"name": ...}}}`.
pub fn declared_crs(fc: &FeatureCollection) -> Option<&str> {
    foreign_member(fc, "crs")?
        .get("properties")?
        .get("name")?
        .as_str()
}

/// The collection's `name` member, as written by GDAL.
pub fn collection_name(fc: &FeatureCollection) -> Option<&str> {
    foreign_member(fc, "name")?.as_str()
}

/// Encode a 2-D geometry as a GeoJSON geometry object.
pub fn to_geojson_geometry(geometry: &geo::Geometry<f64>) -> GeoJsonGeometry {
    GeoJsonGeometry::new(geojson::Value::from(geometry))
}

/// Encode normalized features as a FeatureCollection.
pub fn to_feature_collection<'a>(features: impl IntoIterator<Item = &'a Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features
            .into_iter()
            .map(|f| geojson::Feature {
                bbox: None,
                geometry: Some(to_geojson_geometry(&f.geometry)),
                id: None,
                properties: Some(f.properties.clone()),
                foreign_members: None,
            })
            .collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_parse_feature_collection_with_crs() {
        let json = r#"{
            "type": "FeatureCollection",
            "name": "soil_use_2023",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::31983"}},
            "features": [
                {"type": "Feature", "properties": {"soil_use": "urbano"},
                 "geometry": {"type": "Point", "coordinates": [310000.0, 7430000.0, 720.5]}},
                {"type": "Feature", "properties": null, "geometry": null}
            ]
        }"#;

        let fc = parse_feature_collection(json).unwrap();
        assert_eq!(declared_crs(&fc), Some("urn:ogc:def:crs:EPSG::31983"));
        assert_eq!(collection_name(&fc), Some("soil_use_2023"));
        assert_eq!(fc.features.len(), 2);
        assert_eq!(
            fc.features[0].geometry.as_ref().map(|g| &g.value),
            Some(&geojson::Value::Point(vec![310000.0, 7430000.0, 720.5]))
        );
        assert!(fc.features[1].geometry.is_none());
    }

    #[test]
    fn test_collection_without_crs() {
        let fc = parse_feature_collection(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(declared_crs(&fc).is_none());
        assert!(collection_name(&fc).is_none());
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let err = parse_feature_collection(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#).unwrap_err();
        assert!(err.contains("FeatureCollection"));
    }

    #[test]
    fn test_polygon_encoding_keeps_rings() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0)]],
        );
        match to_geojson_geometry(&poly.into()).value {
            geojson::Value::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                // geo closes rings
                assert_eq!(rings[0].len(), 5);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_feature_collection_serializes_properties() {
        let mut properties = crate::Attributes::new();
        properties.insert("year".to_string(), serde_json::json!(2023));
        let feature = Feature::new(geo::point!(x: -46.9, y: -23.2).into(), properties);

        let value = serde_json::to_value(to_feature_collection([&feature])).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["properties"]["year"], 2023);
        assert_eq!(value["features"][0]["geometry"]["coordinates"], serde_json::json!([-46.9, -23.2]));
    }
}
