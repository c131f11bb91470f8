//! The municipal boundary overlay: selection, dissolve and styling.

use atlas_common::{AtlasError, AtlasResult, BoundingBox, Crs, Feature, FeatureLayer, PathStyle};
use geo::algorithm::bool_ops::unary_union;
use geo::{BoundingRect, Geometry, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::attributes::fix_mojibake;

/// Selects the municipality out of a boundary source by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFilter {
    pub column: String,
    pub value: String,
}

impl Default for BoundaryFilter {
    fn default() -> Self {
        Self {
            column: "NM_MUN".to_string(),
            value: "Jundiaí".to_string(),
        }
    }
}

impl BoundaryFilter {
    fn matches(&self, feature: &Feature) -> bool {
        match feature.attribute(&self.column) {
            Some(Value::String(s)) => s == &self.value || fix_mojibake(s) == self.value.as_str(),
            Some(other) => other.to_string() == self.value,
            None => false,
        }
    }
}

/// Halo and outline styles drawn around the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryStyle {
    pub halo: PathStyle,
    pub outline: PathStyle,
}

impl Default for BoundaryStyle {
    fn default() -> Self {
        Self {
            halo: PathStyle::halo(),
            outline: PathStyle::outline(),
        }
    }
}

/// The dissolved municipal footprint, drawn twice and never interactive.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryOverlay {
    /// Municipality name shown as the feature's property
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub style: BoundaryStyle,
}

impl BoundaryOverlay {
    /// Select the matching features of a normalized boundary layer and
    /// dissolve them into one footprint.
    ///
    /// With no filter every feature is used.
    pub fn from_layer(
        layer: &FeatureLayer,
        filter: Option<&BoundaryFilter>,
        style: BoundaryStyle,
    ) -> AtlasResult<Self> {
        let selected: Vec<&Feature> = match filter {
            Some(filter) => layer.features.iter().filter(|f| filter.matches(f)).collect(),
            None => layer.features.iter().collect(),
        };

        if let Some(filter) = filter {
            if selected.is_empty() {
                return Err(AtlasError::BoundaryNotFound {
                    path: layer.path.clone(),
                    column: filter.column.clone(),
                    value: filter.value.clone(),
                });
            }
        }

        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        for feature in &selected {
            collect_polygons(&feature.geometry, &mut polygons);
        }
        let pieces = polygons.len();
        let geometry = if pieces > 1 {
            unary_union(polygons.iter())
        } else {
            MultiPolygon::new(polygons)
        };

        if geometry.0.is_empty() {
            return Err(AtlasError::EmptyBoundary {
                path: layer.path.clone(),
            });
        }

        let name = filter
            .map(|f| f.value.clone())
            .unwrap_or_else(|| layer.name.clone());
        info!(
            boundary = %name,
            features = selected.len(),
            pieces = pieces,
            polygons = geometry.0.len(),
            "Dissolved boundary"
        );

        Ok(Self {
            name,
            geometry,
            style,
        })
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.geometry.bounding_rect().map(BoundingBox::from)
    }

    /// The footprint as a one-feature layer, for extent computations.
    pub fn to_layer(&self) -> FeatureLayer {
        let mut properties = atlas_common::Attributes::new();
        properties.insert("name".to_string(), Value::String(self.name.clone()));
        FeatureLayer::new(
            self.name.clone(),
            String::new(),
            Crs::WGS84,
            vec![Feature::new(Geometry::MultiPolygon(self.geometry.clone()), properties)],
        )
    }
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p.clone()),
        Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                collect_polygons(g, out);
            }
        }
        other => debug!(geometry = ?other, "Ignoring non-polygonal boundary geometry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::Color;
    use geo::{point, Area};
    use serde_json::json;
    use test_utils::{feature_layer, square};

    fn municipalities() -> FeatureLayer {
        feature_layer(
            "SP_Municipios_2024.geojson",
            vec![
                (square(0.0, 0.0, 1.0).into(), json!({"NM_MUN": "Jundiaí"})),
                (square(1.0, 0.0, 1.0).into(), json!({"NM_MUN": "Jundiaí"})),
                (square(5.0, 5.0, 1.0).into(), json!({"NM_MUN": "Itupeva"})),
            ],
        )
    }

    #[test]
    fn test_selected_parts_are_dissolved() {
        let overlay = BoundaryOverlay::from_layer(
            &municipalities(),
            Some(&BoundaryFilter::default()),
            BoundaryStyle::default(),
        )
        .unwrap();

        assert_eq!(overlay.name, "Jundiaí");
        assert_eq!(overlay.geometry.0.len(), 1);
        assert!((overlay.geometry.unsigned_area() - 2.0).abs() < 1e-9);
        assert_eq!(overlay.bounding_box(), Some(BoundingBox::new(0.0, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn test_mis_decoded_name_still_matches() {
        let layer = feature_layer(
            "municipios.geojson",
            vec![(square(0.0, 0.0, 1.0).into(), json!({"NM_MUN": "JundiaÃ\u{AD}"}))],
        );
        let overlay =
            BoundaryOverlay::from_layer(&layer, Some(&BoundaryFilter::default()), BoundaryStyle::default());
        assert!(overlay.is_ok());
    }

    #[test]
    fn test_unknown_municipality() {
        let filter = BoundaryFilter {
            column: "NM_MUN".to_string(),
            value: "Campinas".to_string(),
        };
        let err = BoundaryOverlay::from_layer(&municipalities(), Some(&filter), BoundaryStyle::default())
            .unwrap_err();
        assert!(matches!(err, AtlasError::BoundaryNotFound { ref value, .. } if value == "Campinas"));
    }

    #[test]
    fn test_points_only_boundary_is_empty() {
        let layer = feature_layer(
            "pontos.geojson",
            vec![(point!(x: 0.0, y: 0.0).into(), json!({"NM_MUN": "Jundiaí"}))],
        );
        let err = BoundaryOverlay::from_layer(&layer, None, BoundaryStyle::default()).unwrap_err();
        assert!(matches!(err, AtlasError::EmptyBoundary { .. }));
    }

    #[test]
    fn test_default_styles() {
        let style = BoundaryStyle::default();
        assert_eq!(style.halo.color.as_str(), "#000000");
        assert_eq!(style.halo.weight, 8.0);
        assert_eq!(style.halo.fill_opacity, 0.0);
        assert_eq!(style.outline.color.as_str(), "#FFD700");
        assert_eq!(style.outline.dash_array.as_deref(), Some("6,4"));
        assert_eq!(style.outline.fill_color.as_ref().map(Color::as_str), Some("#FFF59D"));
    }

    #[test]
    fn test_to_layer_keeps_extent() {
        let overlay = BoundaryOverlay::from_layer(&municipalities(), None, BoundaryStyle::default()).unwrap();
        let layer = overlay.to_layer();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.bounding_box(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0)));
    }
}
