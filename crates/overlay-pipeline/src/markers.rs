//! Point markers for points of interest.

use atlas_common::FeatureLayer;
use geo::{Centroid, Geometry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One labelled marker position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// Named set of markers rendered as one toggleable overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointMarkerSet {
    pub name: String,
    pub markers: Vec<Marker>,
}

impl PointMarkerSet {
    /// A set with no markers, used when the source cannot be read.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
        }
    }

    /// Build markers from a normalized layer whose names were resolved
    /// into `label_column`.
    ///
    /// Non-point geometries are reduced to their centroid. Geometries with
    /// no centroid (empty) are skipped. A missing label gets `fallback`.
    pub fn from_layer(
        name: impl Into<String>,
        layer: &FeatureLayer,
        label_column: &str,
        fallback: &str,
    ) -> Self {
        let mut skipped = 0usize;
        let markers: Vec<Marker> = layer
            .features
            .iter()
            .filter_map(|feature| {
                let Some(point) = representative_point(&feature.geometry) else {
                    skipped += 1;
                    return None;
                };
                let label = match feature.attribute(label_column) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => fallback.to_string(),
                };
                Some(Marker {
                    lat: point.y(),
                    lon: point.x(),
                    label,
                })
            })
            .collect();

        let name = name.into();
        debug!(markers = markers.len(), skipped = skipped, set = %name, "Built marker set");
        Self { name, markers }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Whether the set is large enough to be clustered.
    pub fn should_cluster(&self, threshold: usize) -> bool {
        self.len() > threshold
    }
}

fn representative_point(geometry: &Geometry<f64>) -> Option<geo::Point<f64>> {
    match geometry {
        Geometry::Point(p) => Some(*p),
        other => other.centroid(),
    }
}
