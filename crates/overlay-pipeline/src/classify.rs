//! Category filtering and grouping of land-use layers by year.

use std::collections::BTreeMap;

use atlas_common::{Color, Feature, FeatureLayer, YearColorTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::attributes::{ensure_category, resolve_year};

/// Keep features whose category column equals `value`, ignoring case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub column: String,
    pub value: String,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            column: "soil_use".to_string(),
            value: "urbano".to_string(),
        }
    }
}

impl CategoryFilter {
    /// Null and missing values never match.
    pub fn matches(&self, feature: &Feature) -> bool {
        let wanted = self.value.to_lowercase();
        match feature.attribute(&self.column) {
            Some(Value::String(s)) => s.to_lowercase() == wanted,
            Some(other) => other.to_string().to_lowercase() == wanted,
            None => false,
        }
    }
}

/// One year of the temporal overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalGroup {
    /// Year label, e.g. "2023"
    pub label: String,
    pub layer: FeatureLayer,
    pub color: Color,
    pub default_visible: bool,
}

impl TemporalGroup {
    pub fn year(&self) -> Option<i32> {
        self.label.parse().ok()
    }
}

/// Turns normalized land-use layers into sorted [`TemporalGroup`]s.
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    filter: CategoryFilter,
    year_column: String,
    colors: YearColorTable,
}

impl LayerClassifier {
    pub fn new(filter: CategoryFilter, year_column: impl Into<String>, colors: YearColorTable) -> Self {
        Self {
            filter,
            year_column: year_column.into(),
            colors,
        }
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn year_column(&self) -> &str {
        &self.year_column
    }

    /// Keep only matching features, `None` when nothing matches.
    ///
    /// A layer without the category column is assumed to be pre-filtered
    /// and kept whole.
    pub fn filter_layer(&self, mut layer: FeatureLayer) -> Option<FeatureLayer> {
        ensure_category(&mut layer, &self.filter.column, &self.filter.value);
        let before = layer.len();
        layer.features.retain(|f| self.filter.matches(f));

        if layer.is_empty() {
            debug!(
                layer = %layer.name,
                features = before,
                category = %self.filter.value,
                "No matching features, dropping layer"
            );
            return None;
        }
        Some(layer)
    }

    /// Classify layers in submission order.
    ///
    /// Layers without a resolvable year are skipped with a warning. Layers
    /// resolving to the same year are merged into one group, earlier
    /// submissions first. Groups come out in ascending year order and only
    /// the latest is visible by default.
    pub fn classify(&self, layers: Vec<(FeatureLayer, String)>) -> Vec<TemporalGroup> {
        let mut by_year: BTreeMap<i32, FeatureLayer> = BTreeMap::new();

        for (layer, source_path) in layers {
            let year = match resolve_year(&layer, &source_path, &self.year_column) {
                Ok(year) => year,
                Err(e) => {
                    warn!(layer = %layer.name, error = %e, "Skipping temporal layer");
                    continue;
                }
            };

            let Some(mut layer) = self.filter_layer(layer) else {
                continue;
            };
            layer.set_column(&self.year_column, Value::from(year));

            match by_year.get_mut(&year) {
                Some(existing) => {
                    info!(
                        year = year,
                        layer = %layer.name,
                        into = %existing.name,
                        "Merging layer into existing year"
                    );
                    existing.features.append(&mut layer.features);
                }
                None => {
                    by_year.insert(year, layer);
                }
            }
        }

        let latest = by_year.keys().next_back().copied();
        by_year
            .into_iter()
            .map(|(year, layer)| {
                let label = year.to_string();
                let color = match self.colors.lookup(&label) {
                    Some(color) => color.clone(),
                    None => {
                        warn!(year = year, fallback = %self.colors.fallback, "No color for year, using fallback");
                        self.colors.fallback.clone()
                    }
                };
                debug!(year = year, features = layer.len(), color = %color, "Temporal group");
                TemporalGroup {
                    label,
                    layer,
                    color,
                    default_visible: Some(year) == latest,
                }
            })
            .collect()
    }
}
