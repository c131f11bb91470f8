//! Attribute resolution: year, display name and category columns.

use std::borrow::Cow;

use atlas_common::{AtlasError, AtlasResult, FeatureLayer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Find the first 19xx or 20xx four-digit run in a path.
///
/// Matches may start inside a longer run of digits, so `x12019` yields
/// 2019.
pub fn year_from_path(path: &str) -> Option<i32> {
    let bytes = path.as_bytes();
    bytes.windows(4).find_map(|w| {
        let century = &w[..2];
        let is_year = (century == b"19" || century == b"20")
            && w[2].is_ascii_digit()
            && w[3].is_ascii_digit();
        if is_year {
            std::str::from_utf8(w).ok()?.parse().ok()
        } else {
            None
        }
    })
}

/// Four-digit year held by an attribute value. Anything else is treated as
/// no year at all.
fn year_from_value(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    year.filter(|y| (1000..=9999).contains(y))
}

/// Resolve the year a layer represents.
///
/// The first non-null value of `year_column` wins; otherwise the year is
/// taken from `source_path`. Neither available is `UnresolvedYear`.
pub fn resolve_year(layer: &FeatureLayer, source_path: &str, year_column: &str) -> AtlasResult<i32> {
    if let Some(value) = layer.first_value(year_column) {
        match year_from_value(value) {
            Some(year) => return Ok(year),
            None => warn!(
                layer = %layer.name,
                column = year_column,
                value = %value,
                "Year attribute is not a four-digit integer, using the file name"
            ),
        }
    }

    year_from_path(source_path).ok_or_else(|| AtlasError::UnresolvedYear {
        path: source_path.to_string(),
        column: year_column.to_string(),
    })
}

/// Fill the category column when the layer lacks it.
///
/// A missing column is taken to mean the file was already selected for
/// the category, so every feature gets `default`. Returns whether the
/// column was filled in. This cannot tell a pre-filtered file from a file
/// missing the column by mistake.
pub fn ensure_category(layer: &mut FeatureLayer, column: &str, default: &str) -> bool {
    if layer.has_column(column) {
        return false;
    }
    debug!(
        layer = %layer.name,
        column = column,
        category = default,
        "No category column, treating every feature as matching"
    );
    layer.set_column(column, Value::String(default.to_string()));
    true
}

/// How marker display names are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameResolution {
    /// Column that receives the resolved name
    pub canonical: String,
    /// Columns tried in order when `canonical` is absent
    pub candidates: Vec<String>,
    /// Label for features with no usable name
    pub fallback: String,
    /// Repair UTF-8 text that was decoded as Latin-1
    pub fix_encoding: bool,
}

impl Default for NameResolution {
    fn default() -> Self {
        Self {
            canonical: "nome".to_string(),
            candidates: ["NOME", "Name", "name", "NM_PARQUE", "NM", "TITULO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback: "Parque".to_string(),
            fix_encoding: true,
        }
    }
}

fn label_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Write a display name into `options.canonical` on every feature.
pub fn resolve_name(mut layer: FeatureLayer, options: &NameResolution) -> FeatureLayer {
    let source_column = std::iter::once(&options.canonical)
        .chain(&options.candidates)
        .find(|c| layer.has_column(c))
        .cloned();

    match &source_column {
        Some(column) => debug!(layer = %layer.name, column = %column, "Resolved name column"),
        None => debug!(
            layer = %layer.name,
            fallback = %options.fallback,
            "No name column found, using fallback label"
        ),
    }

    for feature in &mut layer.features {
        let label = source_column
            .as_ref()
            .and_then(|c| label_of(feature.properties.get(c)))
            .map(|s| {
                if options.fix_encoding {
                    fix_mojibake(&s).into_owned()
                } else {
                    s
                }
            })
            .unwrap_or_else(|| options.fallback.clone());
        feature
            .properties
            .insert(options.canonical.clone(), Value::String(label));
    }

    layer
}

/// Undo UTF-8 text that was mis-decoded as Latin-1 ("SÃ£o" → "São").
///
/// Best effort: text that does not re-encode to valid UTF-8 is returned
/// unchanged.
pub fn fix_mojibake(s: &str) -> Cow<'_, str> {
    if s.is_ascii() || s.chars().any(|c| c as u32 > 0xFF) {
        return Cow::Borrowed(s);
    }
    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    match String::from_utf8(bytes) {
        Ok(fixed) => Cow::Owned(fixed),
        Err(_) => Cow::Borrowed(s),
    }
}
