//! Layer styling: colors, path styles and the year→color table.
//!
//! The year→color table is data, not logic. Adding a year means adding an
//! entry to the configuration; nothing else changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `#RRGGBB` or `#RRGGBBAA` color string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Create a color from a hex string, validating its format.
    pub fn hex(s: impl Into<String>) -> Result<Self, StyleError> {
        let s = s.into();
        if parse_hex_color(&s).is_none() {
            return Err(StyleError::InvalidColor(s));
        }
        Ok(Color(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to RGBA tuple, `None` if the string is not a hex color.
    pub fn to_rgba(&self) -> Option<(u8, u8, u8, u8)> {
        parse_hex_color(&self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8, u8)> {
    let s = s.strip_prefix('#')?;
    if !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();

    match s.len() {
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// Stroke and fill options for a vector layer.
///
/// Field names serialize to the path option names used by the browser
/// renderer (`fillColor`, `dashArray`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: Color,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    pub fill_opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl PathStyle {
    /// Solid stroke and fill in one color.
    pub fn filled(color: Color, fill_opacity: f64, weight: f64) -> Self {
        Self {
            fill_color: Some(color.clone()),
            color,
            weight,
            opacity: None,
            fill_opacity,
            dash_array: None,
        }
    }

    /// Wide translucent black stroke without fill, drawn under a boundary.
    pub fn halo() -> Self {
        Self {
            color: Color("#000000".to_string()),
            weight: 8.0,
            opacity: Some(0.25),
            fill_color: None,
            fill_opacity: 0.0,
            dash_array: None,
        }
    }

    /// Dashed gold outline over a faint yellow fill.
    pub fn outline() -> Self {
        Self {
            color: Color("#FFD700".to_string()),
            weight: 3.0,
            opacity: Some(1.0),
            fill_color: Some(Color("#FFF59D".to_string())),
            fill_opacity: 0.15,
            dash_array: Some("6,4".to_string()),
        }
    }
}

/// One entry of the year→color table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearColor {
    pub year: String,
    pub color: Color,
}

/// Ordered year→color table with a fallback for unknown years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearColorTable {
    pub entries: Vec<YearColor>,
    pub fallback: Color,
}

impl YearColorTable {
    /// Color for a year label, or the fallback when the year is unknown.
    pub fn color_for(&self, year: &str) -> &Color {
        self.lookup(year).unwrap_or(&self.fallback)
    }

    /// Color for a year label only if the table knows it.
    pub fn lookup(&self, year: &str) -> Option<&Color> {
        self.entries
            .iter()
            .find(|e| e.year == year)
            .map(|e| &e.color)
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        for entry in &self.entries {
            if entry.color.to_rgba().is_none() {
                return Err(StyleError::InvalidColor(format!(
                    "{} (year {})",
                    entry.color, entry.year
                )));
            }
        }
        if self.fallback.to_rgba().is_none() {
            return Err(StyleError::InvalidColor(self.fallback.to_string()));
        }
        Ok(())
    }
}

impl Default for YearColorTable {
    fn default() -> Self {
        let entry = |year: &str, color: &str| YearColor {
            year: year.to_string(),
            color: Color(color.to_string()),
        };
        Self {
            entries: vec![
                entry("2000", "#e3d917"),
                entry("2010", "#e32f17"),
                entry("2023", "#62130a"),
            ],
            fallback: Color("#333333".to_string()),
        }
    }
}

/// Style-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Invalid color '{0}', expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        let color = Color::hex("#FF5500").unwrap();
        assert_eq!(color.to_rgba(), Some((255, 85, 0, 255)));

        let alpha = Color::hex("#00000080").unwrap();
        assert_eq!(alpha.to_rgba(), Some((0, 0, 0, 128)));

        assert!(Color::hex("FF5500").is_err());
        assert!(Color::hex("#GG0000").is_err());
        assert!(Color::hex("#12345").is_err());
    }

    #[test]
    fn test_year_lookup_with_fallback() {
        let table = YearColorTable::default();
        assert_eq!(table.color_for("2010").as_str(), "#e32f17");
        assert_eq!(table.color_for("1995").as_str(), "#333333");
        assert!(table.lookup("1995").is_none());
        table.validate().unwrap();
    }

    #[test]
    fn test_path_style_field_names() {
        let mut style = PathStyle::filled(Color::hex("#62130a").unwrap(), 0.5, 1.0);
        style.dash_array = Some("6,4".to_string());
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#62130a");
        assert_eq!(json["fillOpacity"], 0.5);
        assert_eq!(json["dashArray"], "6,4");
        assert!(json.get("opacity").is_none());
    }

    #[test]
    fn test_table_from_yaml_like_json() {
        let json = r##"{"entries":[{"year":"1990","color":"#112233"}],"fallback":"#000000"}"##;
        let table: YearColorTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.color_for("1990").as_str(), "#112233");
    }
}
