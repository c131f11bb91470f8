//! Map builder configuration.
//!
//! Loaded from a YAML file with `${VAR}` / `${VAR:-default}` environment
//! substitution. Every field has a default, and the defaults reproduce the
//! Jundiaí urbanization map, so an empty file (or no file) is valid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atlas_common::{AtlasError, AtlasResult, Crs, PathStyle, Viewport, YearColorTable};
use overlay_pipeline::{
    BoundaryFilter, BoundaryStyle, CategoryFilter, ComposerOptions, NameResolution, RepairStrategy,
};
use serde::{Deserialize, Serialize};

/// One vector source on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,

    /// CRS to assume when the file declares none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }
}

/// The mandatory municipal boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub source: SourceConfig,
    /// Feature selection; `None` dissolves every feature of the source
    pub filter: Option<BoundaryFilter>,
    pub style: BoundaryStyle,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::new("./data/SP_Municipios_2024.geojson").with_crs("EPSG:4674"),
            filter: Some(BoundaryFilter::default()),
            style: BoundaryStyle::default(),
        }
    }
}

/// Year-stamped land-use layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandUseConfig {
    pub sources: Vec<SourceConfig>,
    pub category: CategoryFilter,
    pub year_column: String,
    pub colors: YearColorTable,
}

impl Default for LandUseConfig {
    fn default() -> Self {
        Self {
            sources: ["2000", "2010", "2023"]
                .iter()
                .map(|year| SourceConfig::new(format!("./data/soil_use_{}.geojson", year)))
                .collect(),
            category: CategoryFilter::default(),
            year_column: "year".to_string(),
            colors: YearColorTable::default(),
        }
    }
}

/// Optional points of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub source: Option<SourceConfig>,
    /// Layer name shown in the layer control
    pub layer_name: String,
    pub names: NameResolution,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            source: Some(SourceConfig::new(
                "./data/L_8683-2016_m13_parques-municipais.geojson",
            )),
            layer_name: "Parques".to_string(),
            names: NameResolution::default(),
        }
    }
}

/// Top-level map builder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapBuilderConfig {
    /// CRS every layer is normalized to
    pub reference_crs: String,

    /// Geometry repair strategy
    pub repair: RepairStrategy,

    pub boundary: BoundaryConfig,
    pub land_use: LandUseConfig,
    pub markers: MarkerConfig,

    /// Title, basemap, zoom, legend and marker rendering
    pub map: ComposerOptions,

    /// Viewport used when no layer contributes bounds
    pub fallback_viewport: Viewport,

    /// Where the HTML document is written
    pub output: PathBuf,
}

impl Default for MapBuilderConfig {
    fn default() -> Self {
        Self {
            reference_crs: Crs::WGS84.to_string(),
            repair: RepairStrategy::Auto,
            boundary: BoundaryConfig::default(),
            land_use: LandUseConfig::default(),
            markers: MarkerConfig::default(),
            map: ComposerOptions::default(),
            fallback_viewport: Viewport::new(-23.3, -47.2, -23.0, -46.7),
            output: PathBuf::from("index.html"),
        }
    }
}

impl MapBuilderConfig {
    /// Load, expand and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read map config from {:?}", path.as_ref()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid map config {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        // An empty document parses as null, meaning "all defaults"
        let config: MapBuilderConfig = if expanded.trim().is_empty() {
            MapBuilderConfig::default()
        } else {
            serde_yaml::from_str(&expanded).context("Failed to parse map config YAML")?
        };

        config.validate()?;
        Ok(config)
    }

    /// The reference CRS, parsed.
    pub fn reference(&self) -> AtlasResult<Crs> {
        Crs::from_code_string(&self.reference_crs).map_err(|e| AtlasError::InvalidConfig(e.to_string()))
    }

    /// Check the configuration before any source is opened.
    pub fn validate(&self) -> AtlasResult<()> {
        let invalid = |msg: String| Err(AtlasError::InvalidConfig(msg));

        self.reference()?;

        if self.land_use.sources.is_empty() {
            return invalid("land_use.sources must list at least one layer".to_string());
        }
        for source in std::iter::once(&self.boundary.source)
            .chain(&self.land_use.sources)
            .chain(self.markers.source.as_ref())
        {
            if source.path.as_os_str().is_empty() {
                return invalid("source path cannot be empty".to_string());
            }
            if let Some(crs) = &source.crs {
                Crs::from_code_string(crs).map_err(|e| {
                    AtlasError::InvalidConfig(format!("{}: {}", source.path.display(), e))
                })?;
            }
        }

        self.land_use
            .colors
            .validate()
            .map_err(|e| AtlasError::InvalidConfig(e.to_string()))?;
        validate_style("boundary.style.halo", &self.boundary.style.halo)?;
        validate_style("boundary.style.outline", &self.boundary.style.outline)?;

        if self.land_use.category.column.is_empty() || self.land_use.category.value.is_empty() {
            return invalid("land_use.category needs a column and a value".to_string());
        }
        if self.land_use.year_column.is_empty() {
            return invalid("land_use.year_column cannot be empty".to_string());
        }
        if self.markers.names.canonical.is_empty() {
            return invalid("markers.names.canonical cannot be empty".to_string());
        }

        let bbox = self.fallback_viewport.to_bbox();
        let in_range = (-90.0..=90.0).contains(&bbox.min_y)
            && (-90.0..=90.0).contains(&bbox.max_y)
            && (-180.0..=180.0).contains(&bbox.min_x)
            && (-180.0..=180.0).contains(&bbox.max_x);
        if bbox.is_degenerate() || !in_range {
            return invalid(format!(
                "fallback_viewport must be a non-empty [[min_lat, min_lon], [max_lat, max_lon]] box, got {:?}",
                <[[f64; 2]; 2]>::from(self.fallback_viewport)
            ));
        }

        if self.map.zoom > 22 {
            return invalid(format!("map.zoom must be 0-22, got {}", self.map.zoom));
        }
        if self.output.as_os_str().is_empty() {
            return invalid("output path cannot be empty".to_string());
        }

        Ok(())
    }
}

fn validate_style(name: &str, style: &PathStyle) -> AtlasResult<()> {
    let colors = std::iter::once(&style.color).chain(style.fill_color.as_ref());
    for color in colors {
        if color.to_rgba().is_none() {
            return Err(AtlasError::InvalidConfig(format!(
                "{}: invalid color '{}'",
                name, color
            )));
        }
    }
    Ok(())
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// A lone `$` is copied through. Braces may nest inside a default.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let end = closing_brace(body)
            .ok_or_else(|| anyhow::anyhow!("Unclosed variable substitution: ${{{}", body))?;
        out.push_str(&lookup(&body[..end])?);
        rest = &body[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Byte offset of the `}` that closes an already opened `${`.
fn closing_brace(body: &str) -> Option<usize> {
    let mut open = 0usize;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => open += 1,
            b'}' if open == 0 => return Some(i),
            b'}' => open -= 1,
            _ => {}
        }
    }
    None
}

/// Value for `VAR` or `VAR:-default`. An empty variable takes the default.
fn lookup(reference: &str) -> Result<String> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name.trim(), Some(default)),
        None => (reference.trim(), None),
    };

    match (std::env::var(name), default) {
        (Ok(value), Some(default)) if value.is_empty() => Ok(default.to_string()),
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_string()),
        (Err(e), None) => Err(e).with_context(|| format!("Environment variable {} not set", name)),
    }
}
