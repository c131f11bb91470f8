//! Map composition: z-ordered render layers, toggles, legend and viewport.
//!
//! The output [`RenderSpec`] is renderer-independent data. Layers carry a
//! fixed z-index slot each:
//!
//! | slot | layer |
//! |---|---|
//! | [`HALO_Z`] | boundary halo |
//! | [`TEMPORAL_Z`] | land use by year |
//! | [`OUTLINE_Z`] | boundary outline |
//! | [`MARKER_Z`] | points of interest |

use atlas_common::collection::to_feature_collection;
use atlas_common::{Color, PathStyle, Viewport, YearColorTable};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::boundary::BoundaryOverlay;
use crate::bounds::BoundsAggregator;
use crate::classify::TemporalGroup;
use crate::markers::{Marker, PointMarkerSet};

pub const HALO_Z: u32 = 350;
pub const TEMPORAL_Z: u32 = 400;
pub const OUTLINE_Z: u32 = 450;
pub const MARKER_Z: u32 = 600;

/// Background tile layer. Always shown, never in the layer control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basemap {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

impl Default for Basemap {
    fn default() -> Self {
        Self {
            name: "Esri World Imagery".to_string(),
            url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
                .to_string(),
            attribution: "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, \
                          Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community"
                .to_string(),
        }
    }
}

/// Icon drawn for each point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub color: String,
    pub icon: String,
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self {
            color: "green".to_string(),
            icon: "tree".to_string(),
        }
    }
}

/// Styling of the temporal overlays apart from their year color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalStyle {
    pub weight: f64,
    pub fill_opacity: f64,
    pub highlight_weight: f64,
    /// Tooltip label in front of the year
    pub tooltip_alias: String,
}

impl Default for TemporalStyle {
    fn default() -> Self {
        Self {
            weight: 1.0,
            fill_opacity: 0.5,
            highlight_weight: 2.0,
            tooltip_alias: "Ano:".to_string(),
        }
    }
}

/// Composer settings that do not depend on the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerOptions {
    pub title: String,
    pub basemap: Basemap,
    pub zoom: u8,
    pub legend_title: String,
    pub temporal_style: TemporalStyle,
    pub marker_icon: MarkerIcon,
    /// Markers are clustered above this count
    pub cluster_threshold: usize,
    pub collapse_layer_control: bool,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            title: "Jundiaí: urbanização e parques".to_string(),
            basemap: Basemap::default(),
            zoom: 12,
            legend_title: "Urbano por ano".to_string(),
            temporal_style: TemporalStyle::default(),
            marker_icon: MarkerIcon::default(),
            cluster_threshold: 50,
            collapse_layer_control: false,
        }
    }
}

/// Tooltip showing attribute values with labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub fields: Vec<String>,
    pub aliases: Vec<String>,
}

/// What a render layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerContent {
    /// GeoJSON features drawn as styled paths
    Vector {
        style: PathStyle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlight: Option<PathStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<Tooltip>,
        data: FeatureCollection,
    },
    /// Point markers, optionally clustered
    Markers {
        clustered: bool,
        icon: MarkerIcon,
        markers: Vec<Marker>,
    },
}

/// One drawable layer in its z-order slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLayer {
    pub id: String,
    pub name: String,
    pub z_index: u32,
    pub interactive: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub content: LayerContent,
}

/// A layer-control entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerToggle {
    pub layer_id: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// Everything a renderer needs to draw the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub title: String,
    pub basemap: Basemap,
    /// Initial center as (lat, lon)
    pub center: [f64; 2],
    pub zoom: u8,
    /// Ascending z-order
    pub layers: Vec<RenderLayer>,
    pub toggles: Vec<LayerToggle>,
    pub collapse_layer_control: bool,
    pub legend: Legend,
    pub viewport: Viewport,
}

impl RenderSpec {
    pub fn layer(&self, id: &str) -> Option<&RenderLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn toggle(&self, layer_id: &str) -> Option<&LayerToggle> {
        self.toggles.iter().find(|t| t.layer_id == layer_id)
    }
}

/// Assembles a [`RenderSpec`] from the pipeline outputs.
#[derive(Debug, Clone)]
pub struct MapComposer {
    options: ComposerOptions,
    colors: YearColorTable,
    /// Attribute holding the year on temporal features
    year_column: String,
    bounds: BoundsAggregator,
}

impl MapComposer {
    pub fn new(
        options: ComposerOptions,
        colors: YearColorTable,
        year_column: impl Into<String>,
        bounds: BoundsAggregator,
    ) -> Self {
        Self {
            options,
            colors,
            year_column: year_column.into(),
            bounds,
        }
    }

    pub fn options(&self) -> &ComposerOptions {
        &self.options
    }

    /// Viewport over the temporal layers, or over the boundary when no
    /// temporal group survived classification.
    pub fn fit(&self, boundary: &BoundaryOverlay, groups: &[TemporalGroup]) -> Viewport {
        match self.bounds.extent(groups.iter().map(|g| &g.layer)) {
            Some(_) => self.bounds.aggregate(groups.iter().map(|g| &g.layer)),
            None => self.bounds.aggregate([&boundary.to_layer()]),
        }
    }

    /// Compose with the viewport from [`MapComposer::fit`].
    pub fn build(
        &self,
        boundary: &BoundaryOverlay,
        groups: Vec<TemporalGroup>,
        markers: PointMarkerSet,
    ) -> RenderSpec {
        let viewport = self.fit(boundary, &groups);
        self.compose(boundary, groups, markers, viewport)
    }

    pub fn compose(
        &self,
        boundary: &BoundaryOverlay,
        groups: Vec<TemporalGroup>,
        markers: PointMarkerSet,
        viewport: Viewport,
    ) -> RenderSpec {
        let boundary_data = to_feature_collection(&boundary.to_layer().features);

        let mut layers = Vec::with_capacity(groups.len() + 3);
        let mut toggles = Vec::with_capacity(groups.len() + 1);

        layers.push(RenderLayer {
            id: "boundary-halo".to_string(),
            name: format!("{} (halo)", boundary.name),
            z_index: HALO_Z,
            interactive: false,
            visible: true,
            content: LayerContent::Vector {
                style: boundary.style.halo.clone(),
                highlight: None,
                tooltip: None,
                data: boundary_data.clone(),
            },
        });

        let temporal = &self.options.temporal_style;
        for group in &groups {
            let id = format!("temporal-{}", group.label);
            let mut style = PathStyle::filled(group.color.clone(), temporal.fill_opacity, temporal.weight);
            style.opacity = Some(1.0);
            let highlight = PathStyle {
                weight: temporal.highlight_weight,
                ..style.clone()
            };

            toggles.push(LayerToggle {
                layer_id: id.clone(),
                label: group.label.clone(),
                visible: group.default_visible,
            });
            layers.push(RenderLayer {
                id,
                name: group.label.clone(),
                z_index: TEMPORAL_Z,
                interactive: true,
                visible: group.default_visible,
                content: LayerContent::Vector {
                    style,
                    highlight: Some(highlight),
                    tooltip: Some(Tooltip {
                        fields: vec![self.year_column.clone()],
                        aliases: vec![temporal.tooltip_alias.clone()],
                    }),
                    data: to_feature_collection(&group.layer.features),
                },
            });
        }

        layers.push(RenderLayer {
            id: "boundary-outline".to_string(),
            name: boundary.name.clone(),
            z_index: OUTLINE_Z,
            interactive: false,
            visible: true,
            content: LayerContent::Vector {
                style: boundary.style.outline.clone(),
                highlight: None,
                tooltip: None,
                data: boundary_data,
            },
        });

        let clustered = markers.should_cluster(self.options.cluster_threshold);
        toggles.push(LayerToggle {
            layer_id: "markers".to_string(),
            label: markers.name.clone(),
            visible: true,
        });
        layers.push(RenderLayer {
            id: "markers".to_string(),
            name: markers.name.clone(),
            z_index: MARKER_Z,
            interactive: true,
            visible: true,
            content: LayerContent::Markers {
                clustered,
                icon: self.options.marker_icon.clone(),
                markers: markers.markers,
            },
        });

        let legend = Legend {
            title: self.options.legend_title.clone(),
            entries: self
                .colors
                .entries
                .iter()
                .map(|e| LegendEntry {
                    label: e.year.clone(),
                    color: e.color.clone(),
                })
                .collect(),
        };

        let center = match boundary.bounding_box() {
            Some(bbox) => {
                let (lon, lat) = bbox.center();
                [lat, lon]
            }
            None => viewport.center(),
        };

        info!(
            layers = layers.len(),
            toggles = toggles.len(),
            temporal_groups = groups.len(),
            clustered = clustered,
            "Composed render spec"
        );

        RenderSpec {
            title: self.options.title.clone(),
            basemap: self.options.basemap.clone(),
            center,
            zoom: self.options.zoom,
            layers,
            toggles,
            collapse_layer_control: self.options.collapse_layer_control,
            legend,
            viewport,
        }
    }
}
