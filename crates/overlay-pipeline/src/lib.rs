//! Normalization and composition of municipal map layers.
//!
//! Stages, in the order the pipeline runs them:
//! - [`normalize`]: repair, reprojection into WGS84, 2-D reduction
//! - [`attributes`]: year, category and display-name resolution
//! - [`classify`]: category filter and grouping by year
//! - [`bounds`]: union extent as a viewport
//! - [`compose`]: z-ordered render layers, toggles and legend

pub mod attributes;
pub mod boundary;
pub mod bounds;
pub mod classify;
pub mod compose;
pub mod markers;
pub mod normalize;
pub mod repair;

pub use attributes::{ensure_category, fix_mojibake, resolve_name, resolve_year, NameResolution};
pub use boundary::{BoundaryFilter, BoundaryOverlay, BoundaryStyle};
pub use bounds::BoundsAggregator;
pub use classify::{CategoryFilter, LayerClassifier, TemporalGroup};
pub use compose::{ComposerOptions, LayerContent, MapComposer, RenderLayer, RenderSpec};
pub use markers::{Marker, PointMarkerSet};
pub use normalize::GeometryNormalizer;
pub use repair::{GeometryRepair, RepairStrategy};
