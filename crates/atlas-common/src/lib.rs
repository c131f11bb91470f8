//! Common types shared by the urban-atlas pipeline and map builder.

pub mod bbox;
pub mod collection;
pub mod crs;
pub mod error;
pub mod layer;
pub mod style;

pub use bbox::{BoundingBox, Viewport};
pub use crs::Crs;
pub use error::{AtlasError, AtlasResult};
pub use layer::{Attributes, Feature, FeatureLayer, SourceFeature, SourceLayer};
pub use style::{Color, PathStyle, YearColor, YearColorTable};
