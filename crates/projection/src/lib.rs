//! Coordinate reference system transformations.
//!
//! Implements the inverse projections needed to bring source layers into
//! geographic WGS84, from scratch without external dependencies.

pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use mercator::WebMercator;
pub use transform::GeographicTransform;
pub use transverse_mercator::TransverseMercator;

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6378137.0;

/// WGS84 inverse flattening
pub const WGS84_INV_F: f64 = 298.257223563;
