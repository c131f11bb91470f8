//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

use crate::WGS84_A;

/// Half the projected world width in meters.
pub const MAX_EXTENT: f64 = 20037508.342789244;

/// Web Mercator on a sphere of radius equal to the WGS84 semi-major axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Convert projected meters to (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / WGS84_A).to_degrees();
        let lat = (2.0 * (y / WGS84_A).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }

    /// Convert (lon, lat) in degrees to projected meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = WGS84_A * lon.to_radians();
        let y = WGS84_A * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }
}
