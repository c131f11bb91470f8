//! Dispatch from a source CRS to its inverse projection into lon/lat.

use atlas_common::Crs;

use crate::{TransverseMercator, WebMercator};

/// How to bring coordinates of one CRS into geographic lon/lat degrees.
#[derive(Debug, Clone, Copy)]
pub enum GeographicTransform {
    /// Already geographic on a WGS84-compatible datum
    Identity,
    WebMercator(WebMercator),
    TransverseMercator(TransverseMercator),
}

impl GeographicTransform {
    /// Select the transform for a source CRS.
    pub fn for_crs(crs: &Crs) -> Self {
        match crs {
            Crs::Geographic { .. } => GeographicTransform::Identity,
            Crs::WebMercator => GeographicTransform::WebMercator(WebMercator),
            Crs::Utm { zone, south, .. } => {
                GeographicTransform::TransverseMercator(TransverseMercator::utm(*zone, *south))
            }
        }
    }

    /// Convert a source (x, y) to (lon, lat) in degrees.
    pub fn to_lon_lat(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            GeographicTransform::Identity => (x, y),
            GeographicTransform::WebMercator(p) => p.inverse(x, y),
            GeographicTransform::TransverseMercator(p) => p.inverse(x, y),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, GeographicTransform::Identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_coords_approx_eq;

    #[test]
    fn test_geographic_datums_pass_through() {
        let sirgas = Crs::from_epsg(4674).unwrap();
        let t = GeographicTransform::for_crs(&sirgas);
        assert!(t.is_identity());
        assert_eq!(t.to_lon_lat(-46.9, -23.2), (-46.9, -23.2));
    }

    #[test]
    fn test_utm_dispatch() {
        let crs = Crs::from_epsg(31983).unwrap();
        let t = GeographicTransform::for_crs(&crs);
        let (lon, lat) = t.to_lon_lat(500000.0, 10000000.0);
        assert_coords_approx_eq!((lon, lat), (-45.0, 0.0), 1e-9);
    }

    #[test]
    fn test_web_mercator_dispatch() {
        let t = GeographicTransform::for_crs(&Crs::WebMercator);
        let (lon, lat) = t.to_lon_lat(0.0, 0.0);
        assert_coords_approx_eq!((lon, lat), (0.0, 0.0), 1e-12);
    }
}
