//! Transverse Mercator projection on the WGS84 ellipsoid (UTM).
//!
//! Series expansions follow Snyder, "Map Projections: A Working Manual"
//! (USGS PP 1395), which are accurate to well under a meter inside a
//! 6° UTM zone. GRS80 (SIRGAS 2000) differs from WGS84 only in the
//! flattening at the 1e-10 level, so both datums share one ellipsoid here.

use crate::{WGS84_A, WGS84_INV_F};

/// UTM scale factor on the central meridian
const K0: f64 = 0.9996;
/// False easting (meters)
const FALSE_EASTING: f64 = 500000.0;
/// False northing for southern-hemisphere zones (meters)
const FALSE_NORTHING_SOUTH: f64 = 10000000.0;

/// Transverse Mercator parameters for one UTM zone.
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Semi-major axis (meters)
    a: f64,
    /// First eccentricity squared
    e2: f64,
    /// Second eccentricity squared
    ep2: f64,
}

impl TransverseMercator {
    /// Create the projection for a UTM zone (1-60).
    pub fn utm(zone: u8, south: bool) -> Self {
        let f = 1.0 / WGS84_INV_F;
        let e2 = f * (2.0 - f);
        let lon0_deg = zone as f64 * 6.0 - 183.0;

        Self {
            lon0: lon0_deg.to_radians(),
            false_northing: if south { FALSE_NORTHING_SOUTH } else { 0.0 },
            a: WGS84_A,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Meridional arc length from the equator to latitude `phi` (radians).
    fn meridional_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Convert (lon, lat) in degrees to (easting, northing) in meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let phi = lat_deg.to_radians();
        let lam = lon_deg.to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = (lam - self.lon0) * cos_phi;
        let m = self.meridional_arc(phi);

        let x = K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;

        let y = K0
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a.powi(6)
                        / 720.0))
            + self.false_northing;

        (x, y)
    }

    /// Convert (easting, northing) in meters to (lon, lat) in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = self.ep2;

        let x = easting - FALSE_EASTING;
        let y = northing - self.false_northing;

        // Footpoint latitude
        let m = y / K0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / denom.sqrt();
        let r1 = self.a * (1.0 - e2) / denom.powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        (lon.to_degrees(), lat.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_coords_approx_eq;

    #[test]
    fn test_central_meridian_on_equator() {
        // Zone 23 is centered on 45°W
        let proj = TransverseMercator::utm(23, true);
        let (x, y) = proj.forward(-45.0, 0.0);
        assert_coords_approx_eq!((x, y), (500000.0, 10000000.0), 1e-6);

        let (lon, lat) = proj.inverse(500000.0, 10000000.0);
        assert_coords_approx_eq!((lon, lat), (-45.0, 0.0), 1e-9);
    }

    #[test]
    fn test_jundiai_roundtrip() {
        let proj = TransverseMercator::utm(23, true);
        let (x, y) = proj.forward(-46.884, -23.186);

        // West of the central meridian, south of the equator
        assert!(x < 500000.0 && x > 250000.0, "easting {}", x);
        assert!(y < 10000000.0 && y > 7000000.0, "northing {}", y);

        let (lon, lat) = proj.inverse(x, y);
        assert_coords_approx_eq!((lon, lat), (-46.884, -23.186), 1e-6);
    }

    #[test]
    fn test_northern_zone_roundtrip() {
        // Zone 33N, near Rome
        let proj = TransverseMercator::utm(33, false);
        let (x, y) = proj.forward(12.4964, 41.9028);
        assert!(y > 4600000.0 && y < 4700000.0, "northing {}", y);

        let (lon, lat) = proj.inverse(x, y);
        assert_coords_approx_eq!((lon, lat), (12.4964, 41.9028), 1e-6);
    }

    #[test]
    fn test_scale_on_central_meridian() {
        // One degree of latitude along the central meridian near the
        // equator is ~110.57 km, scaled by k0.
        let proj = TransverseMercator::utm(31, false);
        let (_, y0) = proj.forward(3.0, 0.0);
        let (_, y1) = proj.forward(3.0, 1.0);
        let expected = 110574.0 * 0.9996;
        assert!(((y1 - y0) - expected).abs() < 5.0, "got {}", y1 - y0);
    }
}
