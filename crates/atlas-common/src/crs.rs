//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of the reference frame every layer is normalized to.
pub const REFERENCE_EPSG: u32 = 4326;

/// A coordinate reference system the pipeline knows how to read.
///
/// Geographic datums close enough to WGS84 for web display (SIRGAS 2000,
/// NAD83, ETRS89) are kept distinct so that reprojection still runs, but
/// their coordinates map through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Geographic lon/lat in degrees
    Geographic { epsg: u32 },
    /// Web Mercator (meters)
    WebMercator,
    /// Universal Transverse Mercator (meters)
    Utm { epsg: u32, zone: u8, south: bool },
}

impl Crs {
    /// Geographic WGS84 (lon/lat degrees), the reference frame.
    pub const WGS84: Crs = Crs::Geographic {
        epsg: REFERENCE_EPSG,
    };

    /// Parse a CRS identifier as it appears in source files or configuration.
    ///
    /// Accepts formats like:
    /// - "EPSG:31983"
    /// - "epsg:4326"
    /// - "urn:ogc:def:crs:EPSG::4674"
    /// - "CRS:84" / "OGC:CRS84" (WGS84 with lon/lat axis order)
    pub fn from_code_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84"
            || normalized == "OGC:CRS84"
            || normalized.ends_with(":CRS84")
        {
            return Ok(Crs::WGS84);
        }

        let code = if let Some(rest) = normalized.strip_prefix("EPSG:") {
            rest
        } else if normalized.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            normalized.rsplit(':').next().unwrap_or_default()
        } else {
            return Err(CrsParseError::UnsupportedCrs(s.to_string()));
        };

        let epsg: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(epsg)
    }

    /// Build a CRS from a numeric EPSG code.
    pub fn from_epsg(epsg: u32) -> Result<Self, CrsParseError> {
        match epsg {
            // WGS84, SIRGAS 2000, NAD83, ETRS89
            4326 | 4674 | 4269 | 4258 => Ok(Crs::Geographic { epsg }),
            3857 | 900913 => Ok(Crs::WebMercator),
            // WGS84 / UTM north and south
            32601..=32660 => Ok(Crs::Utm {
                epsg,
                zone: (epsg - 32600) as u8,
                south: false,
            }),
            32701..=32760 => Ok(Crs::Utm {
                epsg,
                zone: (epsg - 32700) as u8,
                south: true,
            }),
            // SIRGAS 2000 / UTM zones 11N-22N
            31965..=31976 => Ok(Crs::Utm {
                epsg,
                zone: (epsg - 31965 + 11) as u8,
                south: false,
            }),
            // SIRGAS 2000 / UTM zones 17S-25S
            31977..=31985 => Ok(Crs::Utm {
                epsg,
                zone: (epsg - 31977 + 17) as u8,
                south: true,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", epsg))),
        }
    }

    /// EPSG code of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Geographic { epsg } | Crs::Utm { epsg, .. } => *epsg,
            Crs::WebMercator => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Geographic { .. })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::from_code_string(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
