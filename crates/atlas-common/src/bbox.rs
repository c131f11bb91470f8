//! Bounding box and viewport types.

use geo::Rect;
use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// After normalization every layer is geographic, so x is longitude and
/// y is latitude, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point as (x, y).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// True when the box has zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Grow any zero-length axis by `pad` on each side.
    pub fn padded_if_degenerate(&self, pad: f64) -> BoundingBox {
        let mut out = *self;
        if out.width() <= 0.0 {
            out.min_x -= pad;
            out.max_x += pad;
        }
        if out.height() <= 0.0 {
            out.min_y -= pad;
            out.max_y += pad;
        }
        out
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// The map extent to fit on open, in (lat, lon) order.
///
/// Serialized as `[[min_lat, min_lon], [max_lat, max_lon]]`, the order
/// Leaflet's `fitBounds` expects. Consumers depend on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct Viewport {
    /// (min_lat, min_lon)
    pub south_west: [f64; 2],
    /// (max_lat, max_lon)
    pub north_east: [f64; 2],
}

impl Viewport {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            south_west: [min_lat, min_lon],
            north_east: [max_lat, max_lon],
        }
    }

    /// Viewport covering a lon/lat bounding box.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self::new(bbox.min_y, bbox.min_x, bbox.max_y, bbox.max_x)
    }

    /// The same extent as a lon/lat bounding box.
    pub fn to_bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.south_west[1],
            self.south_west[0],
            self.north_east[1],
            self.north_east[0],
        )
    }

    /// Center as (lat, lon).
    pub fn center(&self) -> [f64; 2] {
        [
            (self.south_west[0] + self.north_east[0]) / 2.0,
            (self.south_west[1] + self.north_east[1]) / 2.0,
        ]
    }
}

impl From<[[f64; 2]; 2]> for Viewport {
    fn from(corners: [[f64; 2]; 2]) -> Self {
        Self {
            south_west: corners[0],
            north_east: corners[1],
        }
    }
}

impl From<Viewport> for [[f64; 2]; 2] {
    fn from(viewport: Viewport) -> Self {
        [viewport.south_west, viewport.north_east]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(2.0, 2.0, 3.0, 3.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn test_viewport_swaps_axes() {
        let bbox = BoundingBox::new(-47.2, -23.3, -46.7, -23.0);
        let viewport = Viewport::from_bbox(&bbox);
        assert_eq!(viewport.south_west, [-23.3, -47.2]);
        assert_eq!(viewport.north_east, [-23.0, -46.7]);
        assert_eq!(viewport.to_bbox(), bbox);
    }

    #[test]
    fn test_viewport_serializes_as_nested_pairs() {
        let viewport = Viewport::new(0.0, 0.0, 3.0, 3.0);
        let json = serde_json::to_string(&viewport).unwrap();
        assert_eq!(json, "[[0.0,0.0],[3.0,3.0]]");
    }

    #[test]
    fn test_padding_only_touches_degenerate_axes() {
        let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        assert!(point.is_degenerate());
        let padded = point.padded_if_degenerate(0.001);
        assert!(!padded.is_degenerate());

        let normal = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(normal.padded_if_degenerate(0.001), normal);
    }
}
