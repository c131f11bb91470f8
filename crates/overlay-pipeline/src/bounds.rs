//! Union extent of normalized layers as a map viewport.

use atlas_common::{BoundingBox, FeatureLayer, Viewport};
use tracing::debug;

/// Padding in degrees applied to a zero-width or zero-height extent.
pub const DEGENERATE_PAD_DEGREES: f64 = 0.001;

/// Computes the viewport enclosing a set of layers.
#[derive(Debug, Clone, Copy)]
pub struct BoundsAggregator {
    fallback: Viewport,
}

impl BoundsAggregator {
    /// `fallback` is returned whenever no layer contributes an extent.
    pub fn new(fallback: Viewport) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> Viewport {
        self.fallback
    }

    /// Union extent of every non-empty layer, `None` if none contributes.
    ///
    /// Accepts `&FeatureLayer` or `Option<&FeatureLayer>` items; `None`
    /// entries and empty layers are skipped.
    pub fn extent<'a, I, L>(&self, layers: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<&'a FeatureLayer>>,
    {
        layers
            .into_iter()
            .filter_map(|layer| -> Option<&'a FeatureLayer> { layer.into() })
            .filter_map(|layer| layer.bounding_box())
            .reduce(|acc, b| acc.union(&b))
    }

    /// Viewport over every non-empty layer, or the fallback.
    ///
    /// Never fails and never returns an empty extent when data exists.
    pub fn aggregate<'a, I, L>(&self, layers: I) -> Viewport
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<&'a FeatureLayer>>,
    {
        match self.extent(layers) {
            Some(bbox) => Viewport::from_bbox(&bbox.padded_if_degenerate(DEGENERATE_PAD_DEGREES)),
            None => {
                debug!("No layer contributed bounds, using fallback viewport");
                self.fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;
    use serde_json::json;
    use test_utils::{extent_layer, feature_layer};

    fn aggregator() -> BoundsAggregator {
        BoundsAggregator::new(Viewport::new(-23.3, -47.2, -23.0, -46.7))
    }

    #[test]
    fn test_union_in_lat_lon_order() {
        let a = extent_layer("a.geojson", 0.0, 0.0, 1.0, 1.0);
        let b = extent_layer("b.geojson", 2.0, 2.0, 3.0, 3.0);
        let viewport = aggregator().aggregate([&a, &b]);
        assert_eq!(viewport, Viewport::from([[0.0, 0.0], [3.0, 3.0]]));
    }

    #[test]
    fn test_axes_are_not_swapped() {
        // lon -47..-46, lat -23..-22
        let layer = extent_layer("a.geojson", -47.0, -23.0, -46.0, -22.0);
        let viewport = aggregator().aggregate([&layer]);
        assert_eq!(viewport.south_west, [-23.0, -47.0]);
        assert_eq!(viewport.north_east, [-22.0, -46.0]);
    }

    #[test]
    fn test_empty_input_gives_fallback() {
        let none: [&FeatureLayer; 0] = [];
        assert_eq!(aggregator().aggregate(none), aggregator().fallback());
    }

    #[test]
    fn test_empty_and_missing_layers_are_skipped() {
        let empty = feature_layer("empty.geojson", vec![]);
        let a = extent_layer("a.geojson", 0.0, 0.0, 1.0, 1.0);
        let viewport = aggregator().aggregate([None, Some(&empty), Some(&a)]);
        assert_eq!(viewport, Viewport::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(aggregator().aggregate([Some(&empty), None]), aggregator().fallback());
    }

    #[test]
    fn test_single_point_is_padded() {
        let layer = feature_layer("p.geojson", vec![(point!(x: -46.9, y: -23.2).into(), json!({}))]);
        let viewport = aggregator().aggregate([&layer]);
        assert!(!viewport.to_bbox().is_degenerate());
        assert!(viewport.to_bbox().contains_point(-46.9, -23.2));
        assert!((viewport.north_east[0] - viewport.south_west[0] - 2.0 * DEGENERATE_PAD_DEGREES).abs() < 1e-12);
    }
}
