//! Geometry normalization: validity repair, reprojection into the
//! reference CRS and reduction to two dimensions.

use atlas_common::{AtlasError, AtlasResult, Crs, Feature, FeatureLayer, SourceLayer};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MapCoordsInPlace, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Validation,
};
use geojson::{Position, Value as GeoJsonValue};
use projection::GeographicTransform;
use tracing::debug;

use crate::repair::GeometryRepair;

/// Normalizes source layers into valid 2-D geometries in one reference CRS.
#[derive(Debug)]
pub struct GeometryNormalizer {
    reference: Crs,
    repair: Box<dyn GeometryRepair>,
}

impl GeometryNormalizer {
    /// Create a normalizer targeting `reference`.
    ///
    /// Only geographic WGS84 is supported as a reference frame, since every
    /// projection in the workspace is implemented as an inverse into it.
    pub fn new(reference: Crs, repair: Box<dyn GeometryRepair>) -> AtlasResult<Self> {
        if reference != Crs::WGS84 {
            return Err(AtlasError::InvalidConfig(format!(
                "reference CRS must be {}, got {}",
                Crs::WGS84,
                reference
            )));
        }
        Ok(Self { reference, repair })
    }

    pub fn reference(&self) -> Crs {
        self.reference
    }

    pub fn repair_name(&self) -> &'static str {
        self.repair.name()
    }

    /// Normalize one source layer.
    ///
    /// Fails with `MissingCrs` when the layer declares no CRS and with
    /// `UnsupportedCrs` when the declaration is unknown. Features without
    /// geometry are dropped.
    pub fn normalize(&self, source: SourceLayer) -> AtlasResult<FeatureLayer> {
        let declared = source
            .declared_crs
            .as_deref()
            .ok_or_else(|| AtlasError::MissingCrs {
                layer: source.path.clone(),
            })?;
        let crs = Crs::from_code_string(declared).map_err(|_| AtlasError::UnsupportedCrs {
            layer: source.path.clone(),
            crs: declared.to_string(),
        })?;

        let transform = if crs == self.reference {
            None
        } else {
            Some(GeographicTransform::for_crs(&crs))
        };

        let total = source.features.len();
        let mut repaired = 0usize;
        let mut features = Vec::with_capacity(total);

        for feature in source.features {
            let Some(raw) = feature.geometry else {
                continue;
            };

            let mut geometry = to_planar(&raw.value).map_err(|message| AtlasError::InvalidGeometry {
                layer: source.path.clone(),
                message,
            })?;

            if let Some(t) = transform.filter(|t| !t.is_identity()) {
                geometry.map_coords_in_place(|c| {
                    let (x, y) = t.to_lon_lat(c.x, c.y);
                    Coord { x, y }
                });
            }

            if !geometry.is_valid() {
                geometry = self.repair.rewrite(geometry);
                repaired += 1;
            }

            features.push(Feature::new(geometry, feature.properties));
        }

        debug!(
            layer = %source.name,
            source_crs = %crs,
            reprojected = transform.is_some(),
            repaired = repaired,
            dropped = total - features.len(),
            features = features.len(),
            repair = self.repair.name(),
            "Normalized layer"
        );

        Ok(FeatureLayer::new(
            source.name,
            source.path,
            self.reference,
            features,
        ))
    }
}

fn to_coord(position: &Position) -> Result<Coord<f64>, String> {
    match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        [_, _, ..] => Err(format!("non-finite position {:?}", position)),
        _ => Err(format!(
            "position with {} ordinate(s), at least 2 required",
            position.len()
        )),
    }
}

fn to_line(positions: &[Position]) -> Result<LineString<f64>, String> {
    positions
        .iter()
        .map(to_coord)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn to_polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|r| to_line(r));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(vec![]),
    };
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Convert a source geometry to 2-D, dropping elevation and measure
/// ordinates.
pub fn to_planar(value: &GeoJsonValue) -> Result<Geometry<f64>, String> {
    Ok(match value {
        GeoJsonValue::Point(position) => Geometry::Point(Point(to_coord(position)?)),
        GeoJsonValue::MultiPoint(positions) => Geometry::MultiPoint(MultiPoint::new(
            positions
                .iter()
                .map(|p| to_coord(p).map(Point))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        GeoJsonValue::LineString(positions) => Geometry::LineString(to_line(positions)?),
        GeoJsonValue::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString::new(
            lines
                .iter()
                .map(|l| to_line(l))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        GeoJsonValue::Polygon(rings) => Geometry::Polygon(to_polygon(rings)?),
        GeoJsonValue::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon::new(
            polygons
                .iter()
                .map(|p| to_polygon(p))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        GeoJsonValue::GeometryCollection(geometries) => {
            Geometry::GeometryCollection(GeometryCollection::from(
                geometries
                    .iter()
                    .map(|g| to_planar(&g.value))
                    .collect::<Result<Vec<_>, _>>()?,
            ))
        }
    })
}
