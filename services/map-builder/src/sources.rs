//! GeoJSON source reader.

use std::fs;
use std::path::Path;

use atlas_common::collection::{collection_name, declared_crs, parse_feature_collection};
use atlas_common::{AtlasError, AtlasResult, SourceFeature, SourceLayer};
use tracing::{debug, warn};

use crate::config::SourceConfig;

/// Read a GeoJSON FeatureCollection into a source layer.
///
/// The CRS comes from the file's `crs` member, else from the configured
/// `crs`. With neither, the layer declares no CRS and normalization will
/// refuse it.
pub fn read_source(source: &SourceConfig) -> AtlasResult<SourceLayer> {
    let path = source.path.display().to_string();
    let read_failure = |message: String| AtlasError::ReadFailure {
        path: path.clone(),
        message,
    };

    let content = fs::read_to_string(&source.path).map_err(|e| read_failure(e.to_string()))?;
    let collection = parse_feature_collection(&content).map_err(read_failure)?;

    let declared_crs = match (declared_crs(&collection), source.crs.as_deref()) {
        (Some(file), Some(configured)) => {
            if !file.eq_ignore_ascii_case(configured) {
                warn!(
                    source = %path,
                    file_crs = file,
                    configured_crs = configured,
                    "File declares its own CRS, ignoring configured CRS"
                );
            }
            Some(file.to_string())
        }
        (Some(file), None) => Some(file.to_string()),
        (None, configured) => configured.map(str::to_string),
    };

    let name = collection_name(&collection)
        .map(str::to_string)
        .unwrap_or_else(|| layer_name(&source.path));

    let features: Vec<SourceFeature> = collection
        .features
        .into_iter()
        .map(|f| SourceFeature {
            geometry: f.geometry,
            properties: f.properties.unwrap_or_default(),
        })
        .collect();

    debug!(
        source = %path,
        layer = %name,
        features = features.len(),
        crs = ?declared_crs,
        "Read source"
    );

    Ok(SourceLayer {
        name,
        path,
        declared_crs,
        features,
    })
}

/// File stem of a path, or the whole path when it has none.
fn layer_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_crs_wins() {
        let file = write_temp(
            r#"{"type": "FeatureCollection",
                "crs": {"type": "name", "properties": {"name": "EPSG:31983"}},
                "features": [{"type": "Feature", "properties": {"NOME": "Parque"},
                              "geometry": {"type": "Point", "coordinates": [310000, 7430000]}}]}"#,
        );
        let layer = read_source(&SourceConfig::new(file.path()).with_crs("EPSG:4326")).unwrap();
        assert_eq!(layer.declared_crs.as_deref(), Some("EPSG:31983"));
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.features[0].properties["NOME"], "Parque");
    }

    #[test]
    fn test_configured_crs_fills_in() {
        let file = write_temp(r#"{"type": "FeatureCollection", "features": []}"#);
        let layer = read_source(&SourceConfig::new(file.path()).with_crs("EPSG:4674")).unwrap();
        assert_eq!(layer.declared_crs.as_deref(), Some("EPSG:4674"));

        let layer = read_source(&SourceConfig::new(file.path())).unwrap();
        assert!(layer.declared_crs.is_none());
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let file = write_temp(r#"{"type": "FeatureCollection", "features": []}"#);
        let layer = read_source(&SourceConfig::new(file.path())).unwrap();
        let stem = file.path().file_stem().unwrap().to_str().unwrap();
        assert_eq!(layer.name, stem);
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let err = read_source(&SourceConfig::new("/nonexistent/parques.geojson")).unwrap_err();
        assert!(matches!(err, AtlasError::ReadFailure { ref path, .. } if path.contains("parques")));
    }

    #[test]
    fn test_malformed_json_is_read_failure() {
        let file = write_temp("{not json");
        assert!(matches!(
            read_source(&SourceConfig::new(file.path())),
            Err(AtlasError::ReadFailure { .. })
        ));
    }
}
