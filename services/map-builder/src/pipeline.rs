//! Source loading and the run of every pipeline stage.

use atlas_common::{AtlasError, AtlasResult, FeatureLayer};
use overlay_pipeline::{
    resolve_name, BoundaryOverlay, BoundsAggregator, GeometryNormalizer, LayerClassifier,
    MapComposer, PointMarkerSet, RenderSpec,
};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{MapBuilderConfig, SourceConfig};
use crate::sources::read_source;

/// Role a source plays in the map. Decides how its failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Boundary,
    LandUse,
    Markers,
}

/// The configured pipeline, ready to run.
#[derive(Debug)]
pub struct MapPipeline {
    config: MapBuilderConfig,
    normalizer: GeometryNormalizer,
    classifier: LayerClassifier,
    composer: MapComposer,
}

impl MapPipeline {
    /// Set up every stage from a validated configuration.
    ///
    /// The repair strategy is selected here, once.
    pub fn new(config: MapBuilderConfig) -> AtlasResult<Self> {
        config.validate()?;

        let normalizer = GeometryNormalizer::new(config.reference()?, config.repair.select())?;
        let classifier = LayerClassifier::new(
            config.land_use.category.clone(),
            config.land_use.year_column.clone(),
            config.land_use.colors.clone(),
        );
        let composer = MapComposer::new(
            config.map.clone(),
            config.land_use.colors.clone(),
            config.land_use.year_column.clone(),
            BoundsAggregator::new(config.fallback_viewport),
        );

        info!(
            reference = %normalizer.reference(),
            repair = normalizer.repair_name(),
            land_use_layers = config.land_use.sources.len(),
            "Pipeline configured"
        );

        Ok(Self {
            config,
            normalizer,
            classifier,
            composer,
        })
    }

    pub fn config(&self) -> &MapBuilderConfig {
        &self.config
    }

    fn load(&self, source: &SourceConfig) -> AtlasResult<FeatureLayer> {
        let layer = read_source(source)?;
        self.normalizer.normalize(layer)
    }

    /// Read and normalize every source in parallel.
    ///
    /// Results come back in submission order: boundary, land-use layers in
    /// configured order, then markers.
    fn load_all(&self) -> Vec<(Role, &SourceConfig, AtlasResult<FeatureLayer>)> {
        let mut jobs: Vec<(Role, &SourceConfig)> = vec![(Role::Boundary, &self.config.boundary.source)];
        jobs.extend(self.config.land_use.sources.iter().map(|s| (Role::LandUse, s)));
        jobs.extend(self.config.markers.source.iter().map(|s| (Role::Markers, s)));

        jobs.into_par_iter()
            .map(|(role, source)| (role, source, self.load(source)))
            .collect()
    }

    /// Run every stage and return the render spec.
    ///
    /// Boundary errors always abort. Land-use and marker sources are
    /// skipped on read failures and malformed geometry. A missing or
    /// unsupported CRS aborts regardless of the source.
    pub fn run(&self) -> AtlasResult<RenderSpec> {
        let mut boundary_layer = None;
        let mut land_use = Vec::with_capacity(self.config.land_use.sources.len());
        let mut marker_layer = None;

        for (role, source, result) in self.load_all() {
            let layer = match (role, result) {
                (_, Ok(layer)) => layer,
                (Role::Boundary, Err(e)) => return Err(e),
                (_, Err(e)) if e.is_fatal() => return Err(e),
                (role, Err(e)) => {
                    warn!(
                        source = %source.path.display(),
                        role = ?role,
                        code = e.code(),
                        error = %e,
                        "Skipping optional source"
                    );
                    continue;
                }
            };

            match role {
                Role::Boundary => boundary_layer = Some(layer),
                Role::LandUse => land_use.push((layer, source.path.display().to_string())),
                Role::Markers => marker_layer = Some(layer),
            }
        }

        let boundary_layer = boundary_layer.ok_or_else(|| AtlasError::ReadFailure {
            path: self.config.boundary.source.path.display().to_string(),
            message: "boundary source produced no layer".to_string(),
        })?;
        let boundary = BoundaryOverlay::from_layer(
            &boundary_layer,
            self.config.boundary.filter.as_ref(),
            self.config.boundary.style.clone(),
        )?;

        let groups = self.classifier.classify(land_use);
        if groups.is_empty() {
            warn!("No land-use layer survived classification, fitting the map to the boundary");
        }

        let names = &self.config.markers.names;
        let markers = match marker_layer {
            Some(layer) => PointMarkerSet::from_layer(
                self.config.markers.layer_name.clone(),
                &resolve_name(layer, names),
                &names.canonical,
                &names.fallback,
            ),
            None => PointMarkerSet::empty(self.config.markers.layer_name.clone()),
        };

        info!(
            boundary = %boundary.name,
            temporal_groups = groups.len(),
            markers = markers.len(),
            "Composing map"
        );
        Ok(self.composer.build(&boundary, groups, markers))
    }
}
