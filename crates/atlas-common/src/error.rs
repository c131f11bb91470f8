//! Error types for the urban-atlas pipeline.

use thiserror::Error;

/// Result type alias using AtlasError.
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Primary error type for loading, normalizing and composing layers.
#[derive(Debug, Error)]
pub enum AtlasError {
    // === Normalization Errors ===
    #[error("Layer '{layer}' declares no coordinate reference system; cannot normalize without a known source frame")]
    MissingCrs { layer: String },

    #[error("Layer '{layer}' uses unsupported CRS '{crs}'")]
    UnsupportedCrs { layer: String, crs: String },

    #[error("Invalid geometry in layer '{layer}': {message}")]
    InvalidGeometry { layer: String, message: String },

    // === Attribute Errors ===
    #[error("Could not resolve a year for '{path}': no '{column}' attribute and no 19xx/20xx in the file name")]
    UnresolvedYear { path: String, column: String },

    // === Source Errors ===
    #[error("Failed to read '{path}': {message}")]
    ReadFailure { path: String, message: String },

    #[error("No feature in '{path}' has {column} = '{value}'")]
    BoundaryNotFound {
        path: String,
        column: String,
        value: String,
    },

    #[error("Boundary '{path}' has no polygon geometry to dissolve")]
    EmptyBoundary { path: String },

    // === Configuration / Output Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write '{path}': {message}")]
    WriteFailure { path: String, message: String },
}

impl AtlasError {
    /// Whether this error must abort the whole run.
    ///
    /// Unresolved years only exclude the offending temporal layer. Read
    /// failures and malformed geometry are fatal only for mandatory sources,
    /// which the caller decides.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AtlasError::UnresolvedYear { .. }
                | AtlasError::ReadFailure { .. }
                | AtlasError::InvalidGeometry { .. }
        )
    }

    /// Short machine-readable code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            AtlasError::MissingCrs { .. } => "MissingCRS",
            AtlasError::UnsupportedCrs { .. } => "UnsupportedCRS",
            AtlasError::InvalidGeometry { .. } => "InvalidGeometry",
            AtlasError::UnresolvedYear { .. } => "UnresolvedYear",
            AtlasError::ReadFailure { .. } => "ReadFailure",
            AtlasError::BoundaryNotFound { .. } => "BoundaryNotFound",
            AtlasError::EmptyBoundary { .. } => "EmptyBoundary",
            AtlasError::InvalidConfig(_) => "InvalidConfig",
            AtlasError::WriteFailure { .. } => "WriteFailure",
        }
    }
}
