//! Map builder library.
//!
//! This module exposes the internal modules for testing purposes.

pub mod config;
pub mod html;
pub mod pipeline;
pub mod sources;

pub use config::MapBuilderConfig;
pub use pipeline::MapPipeline;
