//! Municipal land-use map builder.
//!
//! Reads the boundary, land-use and point-of-interest sources named in
//! the configuration and writes one self-contained HTML map.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use map_builder::html::{render_document, write_document};
use map_builder::{MapBuilderConfig, MapPipeline};

#[derive(Parser, Debug)]
#[command(name = "map-builder")]
#[command(about = "Builds an interactive land-use map from vector sources")]
struct Args {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long, env = "MAP_BUILDER_CONFIG")]
    config: Option<PathBuf>,

    /// Output HTML path, overrides the configured one
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the result line
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let mut config = match &args.config {
        Some(path) => MapBuilderConfig::load(path)?,
        None => {
            info!("No configuration file given, using built-in defaults");
            MapBuilderConfig::default()
        }
    };
    if let Some(output) = args.output {
        config.output = output;
    }

    let output = config.output.clone();
    let pipeline = MapPipeline::new(config).context("Invalid configuration")?;
    let spec = pipeline.run().context("Failed to build map")?;

    let document = render_document(&spec)?;
    write_document(&output, &document)
        .with_context(|| format!("Failed to save map to {}", output.display()))?;

    info!(path = %output.display(), layers = spec.layers.len(), "Map written");
    println!("Saved: {}", output.display());
    Ok(())
}
