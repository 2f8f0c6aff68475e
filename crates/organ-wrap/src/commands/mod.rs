//! Subcommand implementations.

pub mod check;
pub mod organs;
pub mod structures;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use organ_wrap::{BatchConfig, OutputFormat};
use tracing::debug;

/// Options shared by every subcommand.
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Wrap settings accepted by both batch modes.
#[derive(Args)]
pub struct WrapOverrides {
    /// Output mesh extension (off, obj, stl, 3mf)
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Largest sampling lattice, in cells, the wrapper may allocate
    #[arg(long)]
    pub max_cells: Option<usize>,
}

/// Build the batch configuration: defaults, then the config file, then
/// command-line values.
pub fn resolve_config(
    global: &GlobalOptions,
    relative_alpha: Option<f64>,
    relative_offset: Option<f64>,
    overrides: &WrapOverrides,
) -> Result<BatchConfig> {
    let mut config = match &global.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };

    if let Some(alpha) = relative_alpha {
        config.relative_alpha = alpha;
    }
    if let Some(offset) = relative_offset {
        config.relative_offset = offset;
    }
    if let Some(extension) = &overrides.extension {
        config.extension = extension.clone();
    }
    if let Some(max_cells) = overrides.max_cells {
        config.max_cells = max_cells;
    }

    config.validate().context("Invalid batch settings")?;
    debug!("Batch settings: {:?}", config);
    Ok(config)
}
