//! Per-structure batch mode.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mesh_wrap::OffsetWrapper;
use organ_wrap::batch::STRUCTURE_REPORT;
use organ_wrap::{output, run_structures, FallbackMapping};
use tracing::info;

use super::{resolve_config, GlobalOptions, WrapOverrides};

#[derive(Args)]
pub struct StructuresArgs {
    /// Directory holding one sub-directory per organ
    pub body_dir: PathBuf,

    /// Directory receiving `<organ>/<structure>.<ext>` meshes
    pub output_dir: PathBuf,

    /// Bounding box diagonal divided by this gives the wrap's alpha [default: 50]
    #[arg(allow_negative_numbers = true)]
    pub relative_alpha: Option<f64>,

    /// Bounding box diagonal divided by this gives the wrap's offset [default: 600]
    #[arg(allow_negative_numbers = true)]
    pub relative_offset: Option<f64>,

    /// CSV report path
    #[arg(short, long, default_value = STRUCTURE_REPORT)]
    pub report: PathBuf,

    /// Path prefix of the inputs to replace when looking for fallback counterparts
    #[arg(long, requires = "fallback_to")]
    pub fallback_from: Option<PathBuf>,

    /// Prefix of the counterparts replacing `--fallback-from`
    #[arg(long, requires = "fallback_from")]
    pub fallback_to: Option<PathBuf>,

    #[command(flatten)]
    pub wrap: WrapOverrides,
}

pub fn execute(args: StructuresArgs, global: &GlobalOptions) -> Result<()> {
    let mut config = resolve_config(global, args.relative_alpha, args.relative_offset, &args.wrap)?;
    if let (Some(from), Some(to)) = (args.fallback_from, args.fallback_to) {
        config.fallback = Some(FallbackMapping::new(from, to));
    }

    info!(
        "Structures of {} -> {} (relative alpha {}, relative offset {})",
        args.body_dir.display(),
        args.output_dir.display(),
        config.relative_alpha,
        config.relative_offset
    );

    let wrapper = OffsetWrapper::new(config.max_cells);
    let summary = run_structures(&args.body_dir, &args.output_dir, &args.report, &config, &wrapper)?;

    output::summary(&summary, global.format, global.quiet);
    Ok(())
}
