//! Whole-organ batch mode.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mesh_wrap::OffsetWrapper;
use organ_wrap::batch::{ORGAN_OUTPUT_DIR, ORGAN_REPORT};
use organ_wrap::{output, run_organs};
use tracing::info;

use super::{resolve_config, GlobalOptions, WrapOverrides};

#[derive(Args)]
pub struct OrgansArgs {
    /// Directory holding one sub-directory per organ
    pub body_dir: PathBuf,

    /// Bounding box diagonal divided by this gives the wrap's alpha [default: 50]
    #[arg(allow_negative_numbers = true)]
    pub relative_alpha: Option<f64>,

    /// Bounding box diagonal divided by this gives the wrap's offset [default: 600]
    #[arg(allow_negative_numbers = true)]
    pub relative_offset: Option<f64>,

    /// Directory receiving the organ wraps
    #[arg(short, long, default_value = ORGAN_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// CSV report path
    #[arg(short, long, default_value = ORGAN_REPORT)]
    pub report: PathBuf,

    #[command(flatten)]
    pub wrap: WrapOverrides,
}

pub fn execute(args: OrgansArgs, global: &GlobalOptions) -> Result<()> {
    let config = resolve_config(global, args.relative_alpha, args.relative_offset, &args.wrap)?;

    info!(
        "Organs of {} -> {} (relative alpha {}, relative offset {})",
        args.body_dir.display(),
        args.output_dir.display(),
        config.relative_alpha,
        config.relative_offset
    );

    let wrapper = OffsetWrapper::new(config.max_cells);
    let summary = run_organs(&args.body_dir, &args.output_dir, &args.report, &config, &wrapper)?;

    output::summary(&summary, global.format, global.quiet);
    Ok(())
}
