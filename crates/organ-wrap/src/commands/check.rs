//! Classify mesh files without wrapping them.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use mesh_soup::{load_mesh, log_validation, validate_mesh, MeshReport};
use organ_wrap::{output, OutputFormat, VOLUME_SCALE};
use serde::Serialize;
use tracing::error;

use super::GlobalOptions;

#[derive(Args)]
pub struct CheckArgs {
    /// Mesh files to classify
    #[arg(required = true)]
    pub meshes: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CheckReport {
    path: PathBuf,
    vertices: usize,
    faces: usize,
    is_closed: bool,
    self_intersects: bool,
    boundary_edges: usize,
    non_manifold_edges: usize,
    intersecting_pairs: usize,
    fully_watertight: bool,
    volume: f64,
}

impl CheckReport {
    fn new(path: PathBuf, report: &MeshReport, volume: f64) -> Self {
        Self {
            path,
            vertices: report.vertex_count,
            faces: report.face_count,
            is_closed: report.is_closed,
            self_intersects: report.self_intersects,
            boundary_edges: report.boundary_edge_count,
            non_manifold_edges: report.non_manifold_edge_count,
            intersecting_pairs: report.intersecting_pair_count,
            fully_watertight: report.is_fully_watertight(),
            volume: volume * VOLUME_SCALE,
        }
    }
}

pub fn execute(args: CheckArgs, global: &GlobalOptions) -> Result<()> {
    let mut reports = Vec::with_capacity(args.meshes.len());
    let mut failed = 0usize;

    for path in args.meshes {
        let mesh = match load_mesh(&path) {
            Ok(mesh) => mesh,
            Err(e) => {
                error!("Cannot open file {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        let report = validate_mesh(&mesh);
        log_validation(&report);

        if global.format == OutputFormat::Text && !global.quiet {
            println!("{}", path.display());
            print!("{}", report);
        }
        reports.push(CheckReport::new(path, &report, mesh.signed_volume()));
    }

    output::print(&reports, global.format, global.quiet);

    if failed > 0 {
        bail!("{} of {} meshes could not be loaded", failed, failed + reports.len());
    }
    Ok(())
}
