//! Batch drivers over a `body/<organ>/<structure>` directory tree.

use std::path::{Path, PathBuf};
use std::time::Instant;

use mesh_soup::{save_mesh, Mesh};
use mesh_wrap::Wrapper;
use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};
use crate::pipeline::{load_merged, Pipeline, ProcessedStructure, StructureOutcome};
use crate::report::{OrganRow, ReportRow, ReportWriter, VOLUME_SCALE};

/// Default report name of the structures mode.
pub const STRUCTURE_REPORT: &str = "table_s8.csv";

/// Default report name of the organs mode.
pub const ORGAN_REPORT: &str = "volume_of_organ.csv";

/// Default output directory of the organs mode.
pub const ORGAN_OUTPUT_DIR: &str = "./alph_wrap";

/// Structure name used for whole-organ outcomes.
pub const WHOLE_ORGAN: &str = "*";

/// Totals of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Structures (or organs) that produced a mesh.
    pub processed: usize,
    /// Of those, how many were wrapped.
    pub wrapped: usize,
    /// Of those, how many used their fallback counterpart.
    pub fallbacks: usize,
    pub failed: usize,
    pub outcomes: Vec<StructureOutcome>,
}

impl BatchSummary {
    fn record(&mut self, outcome: StructureOutcome) {
        match &outcome {
            StructureOutcome::Processed {
                wrapped,
                used_fallback,
                ..
            } => {
                self.processed += 1;
                self.wrapped += usize::from(*wrapped);
                self.fallbacks += usize::from(*used_fallback);
            }
            StructureOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Outcomes that failed, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &StructureOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

/// Immediate entries of `dir`, sorted by name.
fn list_dir(dir: &Path) -> BatchResult<Vec<DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| BatchError::Walk {
            path: dir.to_path_buf(),
            source,
        })
}

/// Every file below `dir`, sorted by path.
fn list_files(dir: &Path) -> BatchResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| BatchError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Organ directories of `body_dir`, named by their stem. Other entries are
/// skipped with a warning.
fn organ_dirs(body_dir: &Path) -> BatchResult<Vec<(String, PathBuf)>> {
    if !body_dir.is_dir() {
        return Err(BatchError::MissingBodyDir {
            path: body_dir.to_path_buf(),
        });
    }

    let mut organs = Vec::new();
    for entry in list_dir(body_dir)? {
        if !entry.file_type().is_dir() {
            warn!("Skipping {}: not an organ directory", entry.path().display());
            continue;
        }
        let name = entry
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        organs.push((name, entry.into_path()));
    }
    Ok(organs)
}

/// Write a mesh, creating its parent directory.
fn save_output(mesh: &Mesh, path: &Path) -> BatchResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| BatchError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    save_mesh(mesh, path)?;
    Ok(())
}

/// Process every structure of every organ under `body_dir`.
///
/// Each file in an organ directory is one structure, named by its stem; each
/// sub-directory is one structure made of all the files inside it. Results
/// are written to `output_dir/<organ>/<structure>.<ext>` and one row per
/// structure is appended to the report at `report_path`.
///
/// Only a missing `body_dir` or an unwritable report abort the run.
pub fn run_structures(
    body_dir: &Path,
    output_dir: &Path,
    report_path: &Path,
    config: &BatchConfig,
    wrapper: &dyn Wrapper,
) -> BatchResult<BatchSummary> {
    let relative = config.relative_params()?;
    let format = config.output_format()?;
    let organs = organ_dirs(body_dir)?;
    let pipeline = Pipeline::new(wrapper, relative).with_fallback(config.fallback.as_ref());

    let mut report = ReportWriter::<ReportRow>::create(report_path)?;
    let mut summary = BatchSummary::default();
    let mut fallback_matched = false;
    let start = Instant::now();

    for (organ, organ_dir) in organs {
        info!("Organ {}", organ);

        let entries = match list_dir(&organ_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        for entry in entries {
            let (structure, sources) = if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                match list_files(entry.path()) {
                    Ok(files) => (name, files),
                    Err(e) => {
                        error!("{}", e);
                        (name, Vec::new())
                    }
                }
            } else {
                let name = entry
                    .path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (name, vec![entry.into_path()])
            };

            if let (Some(mapping), [source]) = (config.fallback.as_ref(), sources.as_slice()) {
                fallback_matched |= mapping.map(source).is_some();
            }

            info!("Processing {}/{}", organ, structure);
            let output = output_dir
                .join(&organ)
                .join(format!("{}.{}", structure, format.extension()));

            let result = pipeline
                .process_structure(&sources)
                .map_err(|e| e.to_string())
                .and_then(|processed| {
                    save_output(&processed.mesh, &output)
                        .map(|()| processed)
                        .map_err(|e| e.to_string())
                });

            let outcome = match result {
                Ok(processed) => {
                    report.write(&ReportRow {
                        organ: organ.clone(),
                        structure: structure.clone(),
                        volume: processed.volume,
                        before: processed.before,
                        after: processed.after,
                    })?;
                    processed_outcome(&organ, &structure, &processed, output)
                }
                Err(reason) => {
                    error!("{}/{} failed: {}", organ, structure, reason);
                    report.write(&ReportRow::failed(organ.as_str(), structure.as_str()))?;
                    StructureOutcome::Failed {
                        organ: organ.clone(),
                        structure,
                        reason,
                    }
                }
            };
            summary.record(outcome);
        }
    }

    if let Some(mapping) = config.fallback.as_ref().filter(|_| !fallback_matched) {
        if summary.processed > 0 {
            warn!(
                "Fallback prefix {} matched no structure under {}",
                mapping.from.display(),
                body_dir.display()
            );
        }
    }

    info!(
        "Processed {} structures ({} wrapped, {} failed) in {:.2?}",
        summary.processed,
        summary.wrapped,
        summary.failed,
        start.elapsed()
    );
    Ok(summary)
}

/// Wrap every organ under `body_dir` as one merged mesh.
///
/// All files of an organ, at any depth, are merged; files that fail to load
/// are skipped. The wrap is written to
/// `output_dir/alpha_wrap_<organ>_<alpha>_<offset>.<ext>` with the relative
/// factors truncated to integers, and one `organ,volume` row is appended to
/// the report. An organ with nothing loadable gets a volume of `0`.
pub fn run_organs(
    body_dir: &Path,
    output_dir: &Path,
    report_path: &Path,
    config: &BatchConfig,
    wrapper: &dyn Wrapper,
) -> BatchResult<BatchSummary> {
    let relative = config.relative_params()?;
    let format = config.output_format()?;
    let organs = organ_dirs(body_dir)?;
    let pipeline = Pipeline::new(wrapper, relative);

    let mut report = ReportWriter::<OrganRow>::create(report_path)?;
    let mut summary = BatchSummary::default();

    for (organ, organ_dir) in organs {
        info!("Wrapping organ {}", organ);
        let output = output_dir.join(format!(
            "alpha_wrap_{}_{}_{}.{}",
            organ,
            relative.relative_alpha as i64,
            relative.relative_offset as i64,
            format.extension()
        ));

        let result = list_files(&organ_dir)
            .map_err(|e| e.to_string())
            .and_then(|files| load_merged(&files).map_err(|e| e.to_string()))
            .and_then(|mesh| pipeline.wrap(&mesh).map_err(|e| e.to_string()))
            .and_then(|processed| {
                save_output(&processed.mesh, &output)
                    .map(|()| processed)
                    .map_err(|e| e.to_string())
            });

        let outcome = match result {
            Ok(processed) => {
                report.write(&OrganRow {
                    organ: organ.clone(),
                    volume: processed.volume,
                })?;
                processed_outcome(&organ, WHOLE_ORGAN, &processed, output)
            }
            Err(reason) => {
                error!("Organ {} failed: {}", organ, reason);
                report.write(&OrganRow {
                    organ: organ.clone(),
                    volume: 0.0,
                })?;
                StructureOutcome::Failed {
                    organ,
                    structure: WHOLE_ORGAN.to_string(),
                    reason,
                }
            }
        };
        summary.record(outcome);
    }

    Ok(summary)
}

fn processed_outcome(
    organ: &str,
    structure: &str,
    processed: &ProcessedStructure,
    output: PathBuf,
) -> StructureOutcome {
    info!(
        "{}/{}: volume {:.6}, watertight before: {}, after: {}",
        organ,
        structure,
        processed.volume / VOLUME_SCALE,
        processed.before,
        processed.after
    );
    StructureOutcome::Processed {
        organ: organ.to_string(),
        structure: structure.to_string(),
        volume: processed.volume,
        before: processed.before,
        after: processed.after,
        wrapped: processed.wrapped,
        used_fallback: processed.used_fallback,
        output,
    }
}
