//! Batch watertightness check, shrink wrap, and volume report for
//! anatomical meshes.
//!
//! A body directory holds one directory per organ, each containing one mesh
//! file (or one directory of mesh files) per anatomical structure. Every
//! structure is classified; structures that are not fully watertight are
//! swapped for their fallback counterpart when one is configured, and
//! wrapped when that counterpart is missing or not watertight either.
//! Volumes and flags go to a CSV report, meshes to a mirrored output tree.
//!
//! ```no_run
//! use std::path::Path;
//! use mesh_wrap::OffsetWrapper;
//! use organ_wrap::{run_structures, BatchConfig};
//!
//! let summary = run_structures(
//!     Path::new("body"),
//!     Path::new("out"),
//!     Path::new("table_s8.csv"),
//!     &BatchConfig::default(),
//!     &OffsetWrapper::default(),
//! )
//! .unwrap();
//! println!("{} structures, {} failed", summary.processed, summary.failed);
//! ```

mod error;

pub mod batch;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod report;

pub use batch::{run_organs, run_structures, BatchSummary};
pub use config::{BatchConfig, FallbackMapping};
pub use error::{BatchError, BatchResult};
pub use pipeline::{Pipeline, ProcessedStructure, StructureError, StructureOutcome};
pub use report::{OrganRow, ReportRow, ReportWriter, VOLUME_SCALE};

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON documents on stdout.
    Json,
}
