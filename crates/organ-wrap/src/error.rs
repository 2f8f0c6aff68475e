//! Error types for batch runs.

use std::path::PathBuf;
use thiserror::Error;

use mesh_soup::MeshError;
use mesh_wrap::WrapError;

/// Result type alias for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that abort a whole batch.
///
/// Problems with a single structure never surface here; they become a
/// failed outcome and a marker row in the report.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The body directory does not exist or is not a directory.
    #[error("body directory not found: {path}")]
    MissingBodyDir { path: PathBuf },

    /// Error reading the configuration file.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing the configuration file.
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Output extension not supported by the mesh writers.
    #[error("unsupported output extension: {0:?}")]
    UnsupportedExtension(String),

    /// Invalid wrap parameters.
    #[error(transparent)]
    Parameters(#[from] WrapError),

    /// Error creating or writing the CSV report.
    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Error creating an output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error listing a directory.
    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Mesh error outside of a single structure.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
