//! Error types for wrap operations.

use thiserror::Error;

/// Result type alias for wrap operations.
pub type WrapResult<T> = Result<T, WrapError>;

/// Errors that can occur while deriving parameters or wrapping a mesh.
#[derive(Debug, Error)]
pub enum WrapError {
    /// Input mesh has no faces.
    #[error("input mesh is empty")]
    EmptyMesh,

    /// A wrap parameter is zero, negative, or not finite.
    #[error("invalid {name}: {value} (must be a positive finite number)")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The bounding box diagonal is zero, so no length scale can be derived.
    #[error("mesh bounding box is degenerate (diagonal length is zero)")]
    DegenerateBounds,

    /// Sampling lattice would be too large.
    #[error("sampling lattice too large: {dims:?} = {total} cells exceeds limit of {max}")]
    GridTooLarge {
        dims: [usize; 3],
        total: usize,
        max: usize,
    },

    /// Surface extraction produced no faces.
    #[error("wrap produced an empty mesh")]
    EmptyWrap,
}
