//! Closed outer surfaces around arbitrary triangle soups.
//!
//! The input may be open, non-manifold, or self-intersecting. A [`Wrapper`]
//! turns it into a closed, outward-oriented mesh lying `offset` away from
//! the input, with the smallest feature it resolves set by `alpha`. Both
//! come from [`WrapParams`], usually derived from the size of the input
//! with [`WrapParams::from_mesh`].
//!
//! # Example
//!
//! ```no_run
//! use mesh_soup::Mesh;
//! use mesh_wrap::{OffsetWrapper, RelativeParams, WrapParams, Wrapper};
//!
//! let mesh = Mesh::load("organ/struct.off").unwrap();
//! let params = WrapParams::from_mesh(&mesh, &RelativeParams::default()).unwrap();
//! let wrap = OffsetWrapper::default().wrap(&mesh, &params).unwrap();
//! assert!(wrap.validate().is_closed);
//! ```

mod error;
mod params;
mod wrapper;

pub mod offset;

pub use error::{WrapError, WrapResult};
pub use offset::OffsetWrapper;
pub use params::{RelativeParams, WrapParams, DEFAULT_RELATIVE_ALPHA, DEFAULT_RELATIVE_OFFSET};
pub use wrapper::Wrapper;
