//! The wrapping strategy interface.

use mesh_soup::Mesh;

use crate::error::WrapResult;
use crate::params::WrapParams;

/// Computes a closed outer surface around a triangle mesh.
///
/// Implementations must return a mesh in which every edge borders exactly
/// two faces, oriented outward, lying within `params.offset` Hausdorff
/// distance of the input, with features narrower than about `params.alpha`
/// closed over. The input may be open, non-manifold, or self-intersecting.
pub trait Wrapper {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Wrap `mesh` with the given absolute parameters.
    fn wrap(&self, mesh: &Mesh, params: &WrapParams) -> WrapResult<Mesh>;
}

impl<W: Wrapper + ?Sized> Wrapper for &W {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn wrap(&self, mesh: &Mesh, params: &WrapParams) -> WrapResult<Mesh> {
        (**self).wrap(mesh, params)
    }
}

impl<W: Wrapper + ?Sized> Wrapper for Box<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn wrap(&self, mesh: &Mesh, params: &WrapParams) -> WrapResult<Mesh> {
        (**self).wrap(mesh, params)
    }
}
