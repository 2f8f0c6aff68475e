//! Polygon soup and triangle mesh utilities.
//!
//! This crate provides the mesh side of the organ wrapping pipeline:
//!
//! - **Loading/Saving**: OFF, OBJ, STL, and 3MF formats
//! - **Orientation**: make the polygons of a soup agree with each other and face outward
//! - **Meshing**: turn a soup into an indexed triangle mesh
//! - **Validation**: closedness and self-intersection, combined into a watertightness check
//! - **Measurement**: bounding box, diagonal, signed volume
//!
//! # Example
//!
//! ```no_run
//! use mesh_soup::Mesh;
//!
//! // Load, orient, and triangulate
//! let mesh = Mesh::load("organ/struct.off").unwrap();
//!
//! let report = mesh.validate();
//! println!("{}", report);
//!
//! if report.is_fully_watertight() {
//!     println!("volume: {}", mesh.signed_volume());
//! }
//! ```

mod error;
mod soup;
mod types;

pub mod adjacency;
pub mod intersect;
pub mod io;
pub mod validate;
pub mod winding;

#[cfg(test)]
mod fixtures;

// Re-export core types at crate root
pub use error::{MeshError, MeshResult};
pub use soup::{polygon_soup_to_mesh, PolygonSoup};
pub use types::{Mesh, Triangle, Vertex};

pub use adjacency::MeshAdjacency;

// Re-export commonly used functions
pub use intersect::{has_self_intersections, self_intersections};
pub use io::{
    load_mesh, load_polygon_soup, read_polygon_soup, save_3mf, save_mesh, save_obj, save_off,
    save_stl, MeshFormat,
};
pub use validate::{log_validation, validate_mesh, MeshReport};
pub use winding::{orient_polygon_soup, OrientStats};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from a file, auto-detecting format from extension.
    ///
    /// The soup read from the file is oriented before triangulation.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh to a file, auto-detecting format from extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_mesh(self, path.as_ref())
    }

    /// Validate the mesh and return a report.
    pub fn validate(&self) -> MeshReport {
        validate::validate_mesh(self)
    }

    /// Closed and free of self-intersections.
    pub fn is_fully_watertight(&self) -> bool {
        self.validate().is_fully_watertight()
    }
}
