//! Mesh validation and reporting.
//!
//! The watertightness classifier: a mesh is fully watertight when it is
//! closed (every edge borders exactly two faces) and none of its faces
//! intersect each other.

use nalgebra::Point3;
use tracing::{debug, info};

use crate::adjacency::MeshAdjacency;
use crate::intersect::self_intersections;
use crate::Mesh;

/// Validation report for a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshReport {
    /// Whether the mesh has faces and every edge borders exactly two of them.
    pub is_closed: bool,

    /// Whether any two faces intersect beyond their shared corners.
    pub self_intersects: bool,

    /// Number of boundary edges (edges with 1 adjacent face).
    pub boundary_edge_count: usize,

    /// Number of non-manifold edges (edges with >2 adjacent faces).
    pub non_manifold_edge_count: usize,

    /// Number of intersecting face pairs.
    pub intersecting_pair_count: usize,

    /// Total vertex count.
    pub vertex_count: usize,

    /// Total face count.
    pub face_count: usize,

    /// Bounding box as (min_corner, max_corner).
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
}

impl MeshReport {
    /// Closed and free of self-intersections.
    pub fn is_fully_watertight(&self) -> bool {
        self.is_closed && !self.self_intersects
    }

    /// Dimensions (x, y, z) of the bounding box.
    pub fn dimensions(&self) -> Option<(f64, f64, f64)> {
        self.bounds
            .map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "NO"
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;

        if let Some((min, max)) = &self.bounds {
            writeln!(
                f,
                "  Bounds: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }

        if let Some((dx, dy, dz)) = self.dimensions() {
            writeln!(f, "  Dimensions: {:.3} x {:.3} x {:.3}", dx, dy, dz)?;
        }

        writeln!(
            f,
            "  Closed: {} (boundary edges: {}, non-manifold edges: {})",
            yes_no(self.is_closed),
            self.boundary_edge_count,
            self.non_manifold_edge_count
        )?;

        writeln!(
            f,
            "  Self-intersecting: {} (face pairs: {})",
            if self.self_intersects { "YES" } else { "no" },
            self.intersecting_pair_count
        )?;

        writeln!(
            f,
            "  Fully watertight: {}",
            yes_no(self.is_fully_watertight())
        )?;

        Ok(())
    }
}

/// Validate a mesh and return a report.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let intersecting_pair_count = self_intersections(mesh).len();

    let report = MeshReport {
        is_closed: adjacency.is_closed(),
        self_intersects: intersecting_pair_count > 0,
        boundary_edge_count: adjacency.boundary_edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        intersecting_pair_count,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        bounds: mesh.bounds(),
    };

    if !report.is_closed {
        debug!(
            "Mesh is not closed: {} boundary edges, {} non-manifold edges",
            report.boundary_edge_count, report.non_manifold_edge_count
        );
    }
    if report.self_intersects {
        debug!(
            "Mesh self-intersects: {} face pairs",
            report.intersecting_pair_count
        );
    }

    report
}

/// Log a one-line summary of a validation report.
pub fn log_validation(report: &MeshReport) {
    info!(
        "Mesh: {} verts, {} faces, closed: {}, self-intersecting: {}",
        report.vertex_count,
        report.face_count,
        yes_no(report.is_closed),
        if report.self_intersects { "YES" } else { "no" },
    );
}
