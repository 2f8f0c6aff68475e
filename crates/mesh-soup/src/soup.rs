//! Polygon soups and their conversion to indexed meshes.

use nalgebra::Point3;
use tracing::debug;

use crate::{Mesh, Vertex};

/// An unstructured collection of points and polygons.
///
/// Nothing is guaranteed about connectivity, manifoldness, or orientation;
/// polygons may even reference points that do not exist. This is what the
/// loaders produce and what [`orient_polygon_soup`](crate::orient_polygon_soup)
/// and [`polygon_soup_to_mesh`] consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonSoup {
    /// Point positions.
    pub points: Vec<Point3<f64>>,

    /// Polygons as ordered lists of point indices.
    pub polygons: Vec<Vec<u32>>,
}

impl PolygonSoup {
    /// Create an empty soup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the soup has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Build an indexed triangle mesh from the soup.
    pub fn to_mesh(&self) -> Mesh {
        polygon_soup_to_mesh(self)
    }

    /// A polygon is usable when it has at least three distinct corners, all
    /// of them referencing existing points.
    pub(crate) fn is_valid_polygon(&self, polygon: &[u32]) -> bool {
        let n = self.points.len();
        if polygon.len() < 3 || polygon.iter().any(|&i| i as usize >= n) {
            return false;
        }
        let mut sorted = polygon.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len() >= 3
    }
}

/// Convert a polygon soup into an indexed triangle mesh.
///
/// Points are copied as-is. Polygons that reference missing points or have
/// fewer than three distinct corners are dropped; the others are
/// fan-triangulated from their first corner, skipping fan triangles that
/// would repeat an index. The result may have zero faces.
pub fn polygon_soup_to_mesh(soup: &PolygonSoup) -> Mesh {
    let mut mesh = Mesh::with_capacity(soup.points.len(), soup.polygons.len());
    mesh.vertices
        .extend(soup.points.iter().map(|&p| Vertex::new(p)));

    let mut dropped = 0usize;
    for polygon in &soup.polygons {
        if !soup.is_valid_polygon(polygon) {
            dropped += 1;
            continue;
        }

        let apex = polygon[0];
        for pair in polygon[1..].windows(2) {
            let (b, c) = (pair[0], pair[1]);
            if apex != b && b != c && apex != c {
                mesh.faces.push([apex, b, c]);
            }
        }
    }

    if dropped > 0 {
        debug!("Dropped {} invalid polygons while meshing soup", dropped);
    }
    debug!(
        "Meshed soup: {} points, {} polygons -> {} faces",
        soup.points.len(),
        soup.polygons.len(),
        mesh.faces.len()
    );

    mesh
}
