//! Shared test meshes.

use crate::{Mesh, PolygonSoup, Vertex};
use nalgebra::Point3;

/// Axis-aligned cube `[0, size]^3` with outward winding.
pub(crate) fn cube(size: f64) -> Mesh {
    let mut mesh = Mesh::new();
    for (x, y, z) in cube_corners(size) {
        mesh.vertices.push(Vertex::from_coords(x, y, z));
    }
    mesh.faces.extend_from_slice(&CUBE_FACES);
    mesh
}

/// The same cube as a soup of quads.
pub(crate) fn cube_soup(size: f64) -> PolygonSoup {
    PolygonSoup {
        points: cube_corners(size)
            .into_iter()
            .map(|(x, y, z)| Point3::new(x, y, z))
            .collect(),
        polygons: vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ],
    }
}

/// Regular-ish tetrahedron with outward winding.
pub(crate) fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.5, 1.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.5, 0.5, 1.0));

    mesh.faces.push([0, 2, 1]);
    mesh.faces.push([0, 1, 3]);
    mesh.faces.push([1, 2, 3]);
    mesh.faces.push([2, 0, 3]);

    mesh
}

fn cube_corners(size: f64) -> [(f64, f64, f64); 8] {
    [
        (0.0, 0.0, 0.0),
        (size, 0.0, 0.0),
        (size, size, 0.0),
        (0.0, size, 0.0),
        (0.0, 0.0, size),
        (size, 0.0, size),
        (size, size, size),
        (0.0, size, size),
    ]
}

const CUBE_FACES: [[u32; 3]; 12] = [
    [0, 2, 1],
    [0, 3, 2],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [2, 3, 7],
    [2, 7, 6],
    [0, 4, 7],
    [0, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];
