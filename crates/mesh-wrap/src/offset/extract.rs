//! Marching tetrahedra over the offset field.

use hashbrown::HashMap;
use mesh_soup::{Mesh, Vertex};
use nalgebra::Point3;

use super::field::OffsetField;
use super::lattice::{CUBE_CORNERS, KUHN_TETRAHEDRA};

/// Halvings applied to a lattice edge when placing a surface vertex.
pub const BISECTION_STEPS: usize = 40;

/// Extract the surface between exterior and interior nodes.
///
/// Every lattice edge joining an exterior node to an interior one carries
/// one vertex, placed by bisection where the distance to the input crosses
/// `offset`. Each cube of the lattice is split into six tetrahedra and each
/// tetrahedron contributes up to two triangles, oriented towards its
/// exterior nodes.
///
/// Triangles stay inside their tetrahedron and neighbouring tetrahedra
/// share the vertices on common edges, so the result is closed, manifold
/// and free of self-intersections.
pub fn extract_offset_surface(field: &OffsetField, outside: &[bool]) -> Mesh {
    let lattice = field.lattice();
    let mut extractor = Extractor {
        field,
        mesh: Mesh::new(),
        edge_vertices: HashMap::new(),
    };

    let [cx, cy, cz] = lattice.cells();
    for iz in 0..cz {
        for iy in 0..cy {
            for ix in 0..cx {
                let corners =
                    CUBE_CORNERS.map(|[dx, dy, dz]| lattice.node_index([ix + dx, iy + dy, iz + dz]));
                let out = corners.map(|n| outside[n]);
                if out.iter().all(|&o| o) || out.iter().all(|&o| !o) {
                    continue;
                }

                for tet in KUHN_TETRAHEDRA {
                    extractor.tetrahedron(tet, &corners, &out);
                }
            }
        }
    }

    extractor.mesh
}

struct Extractor<'a> {
    field: &'a OffsetField,
    mesh: Mesh,
    edge_vertices: HashMap<(usize, usize), u32>,
}

impl Extractor<'_> {
    /// Emit the surface inside one tetrahedron, given as corner numbers of
    /// the cube whose nodes are `corners`.
    fn tetrahedron(&mut self, tet: [usize; 4], corners: &[usize; 8], out: &[bool; 8]) {
        let (exterior, interior): (Vec<usize>, Vec<usize>) = tet.iter().copied().partition(|&c| out[c]);

        match (exterior.as_slice(), interior.as_slice()) {
            ([lone], others) | (others, [lone]) => {
                let lone_outside = out[*lone];
                let edge = |other: usize| if lone_outside { (*lone, other) } else { (other, *lone) };
                let p = [0, 1, 2].map(|i| {
                    let (a, b) = edge(others[i]);
                    self.edge_vertex(corners[a], corners[b])
                });

                // Facing the lone corner when it is outside, away otherwise.
                let det = corner_det(*lone, [others[0], others[1], others[2]]);
                if (det < 0) == lone_outside {
                    self.mesh.faces.push([p[0], p[1], p[2]]);
                } else {
                    self.mesh.faces.push([p[0], p[2], p[1]]);
                }
            }
            (&[a, b], &[c, d]) => {
                let ac = self.edge_vertex(corners[a], corners[c]);
                let ad = self.edge_vertex(corners[a], corners[d]);
                let bd = self.edge_vertex(corners[b], corners[d]);
                let bc = self.edge_vertex(corners[b], corners[c]);

                // The quad ac, ad, bd, bc faces `a` when d-a, b-a, c-a is
                // negatively oriented.
                if corner_det(a, [d, b, c]) < 0 {
                    self.mesh.faces.push([ac, ad, bd]);
                    self.mesh.faces.push([ac, bd, bc]);
                } else {
                    self.mesh.faces.push([ac, bd, ad]);
                    self.mesh.faces.push([ac, bc, bd]);
                }
            }
            _ => {}
        }
    }

    /// Vertex on the edge from exterior node `from` to interior node `to`.
    fn edge_vertex(&mut self, from: usize, to: usize) -> u32 {
        if let Some(&idx) = self.edge_vertices.get(&(from, to)) {
            return idx;
        }

        let lattice = self.field.lattice();
        let a = lattice.node_position(lattice.node_coords(from));
        let b = lattice.node_position(lattice.node_coords(to));
        let position = bisect(self.field, &a, &b);

        let idx = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(Vertex::new(position));
        self.edge_vertices.insert((from, to), idx);
        idx
    }
}

/// Point on `[a, b]` within `|b - a| / 2^BISECTION_STEPS` of a crossing of
/// the offset level, for `a` not near the input and `b` near it.
fn bisect(field: &OffsetField, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let step = b - a;
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if field.is_near(&(*a + step * mid)) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    *a + step * (0.5 * (lo + hi))
}

/// Determinant of the cube-corner offsets from `origin` to
/// each of `rows`. Exact, since corners are integer points.
fn corner_det(origin: usize, rows: [usize; 3]) -> i64 {
    let o = CUBE_CORNERS[origin];
    let [u, v, w] = rows.map(|r| {
        let c = CUBE_CORNERS[r];
        [0, 1, 2].map(|k| c[k] as i64 - o[k] as i64)
    });
    u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0]) + u[2] * (v[0] * w[1] - v[1] * w[0])
}

#[cfg(test)]
mod tests {
    use super::super::lattice::Lattice;
    use super::*;

    #[test]
    fn test_kuhn_tetrahedra_are_not_flat() {
        for [a, b, c, d] in KUHN_TETRAHEDRA {
            assert_eq!(corner_det(a, [b, c, d]).abs(), 1);
        }
        assert_eq!(corner_det(0, [1, 2, 4]), 1);
        assert_eq!(corner_det(0, [2, 1, 4]), -1);
    }

    #[test]
    fn test_bisection_lands_on_offset_level() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(-5.0, -5.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(5.0, -5.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 5.0, 0.0));
        mesh.faces.push([0, 1, 2]);

        let (min, max) = mesh.bounds().unwrap();
        let lattice = Lattice::from_bounds(min, max, 0.5, 1.5, usize::MAX).unwrap();
        let field = OffsetField::new(lattice, &mesh, 0.2);

        let p = bisect(&field, &Point3::new(0.1, 0.0, 0.6), &Point3::new(0.1, 0.0, 0.1));
        assert!((p.z - 0.2).abs() < 1e-9, "{:?}", p);
    }

    #[test]
    fn test_single_interior_node_gives_closed_cap() {
        // One interior node surrounded by exterior nodes: the cap around it
        // is a closed, outward surface.
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.01, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.01, 0.0));
        mesh.faces.push([0, 1, 2]);

        let lattice = Lattice::from_bounds(
            Point3::new(-2.0, -2.0, -2.0),
            Point3::new(2.0, 2.0, 2.0),
            1.0,
            0.0,
            usize::MAX,
        )
        .unwrap();
        let field = OffsetField::new(lattice, &mesh, 0.3);
        let outside = field.exterior_nodes();
        assert_eq!(outside.iter().filter(|&&o| !o).count(), 1);

        let cap = extract_offset_surface(&field, &outside);
        let report = cap.validate();
        assert!(report.is_fully_watertight(), "{}", report);
        assert!(cap.signed_volume() > 0.0);
        // One vertex per lattice edge leaving the node.
        assert_eq!(cap.vertex_count(), 14);
    }
}
