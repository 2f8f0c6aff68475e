//! Core mesh data types.

use nalgebra::{Point3, Vector3};

/// A vertex of an indexed mesh.
///
/// Coordinates are in the units of the source file; the crate is unit-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A triangle mesh with indexed vertices and faces.
///
/// Built from a [`PolygonSoup`](crate::PolygonSoup) by the mesher, which
/// guarantees that every face index is in range and that the three indices
/// of a face are distinct. Closedness and self-intersection are not
/// guaranteed until checked with [`validate_mesh`](crate::validate_mesh).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2] with counter-clockwise winding seen from outside.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh has no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;

        let (min, max) = self.vertices[1..]
            .iter()
            .fold((first, first), |(min, max), v| {
                (min.inf(&v.position), max.sup(&v.position))
            });

        Some((min, max))
    }

    /// Length of the bounding box diagonal.
    ///
    /// Zero for a mesh without vertices or with all vertices coincident.
    pub fn diagonal_length(&self) -> f64 {
        self.bounds()
            .map(|(min, max)| (max - min).norm())
            .unwrap_or(0.0)
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&face| self.triangle_of(face))
    }

    fn triangle_of(&self, [i0, i1, i2]: [u32; 3]) -> Triangle {
        Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        }
    }

    /// Append another mesh, offsetting its face indices.
    ///
    /// The two meshes are not connected: shared positions stay duplicated.
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().cloned());
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Signed volume enclosed by the surface (divergence theorem).
    ///
    /// Sums the signed volumes of the tetrahedra formed by each face and the
    /// origin. Positive for a closed, outward-oriented surface. The value is
    /// computed for open surfaces too but is not meaningful there.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|tri| tri.v0.coords.dot(&tri.v1.coords.cross(&tri.v2.coords)))
            .sum::<f64>()
            / 6.0
    }

    /// Reverse the winding of every face.
    pub fn flip_faces(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }
}

/// A triangle with concrete vertex positions.
///
/// Utility type for geometric calculations. Winding is counter-clockwise
/// when viewed from the front (normal points toward viewer).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    /// The direction follows the right-hand rule with CCW winding.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Axis-aligned bounds of the triangle.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        (
            self.v0.inf(&self.v1).inf(&self.v2),
            self.v0.sup(&self.v1).sup(&self.v2),
        )
    }

    /// Closest point on the triangle to `point`.
    ///
    /// Voronoi-region walk from "Real-Time Collision Detection" (Ericson).
    /// Degenerate triangles fall back to the closest point on their edges.
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let (a, b, c) = (self.v0, self.v1, self.v2);
        let ab = b - a;
        let ac = c - a;

        if ab.cross(&ac).norm_squared() <= f64::EPSILON * ab.norm_squared() * ac.norm_squared() {
            return [(a, b), (b, c), (c, a)]
                .into_iter()
                .map(|(p, q)| closest_point_on_segment(point, &p, &q))
                .min_by(|p, q| {
                    let dp = (p - point).norm_squared();
                    let dq = (q - point).norm_squared();
                    dp.total_cmp(&dq)
                })
                .unwrap_or(a);
        }

        let ap = point - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = point - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return a + ab * (d1 / (d1 - d3));
        }

        let cp = point - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        a + ab * (vb * denom) + ac * (vc * denom)
    }

    /// Euclidean distance from `point` to the triangle.
    #[inline]
    pub fn distance_to(&self, point: &Point3<f64>) -> f64 {
        (self.closest_point(point) - point).norm()
    }
}

fn closest_point_on_segment(point: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return *a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
