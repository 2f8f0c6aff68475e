//! Self-intersection detection.
//!
//! A bounding volume hierarchy over face boxes finds candidate pairs; each
//! pair is then decided with exact orientation predicates. Pairs that share
//! mesh vertices are only reported when they overlap beyond what they share,
//! so a regular closed surface never intersects itself.

use nalgebra::{Point3, Vector3};
use robust::{orient2d, orient3d, Coord, Coord3D};
use tracing::debug;

use crate::Mesh;

const MAX_LEAF_SIZE: usize = 8;

// ============================================================================
// BVH (Bounding Volume Hierarchy) for acceleration
// ============================================================================

/// Axis-aligned bounding box for BVH.
#[derive(Debug, Clone)]
struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    fn expand(&mut self, other: &Aabb) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    fn intersects(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || other.max.x < self.min.x
            || self.max.y < other.min.y
            || other.max.y < self.min.y
            || self.max.z < other.min.z
            || other.max.z < self.min.z)
    }

    fn center(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) * 0.5
    }

    fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        bbox: Aabb,
        faces: Vec<u32>,
    },
    Internal {
        bbox: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

/// BVH tree over the faces of one mesh.
struct Bvh {
    boxes: Vec<Aabb>,
    root: Option<BvhNode>,
}

impl Bvh {
    fn build(mesh: &Mesh) -> Self {
        let boxes: Vec<Aabb> = mesh
            .triangles()
            .map(|tri| {
                let (min, max) = tri.bounds();
                Aabb { min, max }
            })
            .collect();

        let root = if boxes.is_empty() {
            None
        } else {
            let indices: Vec<u32> = (0..boxes.len() as u32).collect();
            Some(Self::build_recursive(&boxes, indices))
        };

        Self { boxes, root }
    }

    fn build_recursive(boxes: &[Aabb], mut indices: Vec<u32>) -> BvhNode {
        let mut bbox = Aabb::empty();
        for &i in &indices {
            bbox.expand(&boxes[i as usize]);
        }

        if indices.len() <= MAX_LEAF_SIZE {
            return BvhNode::Leaf {
                bbox,
                faces: indices,
            };
        }

        let axis = bbox.longest_axis();
        indices.sort_by(|&a, &b| {
            boxes[a as usize]
                .center(axis)
                .total_cmp(&boxes[b as usize].center(axis))
        });

        let right_indices = indices.split_off(indices.len() / 2);
        let left = Self::build_recursive(boxes, indices);
        let right = Self::build_recursive(boxes, right_indices);

        BvhNode::Internal {
            bbox,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Collect faces whose boxes overlap `query`.
    fn query(&self, query: &Aabb, result: &mut Vec<u32>) {
        result.clear();
        if let Some(root) = &self.root {
            Self::query_recursive(root, query, result);
        }
    }

    fn query_recursive(node: &BvhNode, query: &Aabb, result: &mut Vec<u32>) {
        match node {
            BvhNode::Leaf { bbox, faces } => {
                if bbox.intersects(query) {
                    result.extend(faces.iter().copied());
                }
            }
            BvhNode::Internal { bbox, left, right } => {
                if bbox.intersects(query) {
                    Self::query_recursive(left, query, result);
                    Self::query_recursive(right, query, result);
                }
            }
        }
    }
}

/// Find all pairs of faces that intersect each other.
///
/// Pairs are returned as `(i, j)` with `i < j`, sorted. Degenerate faces
/// (collinear corners) are ignored.
pub fn self_intersections(mesh: &Mesh) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for_each_intersecting_pair(mesh, |i, j| {
        pairs.push((i, j));
        true
    });
    pairs.sort_unstable();

    debug!("Found {} self-intersecting face pairs", pairs.len());
    pairs
}

/// Check whether any two faces of the mesh intersect.
///
/// Stops at the first intersecting pair.
pub fn has_self_intersections(mesh: &Mesh) -> bool {
    let mut found = false;
    for_each_intersecting_pair(mesh, |_, _| {
        found = true;
        false
    });
    found
}

/// Visit intersecting pairs until `visit` returns false.
fn for_each_intersecting_pair(mesh: &Mesh, mut visit: impl FnMut(u32, u32) -> bool) {
    let bvh = Bvh::build(mesh);
    let degenerate: Vec<bool> = mesh.triangles().map(|t| is_degenerate(&t.v0, &t.v1, &t.v2)).collect();
    let mut candidates = Vec::new();

    for (i, face) in mesh.faces.iter().enumerate() {
        if degenerate[i] {
            continue;
        }
        bvh.query(&bvh.boxes[i], &mut candidates);

        for &j in &candidates {
            let j_idx = j as usize;
            if j_idx <= i || degenerate[j_idx] {
                continue;
            }
            if faces_intersect(mesh, face, &mesh.faces[j_idx]) && !visit(i as u32, j) {
                return;
            }
        }
    }
}

// ============================================================================
// Exact predicates
// ============================================================================

#[inline]
fn c3(p: &Point3<f64>) -> Coord3D<f64> {
    Coord3D {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

/// Sign of the volume of tetrahedron (a, b, c, d): -1, 0 or 1.
#[inline]
fn orient(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> i8 {
    sign(orient3d(c3(a), c3(b), c3(c), c3(d)))
}

#[inline]
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn is_degenerate(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
    let plane = Plane2::for_triangle(a, b, c);
    plane.orient(a, b, c) == 0
}

/// Projection of a plane onto the coordinate plane that preserves the most
/// area, for deciding coplanar configurations in 2D.
#[derive(Debug, Clone, Copy)]
struct Plane2 {
    u: usize,
    v: usize,
}

impl Plane2 {
    fn for_triangle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Self {
        let n: Vector3<f64> = (b - a).cross(&(c - a));
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        if ax >= ay && ax >= az {
            Self { u: 1, v: 2 }
        } else if ay >= az {
            Self { u: 2, v: 0 }
        } else {
            Self { u: 0, v: 1 }
        }
    }

    #[inline]
    fn coord(&self, p: &Point3<f64>) -> Coord<f64> {
        Coord {
            x: p[self.u],
            y: p[self.v],
        }
    }

    fn orient(&self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> i8 {
        sign(orient2d(self.coord(a), self.coord(b), self.coord(c)))
    }

    /// Closed point-in-triangle test.
    fn point_in_triangle(&self, p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
        let d1 = self.orient(a, b, p);
        let d2 = self.orient(b, c, p);
        let d3 = self.orient(c, a, p);
        let has_neg = d1 < 0 || d2 < 0 || d3 < 0;
        let has_pos = d1 > 0 || d2 > 0 || d3 > 0;
        !(has_neg && has_pos)
    }

    /// Closed segment/segment test, collinear overlap included.
    fn segments_intersect(&self, p0: &Point3<f64>, p1: &Point3<f64>, q0: &Point3<f64>, q1: &Point3<f64>) -> bool {
        let o1 = self.orient(p0, p1, q0);
        let o2 = self.orient(p0, p1, q1);
        let o3 = self.orient(q0, q1, p0);
        let o4 = self.orient(q0, q1, p1);

        if o1 != o2 && o3 != o4 && o1 * o2 <= 0 && o3 * o4 <= 0 {
            return true;
        }

        (o1 == 0 && self.on_segment(p0, p1, q0))
            || (o2 == 0 && self.on_segment(p0, p1, q1))
            || (o3 == 0 && self.on_segment(q0, q1, p0))
            || (o4 == 0 && self.on_segment(q0, q1, p1))
    }

    /// Whether collinear point `p` lies within the span of segment (a, b).
    fn on_segment(&self, a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>) -> bool {
        let (pa, pb, pp) = (self.coord(a), self.coord(b), self.coord(p));
        pp.x >= pa.x.min(pb.x)
            && pp.x <= pa.x.max(pb.x)
            && pp.y >= pa.y.min(pb.y)
            && pp.y <= pa.y.max(pb.y)
    }

    /// Closed segment/triangle test for a segment lying in the triangle's plane.
    fn segment_meets_triangle(
        &self,
        s0: &Point3<f64>,
        s1: &Point3<f64>,
        [a, b, c]: [&Point3<f64>; 3],
    ) -> bool {
        self.point_in_triangle(s0, a, b, c)
            || self.point_in_triangle(s1, a, b, c)
            || self.segments_intersect(s0, s1, a, b)
            || self.segments_intersect(s0, s1, b, c)
            || self.segments_intersect(s0, s1, c, a)
    }
}

/// Closed segment/triangle intersection in 3D.
fn segment_meets_triangle(s0: &Point3<f64>, s1: &Point3<f64>, tri: [&Point3<f64>; 3]) -> bool {
    let [a, b, c] = tri;
    let o0 = orient(a, b, c, s0);
    let o1 = orient(a, b, c, s1);

    if o0 == 0 && o1 == 0 {
        return Plane2::for_triangle(a, b, c).segment_meets_triangle(s0, s1, tri);
    }
    if o0 == o1 {
        return false;
    }

    // The segment crosses the plane; it hits the triangle when the line
    // through it sees the three edges with compatible orientations.
    let e0 = orient(s0, s1, a, b);
    let e1 = orient(s0, s1, b, c);
    let e2 = orient(s0, s1, c, a);
    let has_neg = e0 < 0 || e1 < 0 || e2 < 0;
    let has_pos = e0 > 0 || e1 > 0 || e2 > 0;
    !(has_neg && has_pos)
}

/// Closed triangle/triangle intersection for triangles without shared corners.
fn triangles_intersect(t: [&Point3<f64>; 3], u: [&Point3<f64>; 3]) -> bool {
    let [a0, a1, a2] = t;
    let [b0, b1, b2] = u;

    let sides_b = [orient(a0, a1, a2, b0), orient(a0, a1, a2, b1), orient(a0, a1, a2, b2)];
    if sides_b.iter().all(|&s| s > 0) || sides_b.iter().all(|&s| s < 0) {
        return false;
    }
    let sides_a = [orient(b0, b1, b2, a0), orient(b0, b1, b2, a1), orient(b0, b1, b2, a2)];
    if sides_a.iter().all(|&s| s > 0) || sides_a.iter().all(|&s| s < 0) {
        return false;
    }

    if sides_b.iter().all(|&s| s == 0) {
        let plane = Plane2::for_triangle(a0, a1, a2);
        return [(b0, b1), (b1, b2), (b2, b0)]
            .iter()
            .any(|(p, q)| plane.segment_meets_triangle(p, q, t))
            || plane.point_in_triangle(a0, b0, b1, b2);
    }

    // Non-coplanar: the intersection, if any, is a segment whose endpoints
    // lie on edges of one of the two triangles.
    [(a0, a1), (a1, a2), (a2, a0)]
        .iter()
        .any(|(p, q)| segment_meets_triangle(p, q, u))
        || [(b0, b1), (b1, b2), (b2, b0)]
            .iter()
            .any(|(p, q)| segment_meets_triangle(p, q, t))
}

/// Decide whether two faces of `mesh` intersect beyond their shared corners.
fn faces_intersect(mesh: &Mesh, fa: &[u32; 3], fb: &[u32; 3]) -> bool {
    let pos = |i: u32| &mesh.vertices[i as usize].position;

    let shared: Vec<(usize, usize)> = (0..3)
        .flat_map(|i| (0..3).map(move |j| (i, j)))
        .filter(|&(i, j)| fa[i] == fb[j])
        .collect();

    match shared.len() {
        0 => triangles_intersect(
            [pos(fa[0]), pos(fa[1]), pos(fa[2])],
            [pos(fb[0]), pos(fb[1]), pos(fb[2])],
        ),
        1 => {
            let (i, j) = shared[0];
            let s = pos(fa[i]);
            let (a1, a2) = (pos(fa[(i + 1) % 3]), pos(fa[(i + 2) % 3]));
            let (b1, b2) = (pos(fb[(j + 1) % 3]), pos(fb[(j + 2) % 3]));
            shared_vertex_intersect(s, [a1, a2], [b1, b2])
        }
        2 => {
            let (i0, j0) = shared[0];
            let (i1, _) = shared[1];
            let p = pos(fa[3 - i0 - i1]);
            let q = pos(fb[3 - j0 - shared[1].1]);
            let (u, v) = (pos(fa[i0]), pos(fa[i1]));
            shared_edge_intersect(u, v, p, q)
        }
        // Same corners (duplicate face): they coincide.
        _ => true,
    }
}

/// Faces (u, v, p) and (u, v, q) sharing edge (u, v) intersect only when they
/// fold onto each other: q in the plane of the first face, on p's side.
fn shared_edge_intersect(u: &Point3<f64>, v: &Point3<f64>, p: &Point3<f64>, q: &Point3<f64>) -> bool {
    if orient(u, v, p, q) != 0 {
        return false;
    }
    let plane = Plane2::for_triangle(u, v, p);
    plane.orient(u, v, p) == plane.orient(u, v, q)
}

/// Faces (s, a1, a2) and (s, b1, b2) sharing corner s.
fn shared_vertex_intersect(s: &Point3<f64>, [a1, a2]: [&Point3<f64>; 2], [b1, b2]: [&Point3<f64>; 2]) -> bool {
    // Opposite edge of one face meeting the other face.
    if segment_meets_triangle(a1, a2, [s, b1, b2]) || segment_meets_triangle(b1, b2, [s, a1, a2]) {
        return true;
    }

    // An edge leaving s that runs inside the other face's corner at s.
    let enters = |p: &Point3<f64>, c1: &Point3<f64>, c2: &Point3<f64>| {
        if orient(s, c1, c2, p) != 0 {
            return false;
        }
        let plane = Plane2::for_triangle(s, c1, c2);
        let turn = plane.orient(s, c1, c2);
        plane.orient(s, c1, p) == turn && plane.orient(s, p, c2) == turn
    };

    enters(a1, b1, b2) || enters(a2, b1, b2) || enters(b1, a1, a2) || enters(b2, a1, a2)
}
