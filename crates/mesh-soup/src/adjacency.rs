//! Edge-to-face incidence for triangle meshes and polygon soups.

use hashbrown::HashMap;

/// Canonical (min, max) key for an undirected edge.
#[inline]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Which faces border each undirected edge.
///
/// Built from triangles or from arbitrary polygons, so the soup orienter and
/// the closedness check read the same structure.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    edges: HashMap<(u32, u32), Vec<u32>>,
}

impl MeshAdjacency {
    /// Record the edges between consecutive corners of every polygon,
    /// closing edge included. Zero-length edges are ignored; an edge a
    /// polygon walks twice is recorded twice.
    pub fn build<P: AsRef<[u32]>>(faces: &[P]) -> Self {
        let mut edges: HashMap<(u32, u32), Vec<u32>> = HashMap::new();

        for (face_idx, face) in faces.iter().enumerate() {
            let corners = face.as_ref();
            for (i, &a) in corners.iter().enumerate() {
                let b = corners[(i + 1) % corners.len()];
                if a != b {
                    edges.entry(edge_key(a, b)).or_default().push(face_idx as u32);
                }
            }
        }

        Self { edges }
    }

    /// Faces bordering the edge `a`-`b`, in either direction.
    pub fn faces_for_edge(&self, a: u32, b: u32) -> Option<&[u32]> {
        self.edges.get(&edge_key(a, b)).map(Vec::as_slice)
    }

    /// Number of faces bordering the edge `a`-`b`.
    pub fn edge_valence(&self, a: u32, b: u32) -> usize {
        self.faces_for_edge(a, b).map_or(0, <[u32]>::len)
    }

    /// Every edge with its bordering faces, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = ((u32, u32), &[u32])> + '_ {
        self.edges.iter().map(|(&edge, faces)| (edge, faces.as_slice()))
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges bordered by a single face.
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.values().filter(|faces| faces.len() == 1).count()
    }

    /// Edges bordered by three faces or more.
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edges.values().filter(|faces| faces.len() > 2).count()
    }

    /// At least one edge, and every edge bordered by exactly two faces.
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.edges.values().all(|faces| faces.len() == 2)
    }
}
