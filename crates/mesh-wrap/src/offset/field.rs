//! Distance queries against the input, bucketed on the lattice.

use std::collections::VecDeque;

use hashbrown::HashMap;
use mesh_soup::{Mesh, Triangle};
use nalgebra::Point3;
use tracing::debug;

use super::lattice::{Lattice, KUHN_NEIGHBORS};

/// Answers "is this point closer than `offset` to the input?" for points
/// inside the lattice.
///
/// Every cell keeps the triangles that can come within `offset` of some
/// point of the cell, so a query only looks at the bucket of the cell the
/// point falls in.
#[derive(Debug)]
pub struct OffsetField {
    lattice: Lattice,
    offset: f64,
    triangles: Vec<Triangle>,
    buckets: HashMap<usize, Vec<u32>>,
}

impl OffsetField {
    pub fn new(lattice: Lattice, mesh: &Mesh, offset: f64) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().collect();
        // Half a cell diagonal is below one spacing.
        let reach = offset + lattice.spacing();
        let mut buckets: HashMap<usize, Vec<u32>> = HashMap::new();

        for (idx, tri) in triangles.iter().enumerate() {
            let (min, max) = tri.bounds();
            let lo = min - nalgebra::Vector3::repeat(reach);
            let hi = max + nalgebra::Vector3::repeat(reach);
            for cell in lattice.cells_between(&lo, &hi) {
                if tri.distance_to(&lattice.cell_center(cell)) <= reach {
                    buckets
                        .entry(lattice.cell_index(cell))
                        .or_default()
                        .push(idx as u32);
                }
            }
        }

        debug!(
            "Offset field: {} of {} cells near {} triangles",
            buckets.len(),
            lattice.cell_count(),
            triangles.len()
        );

        Self {
            lattice,
            offset,
            triangles,
            buckets,
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Distance from `point` to the input, when it is within the reach of
    /// the bucket `point` falls in.
    pub fn distance(&self, point: &Point3<f64>) -> Option<f64> {
        let bucket = self.buckets.get(&self.lattice.cell_of(point)?)?;
        bucket
            .iter()
            .map(|&t| self.triangles[t as usize].distance_to(point))
            .min_by(f64::total_cmp)
    }

    /// Whether `point` lies strictly closer than `offset` to the input.
    pub fn is_near(&self, point: &Point3<f64>) -> bool {
        let Some(bucket) = self
            .lattice
            .cell_of(point)
            .and_then(|cell| self.buckets.get(&cell))
        else {
            return false;
        };
        bucket
            .iter()
            .any(|&t| self.triangles[t as usize].distance_to(point) < self.offset)
    }

    /// Flag the nodes reachable from the lattice's first corner without
    /// passing a near node, stepping along tetrahedron edges.
    ///
    /// Nodes left unflagged are near the input or enclosed by near nodes;
    /// both count as inside the wrap.
    pub fn exterior_nodes(&self) -> Vec<bool> {
        let count = self.lattice.node_count();
        let mut outside = vec![false; count];
        let mut seen = vec![false; count];
        let mut queue = VecDeque::new();

        seen[0] = true;
        if !self.is_near(&self.lattice.node_position([0, 0, 0])) {
            outside[0] = true;
            queue.push_back(0usize);
        }

        while let Some(idx) = queue.pop_front() {
            let node = self.lattice.node_coords(idx);
            for step in KUHN_NEIGHBORS {
                let Some(next) = self.lattice.neighbor(node, step) else {
                    continue;
                };
                let n_idx = self.lattice.node_index(next);
                if seen[n_idx] {
                    continue;
                }
                seen[n_idx] = true;
                if !self.is_near(&self.lattice.node_position(next)) {
                    outside[n_idx] = true;
                    queue.push_back(n_idx);
                }
            }
        }

        debug!(
            "Exterior flood reached {} of {} nodes",
            outside.iter().filter(|&&o| o).count(),
            count
        );
        outside
    }
}
