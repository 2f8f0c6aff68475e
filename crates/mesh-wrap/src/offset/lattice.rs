//! Regular sampling lattice for the offset wrap.

use nalgebra::{Point3, Vector3};

use crate::error::{WrapError, WrapResult};

/// Corners of the unit cube, x varying fastest: corner `b` sits at
/// `(b & 1, (b >> 1) & 1, (b >> 2) & 1)`.
pub const CUBE_CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// The six tetrahedra of the Kuhn split of a cube, as indices into
/// [`CUBE_CORNERS`]. Each runs from corner 0 to corner 7 along the cube
/// edges in one axis order, so neighbouring cubes agree on their shared
/// face diagonals.
pub const KUHN_TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// Node steps along the edges of the Kuhn tetrahedra.
pub const KUHN_NEIGHBORS: [[isize; 3]; 14] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    [1, 1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, -1],
    [1, 1, 1],
    [-1, -1, -1],
];

/// A box of cubic cells with nodes on their corners.
///
/// Cell `(ix, iy, iz)` spans `origin + [ix, ix+1] * spacing` along x, and
/// likewise for y and z. Cells and nodes are both stored with x varying
/// fastest; there is one more node than cells along each axis.
#[derive(Debug, Clone)]
pub struct Lattice {
    cells: [usize; 3],
    origin: Point3<f64>,
    spacing: f64,
}

impl Lattice {
    /// Cover `[min, max]` plus `margin` on every side.
    ///
    /// Fails with [`WrapError::GridTooLarge`] when the lattice would hold
    /// more than `max_cells` cells.
    pub fn from_bounds(
        min: Point3<f64>,
        max: Point3<f64>,
        spacing: f64,
        margin: f64,
        max_cells: usize,
    ) -> WrapResult<Self> {
        let origin = min - Vector3::repeat(margin);
        let extent = (max - min).add_scalar(2.0 * margin);

        let mut cells = [0usize; 3];
        for (axis, dim) in cells.iter_mut().enumerate() {
            let count = (extent[axis] / spacing).ceil();
            if !count.is_finite() || count > max_cells as f64 {
                return Err(WrapError::GridTooLarge {
                    dims: [usize::MAX; 3],
                    total: usize::MAX,
                    max: max_cells,
                });
            }
            *dim = (count as usize).max(1);
        }

        let total = cells
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .unwrap_or(usize::MAX);
        if total > max_cells {
            return Err(WrapError::GridTooLarge {
                dims: cells,
                total,
                max: max_cells,
            });
        }

        Ok(Self {
            cells,
            origin,
            spacing,
        })
    }

    /// Lattice dimensions in cells.
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().product()
    }

    pub fn node_count(&self) -> usize {
        self.cells.iter().map(|&c| c + 1).product()
    }

    #[inline]
    pub fn cell_index(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        ix + self.cells[0] * (iy + self.cells[1] * iz)
    }

    #[inline]
    pub fn node_index(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        let [nx, ny, _] = self.cells.map(|c| c + 1);
        ix + nx * (iy + ny * iz)
    }

    #[inline]
    pub fn node_coords(&self, idx: usize) -> [usize; 3] {
        let [nx, ny, _] = self.cells.map(|c| c + 1);
        [idx % nx, (idx / nx) % ny, idx / (nx * ny)]
    }

    /// The node one `step` away from `node`, if it lies in the lattice.
    #[inline]
    pub fn neighbor(&self, node: [usize; 3], step: [isize; 3]) -> Option<[usize; 3]> {
        let mut out = [0usize; 3];
        for axis in 0..3 {
            let v = node[axis] as isize + step[axis];
            if v < 0 || v as usize > self.cells[axis] {
                return None;
            }
            out[axis] = v as usize;
        }
        Some(out)
    }

    pub fn node_position(&self, [ix, iy, iz]: [usize; 3]) -> Point3<f64> {
        Point3::new(
            self.origin.x + ix as f64 * self.spacing,
            self.origin.y + iy as f64 * self.spacing,
            self.origin.z + iz as f64 * self.spacing,
        )
    }

    pub fn cell_center(&self, cell: [usize; 3]) -> Point3<f64> {
        self.node_position(cell) + Vector3::repeat(0.5 * self.spacing)
    }

    /// Index of the cell containing `point`, if it lies inside the lattice.
    pub fn cell_of(&self, point: &Point3<f64>) -> Option<usize> {
        let local = (point - self.origin) / self.spacing;
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let v = local[axis].floor();
            if !(v >= 0.0 && v < self.cells[axis] as f64) {
                return None;
            }
            cell[axis] = v as usize;
        }
        Some(self.cell_index(cell))
    }

    /// Cells whose centres may lie within `[min, max]`.
    pub fn cells_between(&self, min: &Point3<f64>, max: &Point3<f64>) -> impl Iterator<Item = [usize; 3]> {
        let range = |axis: usize| {
            let to_index = |v: f64| (v - self.origin[axis]) / self.spacing - 0.5;
            let first = to_index(min[axis]).ceil().max(0.0) as usize;
            let last = (to_index(max[axis]).floor() + 1.0).clamp(0.0, self.cells[axis] as f64) as usize;
            first.min(last)..last
        };
        let (xs, ys, zs) = (range(0), range(1), range(2));

        zs.flat_map(move |iz| {
            let xs = xs.clone();
            ys.clone()
                .flat_map(move |iy| xs.clone().map(move |ix| [ix, iy, iz]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(n: usize) -> Lattice {
        Lattice::from_bounds(
            Point3::origin(),
            Point3::new(n as f64, n as f64, n as f64),
            1.0,
            0.0,
            usize::MAX,
        )
        .unwrap()
    }

    #[test]
    fn test_from_bounds_dimensions() {
        let lattice = Lattice::from_bounds(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 5.0, 2.0),
            1.0,
            1.0,
            usize::MAX,
        )
        .unwrap();
        assert_eq!(lattice.cells(), [12, 7, 4]);
        assert_eq!(lattice.cell_count(), 12 * 7 * 4);
        assert_eq!(lattice.node_count(), 13 * 8 * 5);
        assert_eq!(lattice.node_position([0, 0, 0]), Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(lattice.cell_center([0, 0, 0]), Point3::new(-0.5, -0.5, -0.5));
    }

    #[test]
    fn test_lattice_too_large() {
        let err = Lattice::from_bounds(
            Point3::origin(),
            Point3::new(100.0, 100.0, 100.0),
            1.0,
            0.0,
            1000,
        )
        .unwrap_err();
        assert!(matches!(err, WrapError::GridTooLarge { max: 1000, .. }));
    }

    #[test]
    fn test_node_index_round_trips() {
        let lattice = lattice(3);
        for idx in [0, 5, 17, lattice.node_count() - 1] {
            assert_eq!(lattice.node_index(lattice.node_coords(idx)), idx);
        }
        assert_eq!(lattice.node_coords(lattice.node_count() - 1), [3, 3, 3]);
    }

    #[test]
    fn test_cell_of() {
        let lattice = lattice(4);
        assert_eq!(lattice.cell_of(&Point3::new(0.5, 1.5, 3.9)), Some(lattice.cell_index([0, 1, 3])));
        assert_eq!(lattice.cell_of(&Point3::new(-0.1, 1.0, 1.0)), None);
        assert_eq!(lattice.cell_of(&Point3::new(1.0, 1.0, 4.5)), None);
    }

    #[test]
    fn test_neighbor_stays_on_lattice() {
        let lattice = lattice(2);
        assert_eq!(lattice.neighbor([0, 0, 0], [1, 1, 1]), Some([1, 1, 1]));
        assert_eq!(lattice.neighbor([0, 0, 0], [-1, 0, 0]), None);
        assert_eq!(lattice.neighbor([2, 2, 2], [0, 0, 1]), None);
        assert_eq!(lattice.neighbor([2, 2, 2], [-1, -1, -1]), Some([1, 1, 1]));
    }

    #[test]
    fn test_cells_between() {
        let lattice = lattice(4);
        let cells: Vec<_> = lattice
            .cells_between(&Point3::new(0.4, 0.4, 0.4), &Point3::new(1.6, 0.6, 0.6))
            .collect();
        assert_eq!(cells, vec![[0, 0, 0], [1, 0, 0]]);
    }

    #[test]
    fn test_kuhn_split_fills_the_cube() {
        // Each path from corner 0 to corner 7 moves along one axis at a time.
        for tet in KUHN_TETRAHEDRA {
            assert_eq!(tet[0], 0);
            assert_eq!(tet[3], 7);
            for pair in tet.windows(2) {
                let [a, b] = [CUBE_CORNERS[pair[0]], CUBE_CORNERS[pair[1]]];
                let steps: usize = (0..3).map(|i| b[i] - a[i]).sum();
                assert_eq!(steps, 1);
            }
        }

        // Every tetrahedron edge is a neighbour step.
        for tet in KUHN_TETRAHEDRA {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    let [a, b] = [CUBE_CORNERS[tet[i]], CUBE_CORNERS[tet[j]]];
                    let step = [0, 1, 2].map(|k| b[k] as isize - a[k] as isize);
                    assert!(KUHN_NEIGHBORS.contains(&step), "{:?}", step);
                }
            }
        }
    }
}
