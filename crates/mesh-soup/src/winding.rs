//! Consistent orientation of polygon soups.

use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::PolygonSoup;

/// What [`orient_polygon_soup`] did to a soup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrientStats {
    /// Number of edge-connected components among the valid polygons.
    pub components: usize,

    /// Polygons whose winding was reversed to agree with their neighbours.
    pub flipped_polygons: usize,

    /// Closed components reversed as a whole so that they face outward.
    pub reversed_components: usize,

    /// Manifold edges whose two polygons still disagree after propagation
    /// (non-orientable input such as a Möbius strip).
    pub inconsistent_edges: usize,

    /// Edges shared by more than two polygons; orientation is not propagated
    /// across them.
    pub non_manifold_edges: usize,
}

/// Orient the polygons of a soup consistently.
///
/// Uses BFS flood fill from the first polygon of every edge-connected
/// component. For each polygon, ensures that edges shared with exactly one
/// other polygon are traversed in opposite directions, reversing the
/// neighbour when they are not. Afterwards every closed component (each edge
/// shared by exactly two polygons) with a negative enclosed volume is
/// reversed so that it faces outward.
///
/// This is best effort: orientation never crosses non-manifold edges, and a
/// non-orientable component keeps the winding the BFS gave it. Invalid
/// polygons (see [`polygon_soup_to_mesh`](crate::polygon_soup_to_mesh)) are
/// left untouched.
pub fn orient_polygon_soup(soup: &mut PolygonSoup) -> OrientStats {
    let mut stats = OrientStats::default();
    let polygon_count = soup.polygons.len();
    if polygon_count == 0 {
        return stats;
    }

    let adjacency = MeshAdjacency::build(&soup.polygons);
    stats.non_manifold_edges = adjacency.non_manifold_edge_count();

    let valid: Vec<bool> = soup
        .polygons
        .iter()
        .map(|p| soup.is_valid_polygon(p))
        .collect();

    let mut component: Vec<Option<usize>> = vec![None; polygon_count];
    let mut flip = vec![false; polygon_count];
    let mut consistent: Vec<bool> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();

    for seed in 0..polygon_count {
        if !valid[seed] || component[seed].is_some() {
            continue;
        }

        let id = stats.components;
        stats.components += 1;
        consistent.push(true);
        component[seed] = Some(id);
        queue.push_back(seed);

        while let Some(face_idx) = queue.pop_front() {
            let face_forward = !flip[face_idx];
            let polygon = &soup.polygons[face_idx];

            for (i, &a) in polygon.iter().enumerate() {
                let b = polygon[(i + 1) % polygon.len()];
                if a == b {
                    continue;
                }

                let Some(neighbors) = adjacency.faces_for_edge(a, b) else {
                    continue;
                };
                if neighbors.len() != 2 {
                    continue;
                }

                for &neighbor in neighbors {
                    let neighbor = neighbor as usize;
                    if neighbor == face_idx || !valid[neighbor] {
                        continue;
                    }

                    let same_dir =
                        edge_direction_in_polygon(&soup.polygons[neighbor], a, b) == Some(true);

                    match component[neighbor] {
                        None => {
                            // Neighbour must run b -> a once the current
                            // polygon's own flip is applied.
                            component[neighbor] = Some(id);
                            flip[neighbor] = same_dir == face_forward;
                            queue.push_back(neighbor);
                        }
                        Some(_) if face_idx < neighbor => {
                            let neighbor_forward = same_dir != flip[neighbor];
                            if neighbor_forward == face_forward {
                                stats.inconsistent_edges += 1;
                                consistent[id] = false;
                            }
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    for (polygon, &flipped) in soup.polygons.iter_mut().zip(&flip) {
        if flipped {
            polygon.reverse();
            stats.flipped_polygons += 1;
        }
    }

    stats.reversed_components =
        orient_closed_components_outward(soup, &adjacency, &component, &consistent);

    if stats.flipped_polygons > 0 {
        info!(
            "Fixed winding order: flipped {} polygons",
            stats.flipped_polygons
        );
    } else {
        debug!("Winding order already consistent");
    }
    if stats.inconsistent_edges > 0 {
        warn!(
            "Soup is not orientable: {} edges remain inconsistent",
            stats.inconsistent_edges
        );
    }
    debug!(
        "Oriented soup: {} components, {} reversed outward, {} non-manifold edges",
        stats.components, stats.reversed_components, stats.non_manifold_edges
    );

    stats
}

/// Reverse every closed, consistently oriented component whose enclosed
/// volume is negative. Returns the number of components reversed.
fn orient_closed_components_outward(
    soup: &mut PolygonSoup,
    adjacency: &MeshAdjacency,
    component: &[Option<usize>],
    consistent: &[bool],
) -> usize {
    let count = consistent.len();
    let mut closed = vec![true; count];
    let mut volume = vec![0.0f64; count];

    for (polygon, id) in soup.polygons.iter().zip(component) {
        let Some(id) = *id else { continue };

        for (i, &a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            if a == b {
                continue;
            }
            if adjacency.edge_valence(a, b) != 2 {
                closed[id] = false;
            }
        }

        let apex = soup.points[polygon[0] as usize].coords;
        for pair in polygon[1..].windows(2) {
            let p = soup.points[pair[0] as usize].coords;
            let q = soup.points[pair[1] as usize].coords;
            volume[id] += apex.dot(&p.cross(&q)) / 6.0;
        }
    }

    let reverse: Vec<bool> = (0..count)
        .map(|id| closed[id] && consistent[id] && volume[id] < 0.0)
        .collect();

    for (polygon, id) in soup.polygons.iter_mut().zip(component) {
        if let Some(id) = *id {
            if reverse[id] {
                polygon.reverse();
            }
        }
    }

    reverse.iter().filter(|&&r| r).count()
}

/// Check if edge (a, b) appears in polygon in the same direction (a -> b).
/// Returns Some(true) if same direction, Some(false) if opposite, None if edge not found.
fn edge_direction_in_polygon(polygon: &[u32], a: u32, b: u32) -> Option<bool> {
    for (i, &v0) in polygon.iter().enumerate() {
        let v1 = polygon[(i + 1) % polygon.len()];

        if v0 == a && v1 == b {
            return Some(true);
        }
        if v0 == b && v1 == a {
            return Some(false);
        }
    }
    None
}
