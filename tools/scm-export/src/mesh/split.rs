//! Hard-edge vertex splitting
//!
//! Corners around a host vertex are grouped into smooth fans: two corners
//! belong to the same fan when their triangles share a non-sharp edge
//! through that vertex. Every fan becomes its own output vertex, so
//! triangles on opposite sides of a sharp edge never share a vertex there,
//! while vertices away from sharp edges stay shared.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::types::{
    CornerRef, EdgeKey, NormalizedMesh, NormalizedTriangle, SplitVertex, WorkingMesh,
    WorkingTriangle,
};

/// Disjoint-set forest over triangle corners
struct CornerSets {
    parent: Vec<usize>,
}

impl CornerSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let grandparent = self.parent[self.parent[x]];
            self.parent[x] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower root wins so fan ids follow corner order
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}

fn corner_id(triangle: usize, slot: usize) -> usize {
    triangle * 3 + slot
}

/// Split the triangulated working mesh along `sharp` edges
///
/// Output vertices are ordered by host vertex, then by first use. Host
/// vertices used by no triangle are dropped; their count is returned.
///
/// The corner count must fit a `u32`; `normalize_mesh` checks it first.
pub(crate) fn split_sharp_edges(
    mesh: &WorkingMesh,
    triangles: &[WorkingTriangle],
    sharp: &HashSet<EdgeKey>,
) -> (NormalizedMesh, usize) {
    let mut sets = CornerSets::new(triangles.len() * 3);

    // Triangle edges by host vertex pair: (triangle, slot of edge start, slot of edge end)
    let mut edges: HashMap<EdgeKey, SmallVec<[(usize, usize, usize); 2]>> = HashMap::new();
    for (t, triangle) in triangles.iter().enumerate() {
        for i in 0..3 {
            let j = (i + 1) % 3;
            let key = EdgeKey::new(triangle.corners[i].vertex, triangle.corners[j].vertex);
            edges.entry(key).or_default().push((t, i, j));
        }
    }

    for (key, uses) in &edges {
        if sharp.contains(key) {
            continue;
        }
        let Some(&(t0, i0, j0)) = uses.first() else {
            continue;
        };
        for &(t1, i1, j1) in &uses[1..] {
            // Join the corners of each triangle that sit on the same host vertex
            for (s0, s1) in [(i0, i1), (i0, j1), (j0, i1), (j0, j1)] {
                if triangles[t0].corners[s0].vertex == triangles[t1].corners[s1].vertex {
                    sets.union(corner_id(t0, s0), corner_id(t1, s1));
                }
            }
        }
    }

    // Corners grouped by host vertex, in triangle order
    let mut corners_by_vertex: Vec<SmallVec<[usize; 8]>> =
        vec![SmallVec::new(); mesh.positions.len()];
    for (t, triangle) in triangles.iter().enumerate() {
        for (slot, corner) in triangle.corners.iter().enumerate() {
            corners_by_vertex[corner.vertex as usize].push(corner_id(t, slot));
        }
    }

    let mut vertices: Vec<SplitVertex> = Vec::new();
    let mut vertex_of_fan: HashMap<usize, u32> = HashMap::new();
    let mut corner_vertex = vec![0u32; triangles.len() * 3];
    let mut loose = 0;

    for (host, corners) in corners_by_vertex.iter().enumerate() {
        if corners.is_empty() {
            loose += 1;
            continue;
        }
        for &corner in corners {
            let fan = sets.find(corner);
            let index = *vertex_of_fan.entry(fan).or_insert_with(|| {
                vertices.push(SplitVertex {
                    source: host as u32,
                    position: mesh.positions[host],
                    corners: SmallVec::new(),
                });
                (vertices.len() - 1) as u32
            });
            vertices[index as usize].corners.push(CornerRef {
                triangle: (corner / 3) as u32,
                slot: (corner % 3) as u8,
            });
            corner_vertex[corner] = index;
        }
    }

    let triangles = triangles
        .iter()
        .enumerate()
        .map(|(t, triangle)| NormalizedTriangle {
            vertices: [
                corner_vertex[t * 3],
                corner_vertex[t * 3 + 1],
                corner_vertex[t * 3 + 2],
            ],
            corners: triangle.corners,
            polygon: triangle.polygon,
        })
        .collect();

    (
        NormalizedMesh {
            vertices,
            triangles,
            uv_channels: mesh.uv_channels,
        },
        loose,
    )
}
