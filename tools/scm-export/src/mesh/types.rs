//! Working-copy mesh types used during normalization

use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use supcom_shared::MAX_UV_CHANNELS;

use crate::error::{ExportError, Result};
use crate::source::MeshSource;

/// Undirected edge between two host vertices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// A polygon corner ("loop"): host vertex plus its per-channel UVs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub vertex: u32,
    pub uvs: [Option<Vec2>; MAX_UV_CHANNELS],
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkingPolygon {
    pub corners: Vec<Corner>,
    pub smooth: bool,
}

impl WorkingPolygon {
    /// Boundary edges in loop order
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        let n = self.corners.len();
        (0..n).map(move |i| EdgeKey::new(self.corners[i].vertex, self.corners[(i + 1) % n].vertex))
    }
}

/// Owned copy of the host topology the normalizer is free to rework
#[derive(Clone, Debug, PartialEq)]
pub struct WorkingMesh {
    pub positions: Vec<Vec3>,
    pub polygons: Vec<WorkingPolygon>,
    pub sharp_edges: Vec<EdgeKey>,
    pub uv_channels: usize,
}

impl WorkingMesh {
    /// Copy a host mesh, rejecting polygons the triangulator cannot handle
    pub fn from_source<M: MeshSource + ?Sized>(source: &M) -> Result<Self> {
        let uv_channels = source.uv_channel_count();
        if uv_channels > MAX_UV_CHANNELS {
            return Err(ExportError::TooManyUvChannels { count: uv_channels });
        }

        let vertex_count = source.vertex_count();
        let positions: Vec<Vec3> = (0..vertex_count)
            .map(|v| source.vertex_position(v))
            .collect();

        let mut polygons = Vec::with_capacity(source.polygon_count());
        for index in 0..source.polygon_count() {
            let host = source.polygon(index);
            validate_polygon(index, host.vertices, vertex_count)?;

            let corners = host
                .vertices
                .iter()
                .enumerate()
                .map(|(corner, &vertex)| {
                    let mut uvs = [None; MAX_UV_CHANNELS];
                    for (channel, uv) in uvs.iter_mut().enumerate().take(uv_channels) {
                        *uv = source.loop_uv(index, corner, channel);
                    }
                    Corner { vertex, uvs }
                })
                .collect();

            polygons.push(WorkingPolygon {
                corners,
                smooth: host.smooth,
            });
        }

        let sharp_edges = source
            .sharp_edges()
            .iter()
            .map(|&[a, b]| EdgeKey::new(a, b))
            .collect();

        Ok(Self {
            positions,
            polygons,
            sharp_edges,
            uv_channels,
        })
    }
}

fn validate_polygon(index: usize, vertices: &[u32], vertex_count: usize) -> Result<()> {
    let degenerate = |reason: String| ExportError::DegeneratePolygon {
        polygon: index,
        reason,
    };

    if vertices.len() < 3 {
        return Err(degenerate(format!("has {} corners", vertices.len())));
    }
    for (i, &v) in vertices.iter().enumerate() {
        if v as usize >= vertex_count {
            return Err(degenerate(format!(
                "references vertex {} of {}",
                v, vertex_count
            )));
        }
        if vertices[..i].contains(&v) {
            return Err(degenerate(format!("uses vertex {} twice", v)));
        }
    }
    Ok(())
}

/// Triangle of the working copy, still referencing host vertices
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingTriangle {
    pub corners: [Corner; 3],
    /// Host polygon the triangle was cut from
    pub polygon: usize,
}

/// Reference to one corner of a normalized triangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerRef {
    pub triangle: u32,
    pub slot: u8,
}

/// A vertex of the split vertex buffer
#[derive(Clone, Debug, PartialEq)]
pub struct SplitVertex {
    /// Host vertex this one was split from
    pub source: u32,
    pub position: Vec3,
    /// Every triangle corner using this vertex
    pub corners: SmallVec<[CornerRef; 8]>,
}

/// Triangle referencing the split vertex buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedTriangle {
    pub vertices: [u32; 3],
    pub corners: [Corner; 3],
    pub polygon: usize,
}

/// Triangle-only, hard-edge-split mesh
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMesh {
    pub vertices: Vec<SplitVertex>,
    pub triangles: Vec<NormalizedTriangle>,
    pub uv_channels: usize,
}

impl NormalizedMesh {
    /// Host-space normal of a triangle, zero for degenerate triangles
    pub fn triangle_normal(&self, triangle: usize) -> Vec3 {
        let [a, b, c] = self.triangles[triangle].vertices;
        let pa = self.vertices[a as usize].position;
        let pb = self.vertices[b as usize].position;
        let pc = self.vertices[c as usize].position;
        (pb - pa).cross(pc - pa).normalize_or_zero()
    }

    /// Interior angle of a triangle at one of its corners
    pub fn corner_angle(&self, corner: CornerRef) -> f32 {
        let vertices = self.triangles[corner.triangle as usize].vertices;
        let slot = corner.slot as usize;
        let here = self.vertices[vertices[slot] as usize].position;
        let next = self.vertices[vertices[(slot + 1) % 3] as usize].position;
        let prev = self.vertices[vertices[(slot + 2) % 3] as usize].position;

        let a = next - here;
        let b = prev - here;
        if a.length_squared() == 0.0 || b.length_squared() == 0.0 {
            return 0.0;
        }
        a.angle_between(b)
    }
}
