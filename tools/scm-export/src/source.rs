//! Host input boundary
//!
//! The exporter reads host geometry only through these read-only traits, so
//! any mesh/armature representation can be adapted to it. The pipeline
//! copies what it needs into its own working structures and never writes
//! back.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// One deform-group assignment of a vertex
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeformWeight {
    /// Index into [`MeshSource::deform_group_names`]
    pub group: usize,
    pub weight: f32,
}

/// A host polygon: its vertex loop and shading mode
#[derive(Clone, Copy, Debug)]
pub struct HostPolygon<'a> {
    pub vertices: &'a [u32],
    pub smooth: bool,
}

/// Read-only access to host mesh data
pub trait MeshSource {
    fn vertex_count(&self) -> usize;

    fn vertex_position(&self, vertex: usize) -> Vec3;

    /// Deform-group assignments of a vertex
    fn deform_weights(&self, vertex: usize) -> &[DeformWeight];

    /// Deform group names; groups are matched to bones by name
    fn deform_group_names(&self) -> &[String];

    fn polygon_count(&self) -> usize;

    fn polygon(&self, polygon: usize) -> HostPolygon<'_>;

    /// Number of active UV channels (0, 1 or 2)
    fn uv_channel_count(&self) -> usize;

    /// UV of one polygon corner, `None` when the corner has no coordinate
    fn loop_uv(&self, polygon: usize, corner: usize, channel: usize) -> Option<Vec2>;

    /// Edges explicitly marked sharp, as vertex pairs in either order
    fn sharp_edges(&self) -> &[[u32; 2]];
}

/// A bone as the host armature describes it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostBone {
    pub name: String,
    /// Name of the parent bone, `None` for the root
    #[serde(default)]
    pub parent: Option<String>,
    /// Orientation relative to the parent bone
    pub rotation: Quat,
    /// Tail point in the bone's own local space
    pub tail: Vec3,
    /// Rest matrix, bone space to armature origin
    pub matrix_local: Mat4,
}

/// Read-only access to a host armature
pub trait ArmatureSource {
    fn name(&self) -> &str;

    /// Bones in hierarchy order; the first must be the root
    fn bones(&self) -> &[HostBone];
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonSnapshot {
    pub vertices: Vec<u32>,
    #[serde(default = "default_smooth")]
    pub smooth: bool,
    /// Per UV channel, one entry per corner
    #[serde(default)]
    pub uvs: Vec<Vec<Option<Vec2>>>,
}

fn default_smooth() -> bool {
    true
}

/// Plain-data mesh snapshot implementing [`MeshSource`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub polygons: Vec<PolygonSnapshot>,
    #[serde(default)]
    pub uv_layers: Vec<String>,
    #[serde(default)]
    pub sharp_edges: Vec<[u32; 2]>,
    #[serde(default)]
    pub deform_groups: Vec<String>,
    /// Per vertex; vertices past the end have no assignments
    #[serde(default)]
    pub weights: Vec<Vec<DeformWeight>>,
}

impl MeshSnapshot {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn push_polygon(&mut self, vertices: Vec<u32>, smooth: bool) -> usize {
        self.polygons.push(PolygonSnapshot {
            vertices,
            smooth,
            uvs: Vec::new(),
        });
        self.polygons.len() - 1
    }

    pub fn push_uv_layer(&mut self, name: impl Into<String>) -> usize {
        self.uv_layers.push(name.into());
        self.uv_layers.len() - 1
    }

    /// Assign one UV per corner of a polygon on a channel
    pub fn set_polygon_uvs(&mut self, polygon: usize, channel: usize, uvs: &[Vec2]) {
        let entry = &mut self.polygons[polygon].uvs;
        if entry.len() <= channel {
            entry.resize(channel + 1, Vec::new());
        }
        entry[channel] = uvs.iter().copied().map(Some).collect();
    }

    pub fn push_sharp_edge(&mut self, a: u32, b: u32) {
        self.sharp_edges.push([a, b]);
    }

    pub fn push_deform_group(&mut self, name: impl Into<String>) -> usize {
        self.deform_groups.push(name.into());
        self.deform_groups.len() - 1
    }

    pub fn assign(&mut self, vertex: usize, group: usize, weight: f32) {
        if self.weights.len() <= vertex {
            self.weights.resize(vertex + 1, Vec::new());
        }
        self.weights[vertex].push(DeformWeight { group, weight });
    }
}

impl MeshSource for MeshSnapshot {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn vertex_position(&self, vertex: usize) -> Vec3 {
        self.positions[vertex]
    }

    fn deform_weights(&self, vertex: usize) -> &[DeformWeight] {
        self.weights.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    fn deform_group_names(&self) -> &[String] {
        &self.deform_groups
    }

    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn polygon(&self, polygon: usize) -> HostPolygon<'_> {
        let p = &self.polygons[polygon];
        HostPolygon {
            vertices: &p.vertices,
            smooth: p.smooth,
        }
    }

    fn uv_channel_count(&self) -> usize {
        self.uv_layers.len()
    }

    fn loop_uv(&self, polygon: usize, corner: usize, channel: usize) -> Option<Vec2> {
        self.polygons
            .get(polygon)?
            .uvs
            .get(channel)?
            .get(corner)
            .copied()
            .flatten()
    }

    fn sharp_edges(&self) -> &[[u32; 2]] {
        &self.sharp_edges
    }
}

/// Plain-data armature snapshot implementing [`ArmatureSource`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmatureSnapshot {
    pub name: String,
    pub bones: Vec<HostBone>,
}

impl ArmatureSource for ArmatureSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn bones(&self) -> &[HostBone] {
        &self.bones
    }
}

/// Mesh plus armature, as written by a host-side dump
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub mesh: MeshSnapshot,
    pub armature: ArmatureSnapshot,
}

impl SceneSnapshot {
    /// Load a JSON scene snapshot
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}
