//! SCM model types
//!
//! A [`Model`] is assembled once per export from a snapshot of host data and
//! is immutable afterwards. Its constructor enforces the index invariants the
//! SCM writer relies on.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Maximum number of bone influences per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Maximum number of UV channels per vertex
pub const MAX_UV_CHANNELS: usize = 2;

/// Errors raised when a model violates its index invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("triangle {triangle} references vertex {vertex}, but the model has {vertex_count} vertices")]
    TriangleIndexOutOfRange {
        triangle: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("triangle {triangle} repeats vertex {vertex}")]
    DegenerateTriangle { triangle: usize, vertex: u32 },

    #[error("vertex {vertex} is skinned to bone {bone}, but the skeleton has {bone_count} bones")]
    BoneIndexOutOfRange {
        vertex: usize,
        bone: usize,
        bone_count: usize,
    },

    #[error("vertex {vertex} has {count} bone influences (maximum is {max})", max = MAX_INFLUENCES)]
    TooManyInfluences { vertex: usize, count: usize },

    #[error("vertex {vertex} has {found} UV channels, expected {expected}")]
    UvChannelMismatch {
        vertex: usize,
        expected: usize,
        found: usize,
    },

    #[error("vertex at position {position} is labelled with index {index}")]
    VertexIndexMismatch { position: usize, index: usize },

    #[error("bone '{bone}' at position {position} is labelled with index {index}")]
    BoneIndexMismatch {
        bone: String,
        position: usize,
        index: usize,
    },

    #[error("bone '{bone}' (index {index}) has parent {parent}, which does not precede it")]
    ParentOrder {
        bone: String,
        index: usize,
        parent: usize,
    },
}

/// Rigid bone transform: translation plus unit rotation, no scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Affine matrix applying the rotation first, then the translation
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            position: rotation * -self.position,
            rotation,
        }
    }

    /// Composition `self ∘ other` (apply `other` first)
    pub fn mul_transform(&self, other: &Transform) -> Self {
        Self {
            position: self.position + self.rotation * other.position,
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A bone in the flattened skeleton
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Position in the bone array (root = 0)
    pub index: usize,
    /// Index of the parent bone, `None` for the root
    pub parent_index: Option<usize>,
    /// Transform relative to the parent bone
    pub transform: Transform,
    /// Inverse of the bone's rest matrix in engine space
    pub inverse_rest_pose: Mat4,
}

impl Bone {
    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }
}

/// One bone influence on a vertex
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkinInfluence {
    pub bone_index: usize,
    pub weight: f32,
}

/// A vertex of the final, split vertex buffer
///
/// The exporter leaves tangent and binormal unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub index: usize,
    pub position: Vec3,
    pub normal: Vec3,
    pub uvs: SmallVec<[Vec2; MAX_UV_CHANNELS]>,
    pub tangent: Option<Vec3>,
    pub binormal: Option<Vec3>,
    pub influences: SmallVec<[SkinInfluence; MAX_INFLUENCES]>,
}

/// Three indices into the model's vertex buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [u32; 3],
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }
}

/// Assembled SCM model, ready for serialization
#[derive(Clone, Debug, Serialize)]
pub struct Model {
    name: String,
    info: String,
    bones: Vec<Bone>,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl Model {
    /// Build a model, checking every bone, vertex and triangle reference
    pub fn new(
        name: impl Into<String>,
        info: impl Into<String>,
        bones: Vec<Bone>,
        vertices: Vec<Vertex>,
        triangles: Vec<Triangle>,
    ) -> Result<Self, ModelError> {
        validate_bones(&bones)?;
        validate_vertices(&vertices, bones.len())?;
        validate_triangles(&triangles, vertices.len())?;

        Ok(Self {
            name: name.into(),
            info: info.into(),
            bones,
            vertices,
            triangles,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of UV channels carried by every vertex
    pub fn uv_channel_count(&self) -> usize {
        self.vertices.first().map(|v| v.uvs.len()).unwrap_or(0)
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }
}

fn validate_bones(bones: &[Bone]) -> Result<(), ModelError> {
    for (position, bone) in bones.iter().enumerate() {
        if bone.index != position {
            return Err(ModelError::BoneIndexMismatch {
                bone: bone.name.clone(),
                position,
                index: bone.index,
            });
        }
        if let Some(parent) = bone.parent_index {
            if parent >= position {
                return Err(ModelError::ParentOrder {
                    bone: bone.name.clone(),
                    index: position,
                    parent,
                });
            }
        }
    }
    Ok(())
}

fn validate_vertices(vertices: &[Vertex], bone_count: usize) -> Result<(), ModelError> {
    let expected_uvs = vertices.first().map(|v| v.uvs.len()).unwrap_or(0);

    for (position, vertex) in vertices.iter().enumerate() {
        if vertex.index != position {
            return Err(ModelError::VertexIndexMismatch {
                position,
                index: vertex.index,
            });
        }
        if vertex.uvs.len() != expected_uvs {
            return Err(ModelError::UvChannelMismatch {
                vertex: position,
                expected: expected_uvs,
                found: vertex.uvs.len(),
            });
        }
        if vertex.influences.len() > MAX_INFLUENCES {
            return Err(ModelError::TooManyInfluences {
                vertex: position,
                count: vertex.influences.len(),
            });
        }
        if let Some(influence) = vertex
            .influences
            .iter()
            .find(|i| i.bone_index >= bone_count)
        {
            return Err(ModelError::BoneIndexOutOfRange {
                vertex: position,
                bone: influence.bone_index,
                bone_count,
            });
        }
    }
    Ok(())
}

fn validate_triangles(triangles: &[Triangle], vertex_count: usize) -> Result<(), ModelError> {
    for (index, triangle) in triangles.iter().enumerate() {
        let [a, b, c] = triangle.vertices;
        for vertex in [a, b, c] {
            if vertex as usize >= vertex_count {
                return Err(ModelError::TriangleIndexOutOfRange {
                    triangle: index,
                    vertex,
                    vertex_count,
                });
            }
        }
        if a == b || a == c {
            return Err(ModelError::DegenerateTriangle {
                triangle: index,
                vertex: a,
            });
        }
        if b == c {
            return Err(ModelError::DegenerateTriangle {
                triangle: index,
                vertex: b,
            });
        }
    }
    Ok(())
}
