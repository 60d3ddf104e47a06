//! Export errors
//!
//! Every error aborts the whole export. None are retried or corrected.

use supcom_shared::ModelError;

use crate::convert::Axis;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    /// The armature does not start with its single root bone
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A bone's parent cannot be resolved to an earlier bone
    #[error("bone '{bone}' has parent '{parent}', which is not an earlier bone of the armature")]
    MalformedHierarchy { bone: String, parent: String },

    /// Polygon the triangulator cannot handle
    #[error("polygon {polygon} is degenerate: {reason}")]
    DegeneratePolygon { polygon: usize, reason: String },

    #[error("mesh triangulates to {triangles} triangles, too many corners to index")]
    MeshTooLarge { triangles: usize },

    #[error("vertex {vertex} is not unwrapped on UV channel {channel}")]
    UnweldedUv { vertex: usize, channel: usize },

    #[error(
        "vertex {vertex} has {count} different UV coordinates on UV channel {channel}, \
        which means it is part of multiple UV islands. Mark the seam as a sharp edge"
    )]
    UvIslandConflict {
        vertex: usize,
        channel: usize,
        count: usize,
    },

    #[error("vertex {vertex} is skinned to {count} bones (maximum is {max})", max = supcom_shared::MAX_INFLUENCES)]
    OverSkinned { vertex: usize, count: usize },

    #[error("vertex {vertex} is skinned to group '{name}', which is not a bone of the armature")]
    UnknownBoneReference { vertex: usize, name: String },

    #[error("vertex {vertex} references deform group {group}, but the mesh has {group_count} groups")]
    UnknownDeformGroup {
        vertex: usize,
        group: usize,
        group_count: usize,
    },

    #[error("axis conflict: forward {forward} and up {up} must be perpendicular")]
    AxisConflict { forward: Axis, up: Axis },

    #[error("mesh has {count} UV channels (maximum is {max})", max = supcom_shared::MAX_UV_CHANNELS)]
    TooManyUvChannels { count: usize },

    #[error("index out of range: {0}")]
    IndexOutOfRange(#[from] ModelError),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
