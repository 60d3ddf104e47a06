//! scm-export library
//!
//! Turns a host mesh and armature into an engine-ready SCM model: axis
//! conversion, triangulation, hard-edge splitting, per-vertex attribute
//! extraction and skeleton building. Host data is read through the
//! [`MeshSource`] and [`ArmatureSource`] traits and never modified.

pub mod attributes;
pub mod convert;
pub mod error;
pub mod mesh;
pub mod model;
pub mod settings;
pub mod skeleton;
pub mod source;

pub use convert::{Axis, AxisConversion};
pub use error::{ExportError, Result};
pub use mesh::{normalize_mesh, NormalizedMesh};
pub use model::{assemble_model, convert_snapshot, convert_to_model};
pub use settings::{ExportSettings, NgonMethod, QuadMethod};
pub use skeleton::Skeleton;
pub use source::{
    ArmatureSnapshot, ArmatureSource, DeformWeight, HostBone, HostPolygon, MeshSnapshot,
    MeshSource, SceneSnapshot,
};

// Re-export the data model handed to the serializer
pub use supcom_shared::{Bone, Model, SkinInfluence, Transform, Triangle, Vertex};
