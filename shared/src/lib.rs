//! Shared types for the Supreme Commander SCM/SCA export tools.
//!
//! The types here are the in-memory model produced by the exporter and
//! consumed by the SCM (mesh) and SCA (animation) writers. They carry no
//! host-application state.

pub mod animation;
pub mod model;

pub use animation::{Animation, AnimationError, Frame, Pose};
pub use model::{
    Bone, MAX_INFLUENCES, MAX_UV_CHANNELS, Model, ModelError, SkinInfluence, Transform, Triangle,
    Vertex,
};
