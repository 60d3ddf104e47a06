//! SCA animation data model
//!
//! A [`Pose`] holds one parent-relative [`Transform`] per bone, indexed by
//! bone index. Sampling poses out of host actions happens elsewhere; this
//! module only stores and composes them.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::model::{Bone, Transform};

/// Errors raised by pose and animation construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("pose has {found} bone transforms, skeleton has {expected} bones")]
    PoseBoneCount { expected: usize, found: usize },

    #[error("bone index {bone} out of range (skeleton has {bone_count} bones)")]
    BoneOutOfRange { bone: usize, bone_count: usize },

    #[error("frame {frame} at {time}s is earlier than the frame before it")]
    FrameOrder { frame: usize, time: f32 },

    #[error("frame {frame} has invalid time {time}")]
    InvalidTime { frame: usize, time: f32 },

    #[error("animation duration {duration}s is shorter than its last frame at {last_time}s")]
    Duration { duration: f32, last_time: f32 },
}

/// Transform of every bone in the skeleton
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    transforms: Vec<Transform>,
}

impl Pose {
    /// Rest pose: each bone at its local bind transform
    pub fn rest(bones: &[Bone]) -> Self {
        Self {
            transforms: bones.iter().map(|b| b.transform).collect(),
        }
    }

    pub fn from_transforms(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn set(&mut self, bone: usize, transform: Transform) -> Result<(), AnimationError> {
        let bone_count = self.transforms.len();
        let slot = self
            .transforms
            .get_mut(bone)
            .ok_or(AnimationError::BoneOutOfRange { bone, bone_count })?;
        *slot = transform;
        Ok(())
    }

    /// Per-bone transform of `self` expressed relative to `reference`
    ///
    /// Composing the reference transform with the result gives back the
    /// transform stored in `self`.
    pub fn relative_to(&self, reference: &Pose) -> Result<Vec<Transform>, AnimationError> {
        check_bone_count(reference.len(), self.len())?;

        Ok(reference
            .transforms
            .iter()
            .zip(&self.transforms)
            .map(|(base, current)| base.inverse().mul_transform(current))
            .collect())
    }

    /// Bone-to-origin matrices, composed parent-first
    pub fn world_matrices(&self, bones: &[Bone]) -> Result<Vec<Mat4>, AnimationError> {
        check_bone_count(bones.len(), self.len())?;

        let mut world: Vec<Mat4> = Vec::with_capacity(bones.len());
        for (bone, local) in bones.iter().zip(&self.transforms) {
            let parent = match bone.parent_index {
                Some(parent) => *world.get(parent).ok_or(AnimationError::BoneOutOfRange {
                    bone: parent,
                    bone_count: bones.len(),
                })?,
                None => Mat4::IDENTITY,
            };
            world.push(parent * local.to_matrix());
        }
        Ok(world)
    }

    /// Skinning matrices: current bone-to-origin times inverse rest pose
    ///
    /// At rest these are identity, so skinned vertices stay in place.
    pub fn skinning_matrices(&self, bones: &[Bone]) -> Result<Vec<Mat4>, AnimationError> {
        let world = self.world_matrices(bones)?;
        Ok(world
            .iter()
            .zip(bones)
            .map(|(world, bone)| *world * bone.inverse_rest_pose)
            .collect())
    }
}

fn check_bone_count(expected: usize, found: usize) -> Result<(), AnimationError> {
    if expected != found {
        return Err(AnimationError::PoseBoneCount { expected, found });
    }
    Ok(())
}

/// One keyframe of an animation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Time in seconds from the start of the animation
    pub time: f32,
    pub flags: u32,
    pub pose: Pose,
}

/// SCA animation clip
#[derive(Clone, Debug, Serialize)]
pub struct Animation {
    name: String,
    duration: f32,
    bone_names: Vec<String>,
    initial_pose: Pose,
    frames: Vec<Frame>,
}

impl Animation {
    pub fn new(
        name: impl Into<String>,
        bones: &[Bone],
        duration: f32,
        initial_pose: Pose,
        frames: Vec<Frame>,
    ) -> Result<Self, AnimationError> {
        check_bone_count(bones.len(), initial_pose.len())?;

        let mut previous = 0.0f32;
        for (index, frame) in frames.iter().enumerate() {
            if !frame.time.is_finite() || frame.time < 0.0 {
                return Err(AnimationError::InvalidTime {
                    frame: index,
                    time: frame.time,
                });
            }
            if frame.time < previous {
                return Err(AnimationError::FrameOrder {
                    frame: index,
                    time: frame.time,
                });
            }
            check_bone_count(bones.len(), frame.pose.len())?;
            previous = frame.time;
        }

        if let Some(last) = frames.last() {
            if duration < last.time {
                return Err(AnimationError::Duration {
                    duration,
                    last_time: last.time,
                });
            }
        }

        Ok(Self {
            name: name.into(),
            duration,
            bone_names: bones.iter().map(|b| b.name.clone()).collect(),
            initial_pose,
            frames,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn bone_names(&self) -> &[String] {
        &self.bone_names
    }

    pub fn initial_pose(&self) -> &Pose {
        &self.initial_pose
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    /// Two-bone chain along +Y, child hanging off the root's tail
    fn chain() -> Vec<Bone> {
        let root_local = Transform::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_z(0.3));
        let child_local = Transform::new(Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_x(0.5));

        let root_world = root_local.to_matrix();
        let child_world = root_world * child_local.to_matrix();

        vec![
            Bone {
                name: "root".to_string(),
                index: 0,
                parent_index: None,
                transform: root_local,
                inverse_rest_pose: root_world.inverse(),
            },
            Bone {
                name: "arm".to_string(),
                index: 1,
                parent_index: Some(0),
                transform: child_local,
                inverse_rest_pose: child_world.inverse(),
            },
        ]
    }

    #[test]
    fn test_rest_pose_skinning_is_identity() {
        let bones = chain();
        let skinning = Pose::rest(&bones).skinning_matrices(&bones).unwrap();

        assert_eq!(skinning.len(), 2);
        for matrix in skinning {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_child_follows_parent() {
        let bones = chain();
        let mut pose = Pose::rest(&bones);
        let moved = Transform::new(
            bones[0].transform.position + Vec3::X,
            bones[0].transform.rotation,
        );
        pose.set(0, moved).unwrap();

        let rest = Pose::rest(&bones).world_matrices(&bones).unwrap();
        let world = pose.world_matrices(&bones).unwrap();
        let shift = world[1].w_axis.truncate() - rest[1].w_axis.truncate();
        assert!(shift.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_relative_to_rest() {
        let bones = chain();
        let rest = Pose::rest(&bones);
        let mut pose = rest.clone();
        let turn = Quat::from_rotation_y(0.25);
        pose.set(
            1,
            Transform::new(
                bones[1].transform.position,
                bones[1].transform.rotation * turn,
            ),
        )
        .unwrap();

        let delta = pose.relative_to(&rest).unwrap();
        assert!(delta[0].rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(delta[1].rotation.abs_diff_eq(turn, 1e-5));

        let rebuilt = rest.transforms()[1].mul_transform(&delta[1]);
        assert!(
            rebuilt
                .position
                .abs_diff_eq(pose.transforms()[1].position, 1e-5)
        );
    }

    #[test]
    fn test_set_out_of_range() {
        let bones = chain();
        let mut pose = Pose::rest(&bones);
        assert_eq!(
            pose.set(2, Transform::IDENTITY),
            Err(AnimationError::BoneOutOfRange {
                bone: 2,
                bone_count: 2
            })
        );
    }

    #[test]
    fn test_animation_validates_frames() {
        let bones = chain();
        let rest = Pose::rest(&bones);
        let frame = |time: f32| Frame {
            time,
            flags: 0,
            pose: rest.clone(),
        };

        let animation = Animation::new(
            "walk",
            &bones,
            1.0,
            rest.clone(),
            vec![frame(0.0), frame(0.5), frame(1.0)],
        )
        .unwrap();
        assert_eq!(animation.frames().len(), 3);
        assert_eq!(animation.bone_names(), ["root", "arm"]);

        let err = Animation::new("walk", &bones, 1.0, rest.clone(), vec![frame(0.5), frame(0.2)])
            .unwrap_err();
        assert!(matches!(err, AnimationError::FrameOrder { frame: 1, .. }));

        let err = Animation::new("walk", &bones, 0.5, rest.clone(), vec![frame(1.0)]).unwrap_err();
        assert!(matches!(err, AnimationError::Duration { .. }));

        let short = Pose::from_transforms(vec![Transform::IDENTITY]);
        let err = Animation::new("walk", &bones, 1.0, short, vec![]).unwrap_err();
        assert_eq!(
            err,
            AnimationError::PoseBoneCount {
                expected: 2,
                found: 1
            }
        );
    }
}
