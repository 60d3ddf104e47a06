//! Skeleton builder (host armature -> engine bones)
//!
//! Bones keep the host order. Each bone's local transform is relative to its
//! parent: the position is where the parent ends (the parent's tail) and the
//! rotation is the host's parent-relative orientation, both re-expressed in
//! engine space. The root has no parent to end at, so its position is the
//! head of its rest matrix.

use glam::{Mat4, Vec3};
use hashbrown::HashMap;
use supcom_shared::{Bone, Transform};

use crate::convert::AxisConversion;
use crate::error::{ExportError, Result};
use crate::source::{ArmatureSource, HostBone};

/// Engine bones plus a name index used for skin lookups
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Build the engine skeleton from a host armature
    pub fn build<A: ArmatureSource + ?Sized>(
        armature: &A,
        conversion: &AxisConversion,
    ) -> Result<Self> {
        let host_bones = armature.bones();
        let Some(root) = host_bones.first() else {
            return Err(ExportError::PreconditionViolation(format!(
                "armature '{}' has no bones",
                armature.name()
            )));
        };
        if let Some(parent) = &root.parent {
            return Err(ExportError::PreconditionViolation(format!(
                "first bone '{}' must be the root, but has parent '{}'",
                root.name, parent
            )));
        }

        let mut bones: Vec<Bone> = Vec::with_capacity(host_bones.len());
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(host_bones.len());

        for (index, host) in host_bones.iter().enumerate() {
            let parent_index = match &host.parent {
                None if index == 0 => None,
                None => {
                    return Err(ExportError::PreconditionViolation(format!(
                        "bone '{}' is a second root; the armature must have exactly one",
                        host.name
                    )));
                }
                // Parents must come first, so only already-built bones qualify
                Some(parent) => Some(*by_name.get(parent.as_str()).ok_or_else(|| {
                    ExportError::MalformedHierarchy {
                        bone: host.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
            };

            let offset = match parent_index {
                Some(parent) => host_bones[parent].tail,
                None => host.matrix_local.w_axis.truncate(),
            };
            let transform = local_transform(host, offset, conversion);
            let inverse_rest_pose = inverse_rest_pose(host.matrix_local, conversion);

            if by_name.insert(host.name.clone(), index).is_some() {
                return Err(ExportError::PreconditionViolation(format!(
                    "bone name '{}' is used twice",
                    host.name
                )));
            }
            bones.push(Bone {
                name: host.name.clone(),
                index,
                parent_index,
                transform,
                inverse_rest_pose,
            });
        }

        tracing::debug!(
            "Built skeleton '{}': {} bones, root '{}'",
            armature.name(),
            bones.len(),
            root.name
        );

        Ok(Self { bones, by_name })
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Index of the bone with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn into_bones(self) -> Vec<Bone> {
        self.bones
    }
}

fn local_transform(host: &HostBone, offset: Vec3, conversion: &AxisConversion) -> Transform {
    Transform::new(
        conversion.convert_vector(offset),
        conversion.convert_rotation(host.rotation),
    )
}

/// Inverse of the engine-space bone-to-origin rest matrix
pub fn inverse_rest_pose(matrix_local: Mat4, conversion: &AxisConversion) -> Mat4 {
    conversion.convert_matrix(matrix_local).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Axis;
    use crate::source::ArmatureSnapshot;
    use glam::Quat;
    use supcom_shared::Pose;

    fn bone(name: &str, parent: Option<&str>, rotation: Quat, tail: Vec3, matrix: Mat4) -> HostBone {
        HostBone {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            rotation,
            tail,
            matrix_local: matrix,
        }
    }

    /// Root at (0, 0, 1) pointing up +Y, child bent 90 degrees around Z
    fn chain() -> ArmatureSnapshot {
        let root_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0));
        let bend = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let child_matrix = root_matrix * Mat4::from_rotation_translation(bend, Vec3::Y * 2.0);
        ArmatureSnapshot {
            name: "Armature".to_string(),
            bones: vec![
                bone("root", None, Quat::IDENTITY, Vec3::Y * 2.0, root_matrix),
                bone("arm", Some("root"), bend, Vec3::Y, child_matrix),
            ],
        }
    }

    fn conversions() -> Vec<AxisConversion> {
        vec![
            AxisConversion::IDENTITY,
            AxisConversion::new(Axis::X, Axis::Y).unwrap(),
            AxisConversion::new(Axis::NegZ, Axis::Y).unwrap(),
        ]
    }

    #[test]
    fn test_chain_transforms() {
        let skeleton = Skeleton::build(&chain(), &AxisConversion::IDENTITY).unwrap();
        let bones = skeleton.bones();

        assert_eq!(bones[0].parent_index, None);
        assert!(bones[0].transform.position.abs_diff_eq(Vec3::Z, 1e-6));
        assert_eq!(bones[1].parent_index, Some(0));
        // Child sits at the parent's tail
        assert!(bones[1].transform.position.abs_diff_eq(Vec3::Y * 2.0, 1e-6));
        assert!(bones[1]
            .transform
            .rotation
            .abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-6));
        assert_eq!(skeleton.index_of("arm"), Some(1));
        assert_eq!(skeleton.index_of("leg"), None);
    }

    #[test]
    fn test_inverse_rest_pose_cancels_rest_matrix() {
        let armature = chain();
        for conversion in conversions() {
            let skeleton = Skeleton::build(&armature, &conversion).unwrap();
            for (bone, host) in skeleton.bones().iter().zip(&armature.bones) {
                let rest = conversion.convert_matrix(host.matrix_local);
                assert!((bone.inverse_rest_pose * rest).abs_diff_eq(Mat4::IDENTITY, 1e-5));
            }
        }
    }

    #[test]
    fn test_rest_pose_skinning_is_identity() {
        for conversion in conversions() {
            let skeleton = Skeleton::build(&chain(), &conversion).unwrap();
            let bones = skeleton.bones();
            let skinning = Pose::rest(bones).skinning_matrices(bones).unwrap();
            for matrix in skinning {
                assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5), "{matrix:?}");
            }
        }
    }

    #[test]
    fn test_positions_are_converted() {
        let conversion = AxisConversion::new(Axis::X, Axis::Y).unwrap();
        let skeleton = Skeleton::build(&chain(), &conversion).unwrap();
        // Host up (+Z) is engine +Y, host forward (+Y) is engine +X
        assert!(skeleton.bones()[0]
            .transform
            .position
            .abs_diff_eq(Vec3::Y, 1e-6));
        assert!(skeleton.bones()[1]
            .transform
            .position
            .abs_diff_eq(Vec3::X * 2.0, 1e-6));
    }

    #[test]
    fn test_first_bone_with_parent_is_rejected() {
        let mut armature = chain();
        armature.bones.swap(0, 1);
        assert!(matches!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_empty_armature_is_rejected() {
        let armature = ArmatureSnapshot::default();
        assert!(matches!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_second_root_is_rejected() {
        let mut armature = chain();
        armature.bones[1].parent = None;
        assert!(matches!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_unknown_or_later_parent_is_malformed() {
        let mut armature = chain();
        armature.bones[1].parent = Some("hand".to_string());
        assert_eq!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::MalformedHierarchy {
                bone: "arm".to_string(),
                parent: "hand".to_string(),
            })
        );

        let mut armature = chain();
        armature.bones.push(bone(
            "hand",
            Some("finger"),
            Quat::IDENTITY,
            Vec3::Y,
            Mat4::IDENTITY,
        ));
        armature.bones.push(bone(
            "finger",
            Some("arm"),
            Quat::IDENTITY,
            Vec3::Y,
            Mat4::IDENTITY,
        ));
        assert!(matches!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::MalformedHierarchy { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut armature = chain();
        armature.bones[1].name = "root".to_string();
        assert!(matches!(
            Skeleton::build(&armature, &AxisConversion::IDENTITY),
            Err(ExportError::PreconditionViolation(_))
        ));
    }
}
