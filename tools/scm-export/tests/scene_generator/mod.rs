//! Programmatic scene snapshots for integration tests.
//!
//! - Flat-shaded cube with a per-face UV layout, fully weighted to one bone
//! - Smooth two-segment column skinned to a two-bone chain

#![allow(dead_code)]

use glam::{Mat4, Quat, Vec2, Vec3};
use scm_export::{ArmatureSnapshot, HostBone, MeshSnapshot, SceneSnapshot};
use std::path::Path;

/// Corner UVs shared by every cube face
const FACE_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Outward-facing cube quads
const CUBE_FACES: [[u32; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

pub fn cube_positions() -> Vec<Vec3> {
    vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 2.0),
        Vec3::new(1.0, -1.0, 2.0),
        Vec3::new(1.0, 1.0, 2.0),
        Vec3::new(-1.0, 1.0, 2.0),
    ]
}

/// One root bone at the armature origin pointing up +Z
pub fn single_bone_armature() -> ArmatureSnapshot {
    // Bone Y axis along armature +Z
    let rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
    ArmatureSnapshot {
        name: "Cube".to_string(),
        bones: vec![HostBone {
            name: "root".to_string(),
            parent: None,
            rotation,
            tail: Vec3::Y * 2.0,
            matrix_local: Mat4::from_quat(rotation),
        }],
    }
}

/// Flat-shaded cube, every face its own UV island, all weight on `root`
pub fn flat_cube() -> SceneSnapshot {
    let mut mesh = MeshSnapshot::new(cube_positions());
    let channel = mesh.push_uv_layer("UVMap");
    for face in CUBE_FACES {
        let polygon = mesh.push_polygon(face.to_vec(), false);
        mesh.set_polygon_uvs(polygon, channel, &FACE_UVS);
    }
    let root = mesh.push_deform_group("root");
    for vertex in 0..8 {
        mesh.assign(vertex, root, 1.0);
    }

    SceneSnapshot {
        mesh,
        armature: single_bone_armature(),
    }
}

/// Smooth cube with no UV layers or weights
pub fn smooth_cube() -> SceneSnapshot {
    let mut mesh = MeshSnapshot::new(cube_positions());
    for face in CUBE_FACES {
        mesh.push_polygon(face.to_vec(), true);
    }
    SceneSnapshot {
        mesh,
        armature: single_bone_armature(),
    }
}

/// Open column of two stacked rings of four quads, skinned to `root` and `spine`
pub fn skinned_column() -> SceneSnapshot {
    let mut positions = Vec::new();
    for level in 0..3 {
        let z = level as f32;
        positions.extend([
            Vec3::new(-0.5, -0.5, z),
            Vec3::new(0.5, -0.5, z),
            Vec3::new(0.5, 0.5, z),
            Vec3::new(-0.5, 0.5, z),
        ]);
    }

    let mut mesh = MeshSnapshot::new(positions);
    for level in 0..2u32 {
        let base = level * 4;
        for side in 0..4u32 {
            let next = (side + 1) % 4;
            mesh.push_polygon(
                vec![base + side, base + next, base + 4 + next, base + 4 + side],
                true,
            );
        }
    }

    let root = mesh.push_deform_group("root");
    let spine = mesh.push_deform_group("spine");
    for vertex in 0..12 {
        let level = vertex / 4;
        match level {
            0 => mesh.assign(vertex, root, 1.0),
            1 => {
                mesh.assign(vertex, root, 0.5);
                mesh.assign(vertex, spine, 0.5);
            }
            _ => mesh.assign(vertex, spine, 1.0),
        }
    }

    let up = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
    let root_matrix = Mat4::from_quat(up);
    let spine_matrix = root_matrix * Mat4::from_translation(Vec3::Y);
    let armature = ArmatureSnapshot {
        name: "Column".to_string(),
        bones: vec![
            HostBone {
                name: "root".to_string(),
                parent: None,
                rotation: up,
                tail: Vec3::Y,
                matrix_local: root_matrix,
            },
            HostBone {
                name: "spine".to_string(),
                parent: Some("root".to_string()),
                rotation: Quat::IDENTITY,
                tail: Vec3::Y,
                matrix_local: spine_matrix,
            },
        ],
    };

    SceneSnapshot { mesh, armature }
}

/// Write a scene snapshot as JSON
pub fn write_scene(path: &Path, scene: &SceneSnapshot) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)
}
