//! Model assembler and export pipeline

use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use supcom_shared::{Bone, Model, Triangle, Vertex};

use crate::attributes::extract_vertices;
use crate::error::Result;
use crate::mesh::{normalize_mesh, NormalizedMesh};
use crate::settings::ExportSettings;
use crate::skeleton::Skeleton;
use crate::source::{ArmatureSource, MeshSource, SceneSnapshot};

/// Pair bones, vertices and triangles into one model
///
/// Every triangle must reference existing vertices and every influence an
/// existing bone.
pub fn assemble_model(
    name: impl Into<String>,
    info: impl Into<String>,
    bones: Vec<Bone>,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
) -> Result<Model> {
    Ok(Model::new(name, info, bones, vertices, triangles)?)
}

/// Triangle list of a normalized mesh
pub fn model_triangles(mesh: &NormalizedMesh) -> Vec<Triangle> {
    mesh.triangles
        .iter()
        .map(|t| Triangle {
            vertices: t.vertices,
        })
        .collect()
}

/// Run the full export pipeline on host data
///
/// The host mesh and armature are only read; all reworking happens on a
/// working copy that is dropped once the model is assembled.
pub fn convert_to_model<M, A>(mesh: &M, armature: &A, settings: &ExportSettings) -> Result<Model>
where
    M: MeshSource + ?Sized,
    A: ArmatureSource + ?Sized,
{
    let conversion = settings.axis_conversion()?;
    let skeleton = Skeleton::build(armature, &conversion)?;

    let normalized = normalize_mesh(mesh, settings.quad_method, settings.ngon_method)?;
    let vertices = extract_vertices(
        &normalized,
        mesh,
        &skeleton,
        &conversion,
        settings.uv_tolerance,
    )?;
    let triangles = model_triangles(&normalized);

    let model = assemble_model(
        armature.name(),
        settings.info.as_str(),
        skeleton.into_bones(),
        vertices,
        triangles,
    )?;

    tracing::info!(
        "Converted model '{}': {} bones, {} vertices, {} triangles, {} UV channels",
        model.name(),
        model.bones().len(),
        model.vertices().len(),
        model.triangles().len(),
        model.uv_channel_count()
    );

    Ok(model)
}

/// Convert a scene snapshot file and write the model as JSON
pub fn convert_snapshot(
    input: &Path,
    output: &Path,
    settings: &ExportSettings,
) -> anyhow::Result<Model> {
    let scene = SceneSnapshot::load(input)?;
    let model = convert_to_model(&scene.mesh, &scene.armature, settings)
        .with_context(|| format!("Failed to export {}", input.display()))?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create output: {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &model)
        .with_context(|| format!("Failed to write model: {}", output.display()))?;
    writer.flush()?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use glam::{Mat4, Vec2, Vec3};
    use smallvec::smallvec;
    use supcom_shared::{ModelError, SkinInfluence, Transform};

    fn root() -> Bone {
        Bone {
            name: "root".to_string(),
            index: 0,
            parent_index: None,
            transform: Transform::IDENTITY,
            inverse_rest_pose: Mat4::IDENTITY,
        }
    }

    fn vertex(index: usize, bone_index: usize) -> Vertex {
        Vertex {
            index,
            position: Vec3::ZERO,
            normal: Vec3::Z,
            uvs: smallvec![Vec2::ZERO],
            tangent: None,
            binormal: None,
            influences: smallvec![SkinInfluence {
                bone_index,
                weight: 1.0
            }],
        }
    }

    #[test]
    fn test_assemble_keeps_order_and_metadata() {
        let vertices: Vec<Vertex> = (0..3).map(|i| vertex(i, 0)).collect();
        let model = assemble_model(
            "Armature",
            "info",
            vec![root()],
            vertices.clone(),
            vec![Triangle::new(0, 1, 2)],
        )
        .unwrap();

        assert_eq!(model.name(), "Armature");
        assert_eq!(model.info(), "info");
        assert_eq!(model.vertices(), vertices.as_slice());
        assert_eq!(model.triangles(), &[Triangle::new(0, 1, 2)]);
    }

    #[test]
    fn test_assemble_rejects_bad_indices() {
        let vertices: Vec<Vertex> = (0..3).map(|i| vertex(i, 0)).collect();
        let result = assemble_model(
            "m",
            "",
            vec![root()],
            vertices,
            vec![Triangle::new(0, 1, 3)],
        );
        assert!(matches!(
            result,
            Err(ExportError::IndexOutOfRange(
                ModelError::TriangleIndexOutOfRange { vertex: 3, .. }
            ))
        ));

        let vertices: Vec<Vertex> = (0..3).map(|i| vertex(i, i)).collect();
        let result = assemble_model(
            "m",
            "",
            vec![root()],
            vertices,
            vec![Triangle::new(0, 1, 2)],
        );
        assert!(matches!(
            result,
            Err(ExportError::IndexOutOfRange(
                ModelError::BoneIndexOutOfRange { vertex: 1, bone: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_model_triangles_follow_mesh() {
        let mut source = crate::source::MeshSnapshot::new(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ]);
        source.push_polygon(vec![0, 1, 2, 3], true);
        let mesh = normalize_mesh(
            &source,
            crate::settings::QuadMethod::Fixed,
            crate::settings::NgonMethod::Beauty,
        )
        .unwrap();

        let triangles = model_triangles(&mesh);
        assert_eq!(triangles, vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)]);
    }
}
