//! Vertex attribute extractor
//!
//! Builds the final vertex buffer from a normalized mesh: converted
//! position, a normal recomputed from the adjacent triangles, exactly one UV
//! per active channel, and at most four bone influences.
//!
//! Errors name the host vertex the failing vertex was split from, since that
//! is the index the modeler can find.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use supcom_shared::{SkinInfluence, Vertex, MAX_INFLUENCES, MAX_UV_CHANNELS};

use crate::convert::AxisConversion;
use crate::error::{ExportError, Result};
use crate::mesh::{NormalizedMesh, SplitVertex};
use crate::skeleton::Skeleton;
use crate::source::MeshSource;

/// Extract every vertex of `mesh`, in order
pub fn extract_vertices<M: MeshSource + ?Sized>(
    mesh: &NormalizedMesh,
    source: &M,
    skeleton: &Skeleton,
    conversion: &AxisConversion,
    uv_tolerance: f32,
) -> Result<Vec<Vertex>> {
    mesh.vertices
        .iter()
        .enumerate()
        .map(|(index, vertex)| {
            Ok(Vertex {
                index,
                position: conversion.convert_vector(vertex.position),
                normal: conversion.convert_normal(vertex_normal(mesh, vertex)),
                uvs: extract_uvs(mesh, vertex, uv_tolerance)?,
                tangent: None,
                binormal: None,
                influences: extract_influences(source, vertex.source as usize, skeleton)?,
            })
        })
        .collect()
}

/// Host-space normal: adjacent triangle normals weighted by corner angle
pub fn vertex_normal(mesh: &NormalizedMesh, vertex: &SplitVertex) -> Vec3 {
    vertex
        .corners
        .iter()
        .map(|&corner| mesh.triangle_normal(corner.triangle as usize) * mesh.corner_angle(corner))
        .sum::<Vec3>()
        .normalize_or_zero()
}

/// The single UV of a vertex on every active channel
pub fn extract_uvs(
    mesh: &NormalizedMesh,
    vertex: &SplitVertex,
    tolerance: f32,
) -> Result<SmallVec<[Vec2; MAX_UV_CHANNELS]>> {
    let mut uvs = SmallVec::new();
    for channel in 0..mesh.uv_channels {
        let mut distinct: SmallVec<[Vec2; 4]> = SmallVec::new();
        for corner in &vertex.corners {
            let triangle = &mesh.triangles[corner.triangle as usize];
            let Some(uv) = triangle.corners[corner.slot as usize].uvs[channel] else {
                continue;
            };
            if !distinct.iter().any(|seen| seen.abs_diff_eq(uv, tolerance)) {
                distinct.push(uv);
            }
        }

        match distinct.as_slice() {
            [] => {
                return Err(ExportError::UnweldedUv {
                    vertex: vertex.source as usize,
                    channel,
                })
            }
            [uv] => uvs.push(*uv),
            _ => {
                return Err(ExportError::UvIslandConflict {
                    vertex: vertex.source as usize,
                    channel,
                    count: distinct.len(),
                })
            }
        }
    }
    Ok(uvs)
}

/// Bone influences of a host vertex
///
/// Every assigned group counts, zero weights included: the influence limit
/// is checked on all of them before any group is resolved, and each one
/// must name a bone.
pub fn extract_influences<M: MeshSource + ?Sized>(
    source: &M,
    vertex: usize,
    skeleton: &Skeleton,
) -> Result<SmallVec<[SkinInfluence; MAX_INFLUENCES]>> {
    let weights = source.deform_weights(vertex);
    if weights.len() > MAX_INFLUENCES {
        return Err(ExportError::OverSkinned {
            vertex,
            count: weights.len(),
        });
    }

    let names = source.deform_group_names();
    weights
        .iter()
        .map(|w| {
            let name = names.get(w.group).ok_or(ExportError::UnknownDeformGroup {
                vertex,
                group: w.group,
                group_count: names.len(),
            })?;
            let bone_index =
                skeleton
                    .index_of(name)
                    .ok_or_else(|| ExportError::UnknownBoneReference {
                        vertex,
                        name: name.clone(),
                    })?;
            Ok(SkinInfluence {
                bone_index,
                weight: w.weight,
            })
        })
        .collect()
}
