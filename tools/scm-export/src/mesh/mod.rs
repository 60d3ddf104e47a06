//! Mesh normalizer (host polygons -> triangle-only, hard-edge-split mesh)

mod split;
mod triangulate;
mod types;

use glam::Vec3;
use hashbrown::HashSet;

pub use triangulate::triangulate_polygon;
pub use types::{
    Corner, CornerRef, EdgeKey, NormalizedMesh, NormalizedTriangle, SplitVertex, WorkingMesh,
    WorkingPolygon, WorkingTriangle,
};

use crate::error::{ExportError, Result};
use crate::settings::{NgonMethod, QuadMethod};
use crate::source::MeshSource;

/// Normalize a host mesh for export
///
/// Works on a copy of the host data: triangulates every polygon, then
/// splits vertices along sharp edges so each output vertex can carry a
/// single normal and UV per channel.
pub fn normalize_mesh<M: MeshSource + ?Sized>(
    source: &M,
    quad_method: QuadMethod,
    ngon_method: NgonMethod,
) -> Result<NormalizedMesh> {
    let working = WorkingMesh::from_source(source)?;
    let sharp = bake_smoothness(&working);
    let triangles = triangulate_mesh(&working, quad_method, ngon_method)?;
    check_corner_count(triangles.len())?;

    let (mesh, loose) = split::split_sharp_edges(&working, &triangles, &sharp);
    if loose > 0 {
        tracing::warn!("Dropped {} vertices not used by any polygon", loose);
    }

    tracing::debug!(
        "Normalized mesh: {} polygons -> {} triangles, {} -> {} vertices ({} sharp edges)",
        working.polygons.len(),
        mesh.triangles.len(),
        working.positions.len(),
        mesh.vertices.len(),
        sharp.len()
    );

    Ok(mesh)
}

/// Collect the edges the splitter must cut
///
/// Explicitly sharp edges plus every boundary edge of a flat-shaded polygon.
/// Diagonals added by triangulation are never sharp, so a flat polygon
/// stays one connected surface.
pub fn bake_smoothness(mesh: &WorkingMesh) -> HashSet<EdgeKey> {
    let mut sharp: HashSet<EdgeKey> = mesh.sharp_edges.iter().copied().collect();
    for polygon in mesh.polygons.iter().filter(|p| !p.smooth) {
        sharp.extend(polygon.edges());
    }
    sharp
}

/// Corners, split vertices and triangles are all indexed with `u32`
fn check_corner_count(triangles: usize) -> Result<()> {
    triangles
        .checked_mul(3)
        .and_then(|corners| u32::try_from(corners).ok())
        .map(|_| ())
        .ok_or(ExportError::MeshTooLarge { triangles })
}

fn triangulate_mesh(
    mesh: &WorkingMesh,
    quad_method: QuadMethod,
    ngon_method: NgonMethod,
) -> Result<Vec<WorkingTriangle>> {
    let mut triangles = Vec::new();
    for (index, polygon) in mesh.polygons.iter().enumerate() {
        let points: Vec<Vec3> = polygon
            .corners
            .iter()
            .map(|c| mesh.positions[c.vertex as usize])
            .collect();

        let split = triangulate_polygon(&points, quad_method, ngon_method).ok_or_else(|| {
            ExportError::DegeneratePolygon {
                polygon: index,
                reason: "has no plane to triangulate in".to_string(),
            }
        })?;

        triangles.extend(split.into_iter().map(|[a, b, c]| WorkingTriangle {
            corners: [polygon.corners[a], polygon.corners[b], polygon.corners[c]],
            polygon: index,
        }));
    }
    Ok(triangles)
}
