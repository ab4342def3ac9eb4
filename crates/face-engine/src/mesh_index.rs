//! Tessellation-index builder.
//!
//! Walks the faces of a solid once, in kernel traversal order, classifying
//! and tessellating each one on its own. The traversal position becomes the
//! face's `FaceId`; triangles carry it in the parallel `face_ids` array.

use brep_kernel::{FaceMesh, KernelId, KernelIntrospect, KernelSolidHandle};
use label_types::{FaceId, FaceInfo};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::classify::classify_face;
use crate::config::EngineConfig;

/// Render buffers for one solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Flat vertex positions `[x0, y0, z0, x1, ...]`.
    pub vertices: Vec<f32>,
    /// Flat vertex normals, parallel to `vertices`.
    pub normals: Vec<f32>,
    /// Vertex index triples.
    pub triangles: Vec<u32>,
    /// Owning face of each triangle: `face_ids.len() == triangles.len() / 3`.
    pub face_ids: Vec<u32>,
    pub num_faces: usize,
    /// Line-segment endpoints of topological edges, `[x0, y0, z0, x1, ...]`.
    pub edges: Vec<f32>,
    /// Contiguous triangle range of each tessellated face.
    pub face_ranges: Vec<FaceRange>,
}

/// Maps a contiguous range of triangles to a logical face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRange {
    pub face_id: FaceId,
    /// First triangle (inclusive).
    pub start_triangle: u32,
    /// One past the last triangle.
    pub end_triangle: u32,
}

impl MeshBuffers {
    pub fn triangle_count(&self) -> usize {
        self.face_ids.len()
    }

    /// Owning face of a triangle.
    pub fn face_for_triangle(&self, triangle: usize) -> Option<FaceId> {
        self.face_ids.get(triangle).map(|&id| FaceId(id))
    }

    /// Triangle range of a face, or `None` when its tessellation was skipped.
    pub fn range_of(&self, face: FaceId) -> Option<FaceRange> {
        self.face_ranges.iter().copied().find(|r| r.face_id == face)
    }

    fn append_face(&mut self, id: FaceId, mesh: &FaceMesh) {
        let base = (self.vertices.len() / 3) as u32;
        let start_triangle = self.face_ids.len() as u32;

        let triangles: Vec<[u32; 3]> = mesh
            .triangles
            .iter()
            .map(|&[a, b, c]| if mesh.reversed { [a, c, b] } else { [a, b, c] })
            .collect();

        let normals: Vec<[f64; 3]> = if mesh.normals.len() == mesh.positions.len() {
            let sign = if mesh.reversed { -1.0 } else { 1.0 };
            mesh.normals.iter().map(|n| n.map(|v| v * sign)).collect()
        } else {
            averaged_normals(&mesh.positions, &triangles)
        };

        for (p, n) in mesh.positions.iter().zip(&normals) {
            self.vertices.extend(p.iter().map(|&v| v as f32));
            self.normals.extend(n.iter().map(|&v| v as f32));
        }
        for tri in &triangles {
            self.triangles.extend(tri.iter().map(|&i| i + base));
            self.face_ids.push(id.0);
        }

        self.face_ranges.push(FaceRange {
            face_id: id,
            start_triangle,
            end_triangle: self.face_ids.len() as u32,
        });
    }

    fn append_polyline(&mut self, points: &[[f64; 3]]) {
        for pair in points.windows(2) {
            for p in pair {
                self.edges.extend(p.iter().map(|&v| v as f32));
            }
        }
    }
}

/// Faces, metadata and render buffers of one solid.
#[derive(Debug, Clone)]
pub struct IndexedSolid {
    /// Metadata, indexed by `FaceId`.
    pub faces: Vec<FaceInfo>,
    /// Kernel face behind each `FaceId`.
    pub kernel_faces: Vec<KernelId>,
    pub mesh: MeshBuffers,
    /// Faces whose tessellation was skipped. They keep their id and metadata.
    pub untessellated: Vec<FaceId>,
}

/// Build the face table and the triangle buffer for `solid`.
///
/// Per-face tessellation failures are logged and skipped; the face stays in
/// the table.
#[instrument(skip_all)]
pub fn index_solid<K: KernelIntrospect + ?Sized>(
    kernel: &K,
    solid: &KernelSolidHandle,
    config: &EngineConfig,
) -> IndexedSolid {
    let kernel_faces = kernel.list_faces(solid);
    let mut faces = Vec::with_capacity(kernel_faces.len());
    let mut mesh = MeshBuffers {
        num_faces: kernel_faces.len(),
        ..MeshBuffers::default()
    };
    let mut untessellated = Vec::new();

    for (position, &kernel_face) in kernel_faces.iter().enumerate() {
        let id = FaceId::from(position);
        faces.push(classify_face(kernel, kernel_face, id, &config.tolerance));

        match kernel.tessellate_face(kernel_face, &config.tessellation) {
            Ok(face_mesh) if face_mesh.is_empty() => {
                warn!(face = %id, "tessellation produced no triangles; face is not pickable");
                untessellated.push(id);
            }
            Ok(face_mesh) => match check_indices(&face_mesh) {
                Ok(()) => {
                    debug!(face = %id, triangles = face_mesh.triangle_count(), "face tessellated");
                    mesh.append_face(id, &face_mesh);
                }
                Err(bad) => {
                    warn!(face = %id, index = bad, "tessellation references a missing vertex; skipping face");
                    untessellated.push(id);
                }
            },
            Err(e) => {
                warn!(face = %id, error = %e, "tessellation failed; face is not pickable");
                untessellated.push(id);
            }
        }
    }

    if config.tessellation.include_edges {
        for edge in kernel.list_edges(solid) {
            match kernel.discretize_edge(edge, &config.tessellation) {
                Ok(points) => mesh.append_polyline(&points),
                Err(e) => warn!(?edge, error = %e, "edge discretization failed"),
            }
        }
    }

    info!(
        faces = faces.len(),
        triangles = mesh.triangle_count(),
        skipped = untessellated.len(),
        edge_segments = mesh.edges.len() / 6,
        "solid indexed"
    );

    IndexedSolid {
        faces,
        kernel_faces,
        mesh,
        untessellated,
    }
}

fn check_indices(mesh: &FaceMesh) -> Result<(), u32> {
    let count = mesh.positions.len() as u32;
    match mesh.triangles.iter().flatten().find(|&&i| i >= count) {
        Some(&bad) => Err(bad),
        None => Ok(()),
    }
}

/// Per-vertex normals averaged from the adjacent triangles, `[0, 0, 1]` for
/// vertices with no non-degenerate neighbour.
fn averaged_normals(positions: &[[f64; 3]], triangles: &[[u32; 3]]) -> Vec<[f64; 3]> {
    let mut sums = vec![Vector3::zeros(); positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| Vector3::from(positions[i as usize]));
        if let Some(n) = (b - a).cross(&(c - a)).try_normalize(1e-12) {
            for &i in tri {
                sums[i as usize] += n;
            }
        }
    }
    sums.into_iter()
        .map(|s| s.try_normalize(1e-12).map_or([0.0, 0.0, 1.0], Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_kernel::{Kernel, MockKernel, MockSolid, SurfaceGeometry};
    use label_types::SurfaceKind;

    fn index(solid: MockSolid, config: &EngineConfig) -> IndexedSolid {
        let mut kernel = MockKernel::with_solid(solid);
        let handle = kernel.load_step("").unwrap();
        index_solid(&kernel, &handle, config)
    }

    #[test]
    fn every_triangle_has_a_valid_owner() {
        let indexed = index(MockSolid::plate_with_hole(30.0, 20.0, 4.0, 3.0), &EngineConfig::default());
        let mesh = &indexed.mesh;
        assert_eq!(mesh.face_ids.len(), mesh.triangles.len() / 3);
        assert_eq!(mesh.num_faces, indexed.faces.len());
        assert!(mesh.face_ids.iter().all(|&id| (id as usize) < indexed.faces.len()));
        assert!(mesh.triangles.iter().all(|&i| (i as usize) < mesh.vertices.len() / 3));
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
    }

    #[test]
    fn face_ranges_partition_the_buffer() {
        let indexed = index(MockSolid::cylinder(2.0, 5.0), &EngineConfig::default());
        let mesh = &indexed.mesh;
        let total: u32 = mesh
            .face_ranges
            .iter()
            .map(|r| r.end_triangle - r.start_triangle)
            .sum();
        assert_eq!(total as usize, mesh.triangle_count());
        for range in &mesh.face_ranges {
            for t in range.start_triangle..range.end_triangle {
                assert_eq!(mesh.face_for_triangle(t as usize), Some(range.face_id));
            }
        }
    }

    #[test]
    fn ids_follow_traversal_order() {
        let indexed = index(MockSolid::plate_with_hole(30.0, 20.0, 4.0, 3.0), &EngineConfig::default());
        for (i, face) in indexed.faces.iter().enumerate() {
            assert_eq!(face.id, FaceId(i as u32));
        }
        assert_eq!(indexed.faces[6].surface_type, SurfaceKind::Cylindrical);
        assert_eq!(indexed.kernel_faces.len(), 7);
    }

    #[test]
    fn failed_face_keeps_id_and_metadata() {
        let solid = MockSolid::block(1.0, 2.0, 3.0).with_failed_tessellation(1);
        let indexed = index(solid, &EngineConfig::default());
        assert_eq!(indexed.faces.len(), 6);
        assert_eq!(indexed.untessellated, vec![FaceId(1)]);
        assert_eq!(indexed.faces[1].surface_type, SurfaceKind::Planar);
        assert!(indexed.mesh.range_of(FaceId(1)).is_none());
        assert!(!indexed.mesh.face_ids.contains(&1));
        assert_eq!(indexed.mesh.triangle_count(), 10);
    }

    #[test]
    fn reversed_faces_flip_winding_and_normals() {
        let indexed = index(MockSolid::plate_with_hole(30.0, 20.0, 4.0, 3.0), &EngineConfig::default());
        let mesh = &indexed.mesh;
        let range = mesh.range_of(FaceId(6)).unwrap();
        let t = range.start_triangle as usize;
        let idx = &mesh.triangles[t * 3..t * 3 + 3];
        let p = |i: u32| {
            let i = i as usize * 3;
            [mesh.vertices[i] as f64, mesh.vertices[i + 1] as f64, mesh.vertices[i + 2] as f64]
        };
        let (a, b, c) = (p(idx[0]), p(idx[1]), p(idx[2]));
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
        ];
        // bore at (15, 10): inward-facing normals point towards the axis
        let radial = [a[0] - 15.0, a[1] - 10.0];
        assert!(n[0] * radial[0] + n[1] * radial[1] < 0.0);
        let vi = idx[0] as usize * 3;
        let vn = [mesh.normals[vi], mesh.normals[vi + 1]];
        assert!(vn[0] * (radial[0] as f32) + vn[1] * (radial[1] as f32) < 0.0);
    }

    #[test]
    fn missing_normals_are_averaged() {
        let solid = MockSolid::new().with_opaque_face(SurfaceGeometry::BSpline);
        let indexed = index(solid, &EngineConfig::default());
        assert_eq!(indexed.mesh.normals, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn edges_follow_config() {
        let with = index(MockSolid::block(1.0, 1.0, 1.0), &EngineConfig::default());
        assert_eq!(with.mesh.edges.len(), 12 * 6);
        let without = index(MockSolid::block(1.0, 1.0, 1.0), &EngineConfig::preview());
        assert!(without.mesh.edges.is_empty());
    }
}
