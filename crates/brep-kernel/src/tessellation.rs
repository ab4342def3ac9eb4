//! Conversion from truck meshes into kernel-neutral `FaceMesh` data.

use std::collections::HashMap;

use truck_meshalgo::prelude::*;

use crate::types::FaceMesh;

/// One shell tessellated at one tolerance: a mesh per face (None where the
/// kernel could not mesh it) and a polyline per topological edge.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShellMesh {
    pub faces: Vec<Option<FaceMesh>>,
    pub edges: Vec<Vec<[f64; 3]>>,
}

/// Flatten a truck face mesh into a `FaceMesh`.
///
/// Truck indexes positions and normals separately, so each distinct
/// (position, normal) pair becomes one output vertex. Quads and polygons are
/// fanned into triangles. `orientation == false` marks a reversed face.
pub(crate) fn face_mesh(mesh: &PolygonMesh, orientation: bool) -> FaceMesh {
    let positions = mesh.positions();
    let normals = mesh.normals();
    let use_normals = !normals.is_empty();

    let mut out = FaceMesh {
        reversed: !orientation,
        ..FaceMesh::default()
    };
    let mut index: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut missing_normal = false;

    let mut push = |polygon: &[StandardVertex], out: &mut FaceMesh| {
        let mut ids = Vec::with_capacity(polygon.len());
        for v in polygon {
            let nor = if use_normals { v.nor } else { None };
            let next = out.positions.len() as u32;
            let id = *index.entry((v.pos, nor)).or_insert_with(|| {
                let p = positions[v.pos];
                out.positions.push([p.x, p.y, p.z]);
                match nor.and_then(|i| normals.get(i)) {
                    Some(n) => out.normals.push([n.x, n.y, n.z]),
                    None => {
                        missing_normal = true;
                        out.normals.push([0.0; 3]);
                    }
                }
                next
            });
            ids.push(id);
        }
        for i in 1..ids.len().saturating_sub(1) {
            out.triangles.push([ids[0], ids[i], ids[i + 1]]);
        }
    };

    for tri in mesh.tri_faces() {
        push(&tri[..], &mut out);
    }
    for quad in mesh.quad_faces() {
        push(&quad[..], &mut out);
    }
    for polygon in mesh.other_faces() {
        push(polygon.as_slice(), &mut out);
    }

    if missing_normal {
        out.normals.clear();
    }
    out
}

/// Points of an edge polyline.
pub(crate) fn polyline(curve: &PolylineCurve<Point3>) -> Vec<[f64; 3]> {
    curve.iter().map(|p| [p.x, p.y, p.z]).collect()
}
