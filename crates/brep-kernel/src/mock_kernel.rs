//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Solids are staged from `MockSolid` builders with known surfaces, meshes
//! and edges. `load_step` ignores the text and instantiates the staged solid,
//! so tests can pair any STEP fixture with any geometry.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// A mock face with known geometry.
#[derive(Debug, Clone)]
struct MockFace {
    surface: SurfaceGeometry,
    properties: FaceProperties,
    mesh: FaceMesh,
    fail_tessellation: bool,
}

impl MockFace {
    fn new(surface: SurfaceGeometry, mesh: FaceMesh) -> Self {
        Self {
            surface,
            properties: mesh.properties(),
            mesh,
            fail_tessellation: false,
        }
    }

    fn translated(&self, offset: [f64; 3]) -> Self {
        let shift = |p: [f64; 3]| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]];
        let surface = match self.surface.clone() {
            SurfaceGeometry::Plane {
                origin,
                normal,
                reversed,
            } => SurfaceGeometry::Plane {
                origin: shift(origin),
                normal,
                reversed,
            },
            SurfaceGeometry::Cylinder {
                axis_point,
                axis_direction,
                radius,
                u_range,
            } => SurfaceGeometry::Cylinder {
                axis_point: shift(axis_point),
                axis_direction,
                radius,
                u_range,
            },
            SurfaceGeometry::Cone {
                apex,
                axis_direction,
                half_angle,
            } => SurfaceGeometry::Cone {
                apex: shift(apex),
                axis_direction,
                half_angle,
            },
            SurfaceGeometry::Sphere { center, radius } => SurfaceGeometry::Sphere {
                center: shift(center),
                radius,
            },
            SurfaceGeometry::Torus {
                center,
                axis_direction,
                major_radius,
                minor_radius,
            } => SurfaceGeometry::Torus {
                center: shift(center),
                axis_direction,
                major_radius,
                minor_radius,
            },
            tag_only => tag_only,
        };
        let mut mesh = self.mesh.clone();
        mesh.positions.iter_mut().for_each(|p| *p = shift(*p));
        let mut properties = self.properties;
        properties.centroid = shift(properties.centroid);
        properties.bounds = Aabb::from_points(&mesh.positions);
        Self {
            surface,
            properties,
            mesh,
            fail_tessellation: self.fail_tessellation,
        }
    }
}

/// A synthetic solid: faces in traversal order plus edge polylines.
#[derive(Debug, Clone, Default)]
pub struct MockSolid {
    faces: Vec<MockFace>,
    edges: Vec<Vec<[f64; 3]>>,
}

impl MockSolid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Axis-aligned box from the origin to `(w, h, d)`.
    /// Faces: bottom, top, front, back, left, right.
    pub fn block(w: f64, h: f64, d: f64) -> Self {
        let p = [
            [0.0, 0.0, 0.0],
            [w, 0.0, 0.0],
            [w, h, 0.0],
            [0.0, h, 0.0],
            [0.0, 0.0, d],
            [w, 0.0, d],
            [w, h, d],
            [0.0, h, d],
        ];
        let quads = [
            ([p[0], p[3], p[2], p[1]], [0.0, 0.0, -1.0]),
            ([p[4], p[5], p[6], p[7]], [0.0, 0.0, 1.0]),
            ([p[0], p[1], p[5], p[4]], [0.0, -1.0, 0.0]),
            ([p[3], p[7], p[6], p[2]], [0.0, 1.0, 0.0]),
            ([p[0], p[4], p[7], p[3]], [-1.0, 0.0, 0.0]),
            ([p[1], p[2], p[6], p[5]], [1.0, 0.0, 0.0]),
        ];
        let mut solid = Self::new();
        for (corners, normal) in quads {
            solid = solid.with_face(plane_at(corners[0], normal), quad_mesh(corners, normal));
        }
        let edge_pairs = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        for (a, b) in edge_pairs {
            solid = solid.with_edge(vec![p[a], p[b]]);
        }
        solid
    }

    /// Closed cylinder on the +Z axis. Faces: lateral, bottom cap, top cap.
    pub fn cylinder(radius: f64, height: f64) -> Self {
        let segments = 24;
        let lateral = cylinder_strip([0.0; 3], radius, 0.0, TAU, height, segments, false);
        Self::new()
            .with_face(z_cylinder([0.0; 3], radius, 0.0, TAU), lateral)
            .with_face(
                plane_at([0.0; 3], [0.0, 0.0, -1.0]),
                disk_mesh([0.0; 3], radius, -1.0, segments),
            )
            .with_face(
                plane_at([0.0, 0.0, height], [0.0, 0.0, 1.0]),
                disk_mesh([0.0, 0.0, height], radius, 1.0, segments),
            )
            .with_edge(circle([0.0; 3], radius, segments))
            .with_edge(circle([0.0, 0.0, height], radius, segments))
    }

    /// `w × h × t` plate with a through bore of `hole_radius` at its center.
    /// Faces: the six block faces, then the bore.
    pub fn plate_with_hole(w: f64, h: f64, t: f64, hole_radius: f64) -> Self {
        let mut solid = Self::block(w, h, t);
        let hole_area = PI * hole_radius * hole_radius;
        for cap in &mut solid.faces[..2] {
            cap.properties.area -= hole_area;
        }
        let center = [w / 2.0, h / 2.0, 0.0];
        let segments = 24;
        let bore = cylinder_strip(center, hole_radius, 0.0, TAU, t, segments, true);
        solid
            .with_face(z_cylinder(center, hole_radius, 0.0, TAU), bore)
            .with_edge(circle(center, hole_radius, segments))
            .with_edge(circle([center[0], center[1], t], hole_radius, segments))
    }

    /// Half of a cylindrical shell on +Z, open towards -Y, with its flat base.
    /// Faces: the 180° cylindrical face, then the base plane.
    pub fn half_pipe(radius: f64, length: f64) -> Self {
        let segments = 12;
        let arc = cylinder_strip([0.0; 3], radius, 0.0, PI, length, segments, false);
        let base = [
            [-radius, 0.0, 0.0],
            [radius, 0.0, 0.0],
            [radius, 0.0, length],
            [-radius, 0.0, length],
        ];
        let mut rim = Vec::new();
        for i in 0..=segments {
            let t = PI * i as f64 / segments as f64;
            rim.push([radius * t.cos(), radius * t.sin(), 0.0]);
        }
        Self::new()
            .with_face(z_cylinder([0.0; 3], radius, 0.0, PI), arc)
            .with_face(plane_at(base[0], [0.0, -1.0, 0.0]), quad_mesh(base, [0.0, -1.0, 0.0]))
            .with_edge(rim)
            .with_edge(vec![base[0], base[1]])
    }

    /// Append a face. Properties are computed from the mesh.
    pub fn with_face(mut self, surface: SurfaceGeometry, mesh: FaceMesh) -> Self {
        self.faces.push(MockFace::new(surface, mesh));
        self
    }

    /// Append a face whose surface the kernel only reports by tag
    /// (`BSpline`, `Offset`, `Unknown`, ...). It gets a small triangle mesh.
    pub fn with_opaque_face(self, surface: SurfaceGeometry) -> Self {
        let mesh = FaceMesh {
            positions: vec![[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -1.0]],
            normals: vec![],
            triangles: vec![[0, 1, 2]],
            reversed: false,
        };
        self.with_face(surface, mesh)
    }

    pub fn with_edge(mut self, polyline: Vec<[f64; 3]>) -> Self {
        self.edges.push(polyline);
        self
    }

    /// Make tessellation of the face at `index` fail.
    pub fn with_failed_tessellation(mut self, index: usize) -> Self {
        if let Some(face) = self.faces.get_mut(index) {
            face.fail_tessellation = true;
        }
        self
    }

    /// Repeat the whole solid `count` times, copy `k` shifted by `k * offset`,
    /// the way an assembly expands placements of one part.
    pub fn instanced(self, count: usize, offset: [f64; 3]) -> Self {
        let mut out = Self::new();
        for k in 0..count {
            let shift = offset.map(|v| v * k as f64);
            out.faces
                .extend(self.faces.iter().map(|f| f.translated(shift)));
            out.edges.extend(self.edges.iter().map(|e| {
                e.iter()
                    .map(|p| [p[0] + shift[0], p[1] + shift[1], p[2] + shift[2]])
                    .collect()
            }));
        }
        out
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[derive(Debug, Clone)]
struct LoadedSolid {
    faces: Vec<KernelId>,
    edges: Vec<KernelId>,
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    staged: Option<MockSolid>,
    fail_next_load: Option<String>,
    solids: HashMap<u64, LoadedSolid>,
    faces: HashMap<KernelId, MockFace>,
    edges: HashMap<KernelId, Vec<[f64; 3]>>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            staged: None,
            fail_next_load: None,
            solids: HashMap::new(),
            faces: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn with_solid(solid: MockSolid) -> Self {
        let mut kernel = Self::new();
        kernel.stage(solid);
        kernel
    }

    /// Solid instantiated by every subsequent `load_step`.
    pub fn stage(&mut self, solid: MockSolid) {
        self.staged = Some(solid);
    }

    /// Make the next `load_step` fail with a parse error.
    pub fn fail_next_load(&mut self, reason: impl Into<String>) {
        self.fail_next_load = Some(reason.into());
    }

    /// Number of solids currently loaded.
    pub fn loaded_count(&self) -> usize {
        self.solids.len()
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn face(&self, id: KernelId) -> Result<&MockFace, KernelError> {
        self.faces.get(&id).ok_or(KernelError::EntityNotFound { id })
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MockKernel {
    fn load_step(&mut self, _step_text: &str) -> Result<KernelSolidHandle, KernelError> {
        if let Some(reason) = self.fail_next_load.take() {
            return Err(KernelError::StepParse { reason });
        }
        let solid = self.staged.clone().ok_or(KernelError::NoShells)?;

        let mut loaded = LoadedSolid {
            faces: Vec::with_capacity(solid.faces.len()),
            edges: Vec::with_capacity(solid.edges.len()),
        };
        for face in solid.faces {
            let id = self.alloc_id();
            self.faces.insert(id, face);
            loaded.faces.push(id);
        }
        for edge in solid.edges {
            let id = self.alloc_id();
            self.edges.insert(id, edge);
            loaded.edges.push(id);
        }
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), loaded);
        Ok(handle)
    }

    fn unload(&mut self, solid: &KernelSolidHandle) {
        if let Some(loaded) = self.solids.remove(&solid.id()) {
            for id in loaded.faces {
                self.faces.remove(&id);
            }
            for id in loaded.edges {
                self.edges.remove(&id);
            }
        }
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.clone())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.edges.clone())
            .unwrap_or_default()
    }

    fn face_surface(&self, face: KernelId) -> Result<SurfaceGeometry, KernelError> {
        Ok(self.face(face)?.surface.clone())
    }

    fn face_properties(&self, face: KernelId) -> Result<FaceProperties, KernelError> {
        Ok(self.face(face)?.properties)
    }

    fn tessellate_face(
        &self,
        face: KernelId,
        _params: &TessellationParams,
    ) -> Result<FaceMesh, KernelError> {
        let face = self.face(face)?;
        if face.fail_tessellation {
            return Err(KernelError::TessellationFailed {
                reason: "mock face marked as failing".to_string(),
            });
        }
        Ok(face.mesh.clone())
    }

    fn discretize_edge(
        &self,
        edge: KernelId,
        _params: &TessellationParams,
    ) -> Result<Vec<[f64; 3]>, KernelError> {
        self.edges
            .get(&edge)
            .cloned()
            .ok_or(KernelError::EntityNotFound { id: edge })
    }
}

// ── Mesh builders ───────────────────────────────────────────────────────

fn plane_at(origin: [f64; 3], normal: [f64; 3]) -> SurfaceGeometry {
    SurfaceGeometry::Plane {
        origin,
        normal,
        reversed: false,
    }
}

fn z_cylinder(axis_point: [f64; 3], radius: f64, start: f64, arc: f64) -> SurfaceGeometry {
    SurfaceGeometry::Cylinder {
        axis_point,
        axis_direction: [0.0, 0.0, 1.0],
        radius,
        u_range: (start, start + arc),
    }
}

/// Two triangles over counter-clockwise corners.
fn quad_mesh(corners: [[f64; 3]; 4], normal: [f64; 3]) -> FaceMesh {
    FaceMesh {
        positions: corners.to_vec(),
        normals: vec![normal; 4],
        triangles: vec![[0, 1, 2], [0, 2, 3]],
        reversed: false,
    }
}

/// Triangle fan over a circle in a plane of constant z. `facing` is +1 for
/// a +Z normal, -1 for -Z.
fn disk_mesh(center: [f64; 3], radius: f64, facing: f64, segments: u32) -> FaceMesh {
    let mut mesh = FaceMesh {
        positions: vec![center],
        normals: vec![[0.0, 0.0, facing]],
        ..FaceMesh::default()
    };
    for i in 0..segments {
        let t = TAU * i as f64 / segments as f64;
        mesh.positions
            .push([center[0] + radius * t.cos(), center[1] + radius * t.sin(), center[2]]);
        mesh.normals.push([0.0, 0.0, facing]);
    }
    for i in 0..segments {
        let a = 1 + i;
        let b = 1 + (i + 1) % segments;
        if facing > 0.0 {
            mesh.triangles.push([0, a, b]);
        } else {
            mesh.triangles.push([0, b, a]);
        }
    }
    mesh
}

/// Lateral strip of a +Z cylinder from `start` over `arc` radians, with
/// radial surface normals. `reversed` marks an inward-facing face (a bore).
fn cylinder_strip(
    axis_point: [f64; 3],
    radius: f64,
    start: f64,
    arc: f64,
    height: f64,
    segments: u32,
    reversed: bool,
) -> FaceMesh {
    let closed = (arc - TAU).abs() < 1e-12;
    let columns = if closed { segments } else { segments + 1 };
    let mut mesh = FaceMesh {
        reversed,
        ..FaceMesh::default()
    };
    for i in 0..columns {
        let t = start + arc * i as f64 / segments as f64;
        let (s, c) = t.sin_cos();
        for z in [0.0, height] {
            mesh.positions.push([
                axis_point[0] + radius * c,
                axis_point[1] + radius * s,
                axis_point[2] + z,
            ]);
            mesh.normals.push([c, s, 0.0]);
        }
    }
    for i in 0..segments {
        let a = 2 * i;
        let b = 2 * ((i + 1) % columns);
        mesh.triangles.push([a, b, b + 1]);
        mesh.triangles.push([a, b + 1, a + 1]);
    }
    mesh
}

fn circle(center: [f64; 3], radius: f64, segments: u32) -> Vec<[f64; 3]> {
    (0..=segments)
        .map(|i| {
            let t = TAU * i as f64 / segments as f64;
            [center[0] + radius * t.cos(), center[1] + radius * t.sin(), center[2]]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn load(solid: MockSolid) -> (MockKernel, KernelSolidHandle) {
        let mut kernel = MockKernel::with_solid(solid);
        let handle = kernel.load_step("").unwrap();
        (kernel, handle)
    }

    #[test]
    fn block_has_six_faces_twelve_edges() {
        let (kernel, solid) = load(MockSolid::block(10.0, 20.0, 30.0));
        assert_eq!(kernel.list_faces(&solid).len(), 6);
        assert_eq!(kernel.list_edges(&solid).len(), 12);
    }

    #[test]
    fn block_faces_have_outward_normals_and_exact_area() {
        let (kernel, solid) = load(MockSolid::block(10.0, 20.0, 30.0));
        let faces = kernel.list_faces(&solid);
        let bottom = kernel.face_properties(faces[0]).unwrap();
        assert_relative_eq!(bottom.area, 200.0);
        assert_eq!(bottom.mean_normal, [0.0, 0.0, -1.0]);
        let right = kernel.face_properties(faces[5]).unwrap();
        assert_relative_eq!(right.area, 600.0);
        assert_eq!(right.mean_normal, [1.0, 0.0, 0.0]);
        assert_relative_eq!(right.centroid[0], 10.0);
    }

    #[test]
    fn plate_bore_is_reversed_cylinder() {
        let (kernel, solid) = load(MockSolid::plate_with_hole(40.0, 40.0, 5.0, 4.0));
        let faces = kernel.list_faces(&solid);
        assert_eq!(faces.len(), 7);
        match kernel.face_surface(faces[6]).unwrap() {
            SurfaceGeometry::Cylinder { radius, axis_point, .. } => {
                assert_relative_eq!(radius, 4.0);
                assert_eq!(axis_point, [20.0, 20.0, 0.0]);
            }
            other => panic!("expected cylinder, got {other:?}"),
        }
        let mesh = kernel
            .tessellate_face(faces[6], &TessellationParams::default())
            .unwrap();
        assert!(mesh.reversed);
    }

    #[test]
    fn failed_tessellation_is_per_face() {
        let solid = MockSolid::block(1.0, 1.0, 1.0).with_failed_tessellation(2);
        let (kernel, handle) = load(solid);
        let faces = kernel.list_faces(&handle);
        let params = TessellationParams::default();
        assert!(kernel.tessellate_face(faces[1], &params).is_ok());
        assert!(matches!(
            kernel.tessellate_face(faces[2], &params),
            Err(KernelError::TessellationFailed { .. })
        ));
    }

    #[test]
    fn instanced_repeats_faces_with_offset() {
        let solid = MockSolid::cylinder(2.0, 5.0).instanced(3, [10.0, 0.0, 0.0]);
        assert_eq!(solid.face_count(), 9);
        assert_eq!(solid.edge_count(), 6);
        let (kernel, handle) = load(solid);
        let faces = kernel.list_faces(&handle);
        match kernel.face_surface(faces[6]).unwrap() {
            SurfaceGeometry::Cylinder { axis_point, .. } => {
                assert_eq!(axis_point, [20.0, 0.0, 0.0])
            }
            other => panic!("expected cylinder, got {other:?}"),
        }
    }

    #[test]
    fn staged_failure_applies_once() {
        let mut kernel = MockKernel::with_solid(MockSolid::block(1.0, 1.0, 1.0));
        kernel.fail_next_load("bad header");
        assert!(matches!(
            kernel.load_step(""),
            Err(KernelError::StepParse { .. })
        ));
        assert!(kernel.load_step("").is_ok());
    }

    #[test]
    fn unload_releases_entities() {
        let (mut kernel, solid) = load(MockSolid::block(1.0, 1.0, 1.0));
        let face = kernel.list_faces(&solid)[0];
        kernel.unload(&solid);
        assert_eq!(kernel.loaded_count(), 0);
        assert!(kernel.list_faces(&solid).is_empty());
        assert!(matches!(
            kernel.face_surface(face),
            Err(KernelError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn nothing_staged_means_no_shells() {
        let mut kernel = MockKernel::new();
        assert!(matches!(kernel.load_step(""), Err(KernelError::NoShells)));
    }
}
