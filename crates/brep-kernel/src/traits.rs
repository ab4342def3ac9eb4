use crate::types::*;

/// Loading side of the geometry kernel.
/// Implemented by TruckKernel (real STEP import) and MockKernel (deterministic test double).
pub trait Kernel {
    /// Parse STEP text into a solid owned by this kernel.
    fn load_step(&mut self, step_text: &str) -> Result<KernelSolidHandle, KernelError>;

    /// Release a solid. Ids handed out for it become invalid.
    fn unload(&mut self, solid: &KernelSolidHandle);
}

/// Topology introspection trait. Provides read-only queries on loaded geometry.
pub trait KernelIntrospect {
    /// List all faces of a solid, in the kernel's one deterministic traversal order.
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all topological edges of a solid, each once.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Native surface description of a face.
    fn face_surface(&self, face: KernelId) -> Result<SurfaceGeometry, KernelError>;

    /// Mass and extent properties of a face.
    fn face_properties(&self, face: KernelId) -> Result<FaceProperties, KernelError>;

    /// Tessellate one face on its own.
    fn tessellate_face(
        &self,
        face: KernelId,
        params: &TessellationParams,
    ) -> Result<FaceMesh, KernelError>;

    /// Discretize one topological edge into a polyline.
    fn discretize_edge(
        &self,
        edge: KernelId,
        params: &TessellationParams,
    ) -> Result<Vec<[f64; 3]>, KernelError>;
}

/// Combined trait for callers that load through `&mut` and then query through `&`.
pub trait KernelBundle: Kernel + KernelIntrospect {}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {}
