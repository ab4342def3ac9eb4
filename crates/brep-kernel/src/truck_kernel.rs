//! TruckKernel: real geometry kernel reading STEP through ruststep and truck.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ruststep::parser::parse;
use tracing::{debug, info, instrument, warn};
use truck_meshalgo::prelude::*;
use truck_stepio::r#in::Table;

use crate::native;
use crate::tessellation::{self, ShellMesh};
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

type Mesher = Box<dyn Fn(f64) -> ShellMesh>;

/// A converted shell: native face surfaces plus tessellations, one per
/// requested tolerance.
struct LoadedShell {
    surfaces: Vec<SurfaceGeometry>,
    mesher: Mesher,
    cache: RefCell<HashMap<u64, Rc<ShellMesh>>>,
}

impl LoadedShell {
    fn meshed(&self, tolerance: f64) -> Rc<ShellMesh> {
        let key = tolerance.to_bits();
        if let Some(mesh) = self.cache.borrow().get(&key) {
            return Rc::clone(mesh);
        }
        debug!(tolerance, "triangulating shell");
        let mesh = Rc::new((self.mesher)(tolerance));
        self.cache.borrow_mut().insert(key, Rc::clone(&mesh));
        mesh
    }
}

struct LoadedSolid {
    shells: Vec<LoadedShell>,
    faces: Vec<KernelId>,
    edges: Vec<KernelId>,
}

/// Where an entity lives: solid handle, shell index, index within the shell.
#[derive(Debug, Clone, Copy)]
struct Slot {
    solid: u64,
    shell: usize,
    index: usize,
}

/// Real geometry kernel backed by truck.
///
/// Shells are traversed in ascending STEP entity id and faces in shell order;
/// that traversal is the face order every caller sees. Surface descriptions
/// are read from the converted shell at load time, so a face that later fails
/// to mesh is still classified. Face properties come from a tessellation at
/// `analysis_deflection`.
pub struct TruckKernel {
    next_handle: u64,
    next_id: u64,
    analysis_deflection: f64,
    solids: HashMap<u64, LoadedSolid>,
    faces: HashMap<KernelId, Slot>,
    edges: HashMap<KernelId, Slot>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_id: 1,
            analysis_deflection: 0.01,
            solids: HashMap::new(),
            faces: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Tolerance of the mesh used for face properties.
    pub fn with_analysis_deflection(mut self, deflection: f64) -> Self {
        self.analysis_deflection = deflection;
        self
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn shell_mesh(
        &self,
        slots: &HashMap<KernelId, Slot>,
        id: KernelId,
        tolerance: f64,
    ) -> Result<(Rc<ShellMesh>, usize), KernelError> {
        let slot = slots.get(&id).ok_or(KernelError::EntityNotFound { id })?;
        let shell = self
            .solids
            .get(&slot.solid)
            .and_then(|s| s.shells.get(slot.shell))
            .ok_or(KernelError::EntityNotFound { id })?;
        Ok((shell.meshed(tolerance), slot.index))
    }

    fn face_mesh_at(&self, face: KernelId, tolerance: f64) -> Result<FaceMesh, KernelError> {
        let (mesh, index) = self.shell_mesh(&self.faces, face, tolerance)?;
        mesh.faces
            .get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| KernelError::TessellationFailed {
                reason: format!("no mesh produced for face {face:?}"),
            })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    #[instrument(skip_all, fields(bytes = step_text.len()))]
    fn load_step(&mut self, step_text: &str) -> Result<KernelSolidHandle, KernelError> {
        let exchange = parse(step_text).map_err(|e| KernelError::StepParse {
            reason: e.to_string(),
        })?;
        let data = exchange.data.first().ok_or_else(|| KernelError::StepParse {
            reason: "no DATA section".to_string(),
        })?;
        let table = Table::from_data_section(data);

        let mut shell_entries: Vec<_> = table.shell.iter().collect();
        shell_entries.sort_by_key(|(id, _)| **id);

        let handle = self.alloc_handle();
        let mut loaded = LoadedSolid {
            shells: Vec::new(),
            faces: Vec::new(),
            edges: Vec::new(),
        };

        for (step_id, holder) in shell_entries {
            let compressed = match table.to_compressed_shell(holder) {
                Ok(shell) => shell,
                Err(e) => {
                    warn!(shell = *step_id, error = %e, "skipping shell that failed to convert");
                    continue;
                }
            };
            let shell_index = loaded.shells.len();
            let (face_count, edge_count) = (compressed.faces.len(), compressed.edges.len());

            for index in 0..face_count {
                let id = self.alloc_id();
                self.faces.insert(
                    id,
                    Slot {
                        solid: handle.id(),
                        shell: shell_index,
                        index,
                    },
                );
                loaded.faces.push(id);
            }
            for index in 0..edge_count {
                let id = self.alloc_id();
                self.edges.insert(
                    id,
                    Slot {
                        solid: handle.id(),
                        shell: shell_index,
                        index,
                    },
                );
                loaded.edges.push(id);
            }

            let surfaces = compressed
                .faces
                .iter()
                .map(|face| {
                    let boundary: Vec<_> = face
                        .boundaries
                        .iter()
                        .flatten()
                        .filter_map(|e| compressed.edges.get(e.index))
                        .flat_map(|edge| native::sample_curve(&edge.curve))
                        .collect();
                    native::surface_geometry(&face.surface, face.orientation, &boundary)
                })
                .collect();

            let mesher: Mesher = Box::new(move |tolerance| {
                let meshed = compressed.robust_triangulation(tolerance);
                ShellMesh {
                    faces: meshed
                        .faces
                        .iter()
                        .map(|face| {
                            face.surface
                                .as_ref()
                                .map(|mesh| tessellation::face_mesh(mesh, face.orientation))
                        })
                        .collect(),
                    edges: meshed
                        .edges
                        .iter()
                        .map(|edge| tessellation::polyline(&edge.curve))
                        .collect(),
                }
            });
            loaded.shells.push(LoadedShell {
                surfaces,
                mesher,
                cache: RefCell::new(HashMap::new()),
            });
            debug!(shell = *step_id, faces = face_count, edges = edge_count, "shell converted");
        }

        if loaded.shells.is_empty() {
            return Err(KernelError::NoShells);
        }
        info!(
            shells = loaded.shells.len(),
            faces = loaded.faces.len(),
            edges = loaded.edges.len(),
            "STEP solid loaded"
        );
        self.solids.insert(handle.id(), loaded);
        Ok(handle)
    }

    fn unload(&mut self, solid: &KernelSolidHandle) {
        if let Some(loaded) = self.solids.remove(&solid.id()) {
            for id in &loaded.faces {
                self.faces.remove(id);
            }
            for id in &loaded.edges {
                self.edges.remove(id);
            }
        }
    }
}

impl KernelIntrospect for TruckKernel {
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
        let slot = self
            .faces
            .get(&face)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        self.solids
            .get(&slot.solid)
            .and_then(|s| s.shells.get(slot.shell))
            .and_then(|shell| shell.surfaces.get(slot.index))
            .cloned()
            .ok_or(KernelError::EntityNotFound { id: face })
    }

    fn face_properties(&self, face: KernelId) -> Result<FaceProperties, KernelError> {
        Ok(self.face_mesh_at(face, self.analysis_deflection)?.properties())
    }

    fn tessellate_face(
        &self,
        face: KernelId,
        params: &TessellationParams,
    ) -> Result<FaceMesh, KernelError> {
        self.face_mesh_at(face, params.linear_deflection)
    }

    fn discretize_edge(
        &self,
        edge: KernelId,
        params: &TessellationParams,
    ) -> Result<Vec<[f64; 3]>, KernelError> {
        let (mesh, index) = self.shell_mesh(&self.edges, edge, params.linear_deflection)?;
        mesh.edges
            .get(index)
            .cloned()
            .ok_or(KernelError::EntityNotFound { id: edge })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_step_text() {
        let mut kernel = TruckKernel::new();
        assert!(matches!(
            kernel.load_step("this is not a STEP file"),
            Err(KernelError::StepParse { .. })
        ));
    }

    #[test]
    fn unknown_entities_are_not_found() {
        let kernel = TruckKernel::new();
        assert!(matches!(
            kernel.face_properties(KernelId(42)),
            Err(KernelError::EntityNotFound { .. })
        ));
        assert!(matches!(
            kernel.face_surface(KernelId(42)),
            Err(KernelError::EntityNotFound { .. })
        ));
        assert!(matches!(
            kernel.discretize_edge(KernelId(7), &TessellationParams::default()),
            Err(KernelError::EntityNotFound { .. })
        ));
    }
}
