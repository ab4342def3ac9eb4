//! Session context for one loaded document.
//!
//! Owns everything derived from a single STEP file: the face table, the
//! render buffers, the entity correspondence and the user's features. Ids
//! are assigned once at load and never recomputed; reloading means building
//! a new session.

use brep_kernel::{KernelBundle, KernelId, KernelSolidHandle};
use label_types::{FaceId, FaceInfo, FeatureMap, FeatureMember, Measurement, SurfaceKind};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::correlate::{correlate, CorrespondenceTable};
use crate::errors::{ExportError, FeatureError, LoadError};
use crate::export::{export_named, ExportOutcome};
use crate::features::{Feature, FeatureSet};
use crate::measure::measure;
use crate::mesh_index::{index_solid, MeshBuffers};
use crate::units::{detect_length_unit, LengthUnit, UnitInfo};

/// Summary returned with every successful load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadInfo {
    pub num_faces: usize,
    /// `ADVANCED_FACE` entities found in the text.
    pub num_step_entities: usize,
    /// Faces with no textual counterpart. Their names cannot be exported.
    pub num_unmapped: usize,
    pub length_unit: LengthUnit,
    /// Millimetres per document unit.
    pub length_scale: f64,
    pub triangle_count: usize,
}

/// One loaded document and the features named on it.
#[derive(Debug)]
pub struct LabelSession {
    document_id: Uuid,
    step_text: String,
    solid: KernelSolidHandle,
    faces: Vec<FaceInfo>,
    kernel_faces: Vec<KernelId>,
    untessellated: Vec<FaceId>,
    mesh: MeshBuffers,
    table: CorrespondenceTable,
    units: UnitInfo,
    features: FeatureSet,
    config: EngineConfig,
}

impl LabelSession {
    /// Load STEP text through `kernel` and build the session.
    ///
    /// All or nothing: on error no session exists and the kernel holds no
    /// solid for this text.
    #[instrument(skip_all, fields(bytes = step_text.len()))]
    pub fn load<K: KernelBundle + ?Sized>(
        kernel: &mut K,
        step_text: &str,
        config: EngineConfig,
    ) -> Result<(Self, LoadInfo), LoadError> {
        let solid = kernel.load_step(step_text)?;
        let indexed = index_solid(&*kernel, &solid, &config);
        if indexed.faces.is_empty() {
            kernel.unload(&solid);
            return Err(LoadError::NoFaces);
        }

        let table = correlate(step_text);
        let units = detect_length_unit(step_text);
        let mut faces = indexed.faces;
        for face in &mut faces {
            face.step_name = table.step_name(face.id).map(str::to_string);
        }

        let info = LoadInfo {
            num_faces: faces.len(),
            num_step_entities: table.len(),
            num_unmapped: table.unmapped_count(faces.len()),
            length_unit: units.unit.clone(),
            length_scale: units.scale,
            triangle_count: indexed.mesh.triangle_count(),
        };
        info!(
            faces = info.num_faces,
            entities = info.num_step_entities,
            unmapped = info.num_unmapped,
            triangles = info.triangle_count,
            unit = %info.length_unit,
            "document loaded"
        );

        let session = Self {
            document_id: Uuid::new_v4(),
            step_text: step_text.to_string(),
            solid,
            faces,
            kernel_faces: indexed.kernel_faces,
            untessellated: indexed.untessellated,
            mesh: indexed.mesh,
            table,
            units,
            features: FeatureSet::new(),
            config,
        };
        Ok((session, info))
    }

    /// Give the kernel solid back. The session is consumed.
    pub fn release<K: KernelBundle + ?Sized>(self, kernel: &mut K) {
        kernel.unload(&self.solid);
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn step_text(&self) -> &str {
        &self.step_text
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn units(&self) -> &UnitInfo {
        &self.units
    }

    pub fn correspondence(&self) -> &CorrespondenceTable {
        &self.table
    }

    /// Summary of the loaded document, as returned by `load`.
    pub fn info(&self) -> LoadInfo {
        LoadInfo {
            num_faces: self.faces.len(),
            num_step_entities: self.table.len(),
            num_unmapped: self.table.unmapped_count(self.faces.len()),
            length_unit: self.units.unit.clone(),
            length_scale: self.units.scale,
            triangle_count: self.mesh.triangle_count(),
        }
    }

    // ── Faces and picking ──

    pub fn faces(&self) -> &[FaceInfo] {
        &self.faces
    }

    pub fn face(&self, id: FaceId) -> Option<&FaceInfo> {
        self.faces.get(id.index())
    }

    /// Kernel entity behind a face.
    pub fn kernel_face(&self, id: FaceId) -> Option<KernelId> {
        self.kernel_faces.get(id.index()).copied()
    }

    /// Faces that are in the table but contributed no triangles.
    pub fn untessellated(&self) -> &[FaceId] {
        &self.untessellated
    }

    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    pub fn face_for_triangle(&self, triangle: usize) -> Option<FaceId> {
        self.mesh.face_for_triangle(triangle)
    }

    pub fn faces_by_kind(&self, kind: SurfaceKind) -> impl Iterator<Item = &FaceInfo> {
        self.faces.iter().filter(move |f| f.surface_type == kind)
    }

    // ── Measurement ──

    /// Measure in document units.
    pub fn measure(&self, selected: &[FaceId]) -> Measurement {
        measure(selected, &self.faces, &self.config.tolerance)
    }

    /// Measure and convert lengths to `display`.
    pub fn measure_in(&self, selected: &[FaceId], display: &LengthUnit) -> Measurement {
        self.measure(selected).scaled(self.units.scale_to(display))
    }

    // ── Features ──

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn create_feature(
        &mut self,
        name: &str,
        members: Vec<FeatureMember>,
    ) -> Result<&Feature, FeatureError> {
        self.features.create(name, members, self.faces.len())
    }

    pub fn delete_feature(&mut self, name: &str) -> Result<Feature, FeatureError> {
        self.features.delete(name)
    }

    pub fn rename_feature(&mut self, name: &str, new_name: &str) -> Result<(), FeatureError> {
        self.features.rename(name, new_name)
    }

    pub fn set_sub_name(
        &mut self,
        face: FaceId,
        sub_name: Option<String>,
    ) -> Result<(), FeatureError> {
        self.features.set_sub_name(face, sub_name)
    }

    pub fn clear_features(&mut self) {
        self.features.clear();
    }

    // ── Export ──

    /// Export the session's own features.
    pub fn export(&self) -> Result<ExportOutcome, ExportError> {
        self.export_with(&self.features.to_feature_map())
    }

    /// Export an externally supplied feature map against this document.
    pub fn export_with(&self, features: &FeatureMap) -> Result<ExportOutcome, ExportError> {
        export_named(&self.step_text, &self.table, &self.faces, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_kernel::{KernelError, MockKernel, MockSolid};

    fn step_with_faces(n: usize) -> String {
        let mut text = String::from("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n");
        for i in 0..n {
            text.push_str(&format!(
                "#{}=ADVANCED_FACE('',(#1),#2,.T.);\n",
                100 + i
            ));
        }
        text.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        text
    }

    fn load_block() -> (MockKernel, LabelSession, LoadInfo) {
        let mut kernel = MockKernel::with_solid(MockSolid::block(10.0, 20.0, 30.0));
        let (session, info) =
            LabelSession::load(&mut kernel, &step_with_faces(6), EngineConfig::default())
                .unwrap();
        (kernel, session, info)
    }

    #[test]
    fn load_reports_summary() {
        let (_, session, info) = load_block();
        assert_eq!(info.num_faces, 6);
        assert_eq!(info.num_step_entities, 6);
        assert_eq!(info.num_unmapped, 0);
        assert_eq!(info.length_unit, LengthUnit::Millimetre);
        assert_eq!(info.triangle_count, session.mesh().triangle_count());
        assert_eq!(session.info(), info);
        assert_eq!(session.faces_by_kind(SurfaceKind::Planar).count(), 6);
    }

    #[test]
    fn kernel_errors_propagate() {
        let mut kernel = MockKernel::with_solid(MockSolid::block(1.0, 1.0, 1.0));
        kernel.fail_next_load("bad header");
        let err = LabelSession::load(&mut kernel, "garbage", EngineConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Kernel(KernelError::StepParse { .. })));
    }

    #[test]
    fn empty_solid_is_rejected_and_released() {
        let mut kernel = MockKernel::with_solid(MockSolid::new());
        let err = LabelSession::load(&mut kernel, "", EngineConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::NoFaces));
        assert_eq!(kernel.loaded_count(), 0);
    }

    #[test]
    fn step_names_are_copied_into_faces() {
        let mut kernel = MockKernel::with_solid(MockSolid::block(1.0, 1.0, 1.0));
        let text = step_with_faces(6).replacen("ADVANCED_FACE('',", "ADVANCED_FACE('lid',", 1);
        let (session, _) = LabelSession::load(&mut kernel, &text, EngineConfig::default()).unwrap();
        assert_eq!(session.faces()[0].step_name.as_deref(), Some("lid"));
        assert_eq!(session.faces()[1].step_name, None);
    }

    #[test]
    fn every_triangle_picks_back_to_a_face() {
        let (_, session, _) = load_block();
        for t in 0..session.mesh().triangle_count() {
            let face = session.face_for_triangle(t).unwrap();
            assert!(session.face(face).is_some());
        }
        assert_eq!(session.face_for_triangle(usize::MAX), None);
    }

    #[test]
    fn features_flow_into_export() {
        let (_, mut session, _) = load_block();
        session
            .create_feature("base", vec![FeatureMember::new(0u32)])
            .unwrap();
        let outcome = session.export().unwrap();
        assert!(outcome.text.contains("ADVANCED_FACE('base',"));
        assert_eq!(outcome.renamed, vec![(FaceId(0), "base".to_string())]);

        session.rename_feature("base", "floor").unwrap();
        assert!(session.export().unwrap().text.contains("'floor'"));
        session.delete_feature("floor").unwrap();
        assert_eq!(session.export().unwrap().text, session.step_text());
    }

    #[test]
    fn measure_in_scales_lengths() {
        let (_, session, _) = load_block();
        // bottom and top of a 30 deep block
        let native = session.measure(&[FaceId(0), FaceId(1)]);
        let metres = session.measure_in(&[FaceId(0), FaceId(1)], &LengthUnit::Metre);
        approx::assert_relative_eq!(native.value().unwrap(), 30.0, epsilon = 1e-9);
        approx::assert_relative_eq!(metres.value().unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn release_unloads_the_solid() {
        let (mut kernel, session, _) = load_block();
        assert_eq!(kernel.loaded_count(), 1);
        session.release(&mut kernel);
        assert_eq!(kernel.loaded_count(), 0);
    }
}
