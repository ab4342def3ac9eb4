use serde::{Deserialize, Serialize};

use face_engine::{Feature, LoadInfo, MeshBuffers};
use label_types::{FaceId, FaceInfo, FeatureMember, Measurement};

/// Requests from the UI to the engine.
/// Serialized as JSON with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiToEngine {
    // -- Document --
    /// Replace the current document with this STEP text.
    LoadStep { step_text: String },
    ClearDocument,

    // -- Faces --
    QueryFaces,
    QueryFace { face_id: FaceId },
    /// Resolve a picked triangle index to its face.
    PickTriangle { triangle: usize },
    Measure { face_ids: Vec<FaceId> },

    // -- Features --
    CreateFeature {
        name: String,
        members: Vec<FeatureMember>,
    },
    DeleteFeature { name: String },
    RenameFeature { name: String, new_name: String },
    SetSubName {
        face_id: FaceId,
        #[serde(default)]
        sub_name: Option<String>,
    },

    // -- File --
    Export,
}

/// Responses from the engine to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineToUi {
    DocumentLoaded {
        info: LoadInfo,
        mesh: MeshBuffers,
        faces: Vec<FaceInfo>,
    },

    DocumentCleared,

    Faces { faces: Vec<FaceInfo> },

    Face { face: FaceInfo },

    /// `face_id` is `None` when the triangle index is out of range.
    Picked {
        triangle: usize,
        face_id: Option<FaceId>,
    },

    /// Lengths are in `unit`, the document's own length unit.
    Measured {
        measurement: Measurement,
        unit: String,
    },

    FeaturesChanged { features: Vec<Feature> },

    ExportReady {
        step_text: String,
        renamed: Vec<(FaceId, String)>,
        skipped: Vec<FaceId>,
    },

    Error { message: String },
}
