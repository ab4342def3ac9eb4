use brep_kernel::KernelError;
use label_types::FaceId;

/// Errors during document loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("the solid has no faces")]
    NoFaces,
}

/// Errors during named STEP export.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("no ADVANCED_FACE entities found in STEP text; nothing can be named")]
    NoAdvancedFaces,

    #[error("feature {feature:?} cannot be written: {source}")]
    InvalidName {
        feature: String,
        #[source]
        source: FeatureError,
    },

    #[error("name field of entity #{entity_id} is not where the correspondence table puts it")]
    StaleCorrespondence { entity_id: u64 },
}

/// Errors from feature bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("invalid identifier {name:?}: use letters, digits and underscores, not starting with a digit")]
    InvalidIdentifier { name: String },

    #[error("feature {name:?} already exists")]
    DuplicateName { name: String },

    #[error("face {face_id} already belongs to feature {owner:?}")]
    FaceAlreadyOwned { face_id: FaceId, owner: String },

    #[error("face {face_id} is listed twice")]
    RepeatedFace { face_id: FaceId },

    #[error("face {face_id} does not exist")]
    UnknownFace { face_id: FaceId },

    #[error("face {face_id} is not part of any feature")]
    Unassigned { face_id: FaceId },

    #[error("feature {name:?} does not exist")]
    UnknownFeature { name: String },

    #[error("a feature needs at least one face")]
    NoMembers,
}
