use brep_kernel::KernelBundle;
use face_engine::{EngineConfig, ExportError, FeatureError, LabelSession, LoadError, LoadInfo};
use label_types::FaceId;
use tracing::info;

/// Bridge-side state: the engine configuration and the active document.
#[derive(Debug, Default)]
pub struct EngineState {
    pub config: EngineConfig,
    session: Option<LabelSession>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn session(&self) -> Result<&LabelSession, BridgeError> {
        self.session.as_ref().ok_or(BridgeError::NoDocument)
    }

    pub fn session_mut(&mut self) -> Result<&mut LabelSession, BridgeError> {
        self.session.as_mut().ok_or(BridgeError::NoDocument)
    }

    pub fn has_document(&self) -> bool {
        self.session.is_some()
    }

    /// Load a document and make it current.
    ///
    /// The new session is built completely before the old one is dropped, so
    /// a failed load leaves the previous document untouched.
    pub fn load(
        &mut self,
        step_text: &str,
        kb: &mut dyn KernelBundle,
    ) -> Result<LoadInfo, BridgeError> {
        let (session, load_info) = LabelSession::load(kb, step_text, self.config)?;
        if let Some(previous) = self.session.replace(session) {
            info!(document = %previous.document_id(), "previous document replaced");
            previous.release(kb);
        }
        Ok(load_info)
    }

    /// Drop the current document, if any.
    pub fn clear(&mut self, kb: &mut dyn KernelBundle) {
        if let Some(previous) = self.session.take() {
            previous.release(kb);
        }
    }
}

/// Errors from the bridge layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("no document loaded")]
    NoDocument,

    #[error("face {face_id} does not exist")]
    UnknownFace { face_id: FaceId },

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}
