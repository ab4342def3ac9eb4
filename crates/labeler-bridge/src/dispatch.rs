use brep_kernel::KernelBundle;
use crate::engine_state::{BridgeError, EngineState};
use crate::messages::{EngineToUi, UiToEngine};

/// Dispatch a UI message to the engine and return a response.
///
/// Errors never escape: they come back as `EngineToUi::Error`.
pub fn dispatch(state: &mut EngineState, msg: UiToEngine, kb: &mut dyn KernelBundle) -> EngineToUi {
    match handle_message(state, msg, kb) {
        Ok(response) => response,
        Err(e) => EngineToUi::Error {
            message: e.to_string(),
        },
    }
}

pub fn handle_message(
    state: &mut EngineState,
    msg: UiToEngine,
    kb: &mut dyn KernelBundle,
) -> Result<EngineToUi, BridgeError> {
    match msg {
        // -- Document --
        UiToEngine::LoadStep { step_text } => {
            let info = state.load(&step_text, kb)?;
            let session = state.session()?;
            Ok(EngineToUi::DocumentLoaded {
                info,
                mesh: session.mesh().clone(),
                faces: session.faces().to_vec(),
            })
        }

        UiToEngine::ClearDocument => {
            state.clear(kb);
            Ok(EngineToUi::DocumentCleared)
        }

        // -- Faces --
        UiToEngine::QueryFaces => Ok(EngineToUi::Faces {
            faces: state.session()?.faces().to_vec(),
        }),

        UiToEngine::QueryFace { face_id } => {
            let face = state
                .session()?
                .face(face_id)
                .cloned()
                .ok_or(BridgeError::UnknownFace { face_id })?;
            Ok(EngineToUi::Face { face })
        }

        UiToEngine::PickTriangle { triangle } => Ok(EngineToUi::Picked {
            triangle,
            face_id: state.session()?.face_for_triangle(triangle),
        }),

        UiToEngine::Measure { face_ids } => {
            let session = state.session()?;
            Ok(EngineToUi::Measured {
                measurement: session.measure(&face_ids),
                unit: session.units().unit.symbol().to_string(),
            })
        }

        // -- Features --
        UiToEngine::CreateFeature { name, members } => {
            state.session_mut()?.create_feature(&name, members)?;
            features_changed(state)
        }

        UiToEngine::DeleteFeature { name } => {
            state.session_mut()?.delete_feature(&name)?;
            features_changed(state)
        }

        UiToEngine::RenameFeature { name, new_name } => {
            state.session_mut()?.rename_feature(&name, &new_name)?;
            features_changed(state)
        }

        UiToEngine::SetSubName { face_id, sub_name } => {
            state.session_mut()?.set_sub_name(face_id, sub_name)?;
            features_changed(state)
        }

        // -- File --
        UiToEngine::Export => {
            let outcome = state.session()?.export()?;
            Ok(EngineToUi::ExportReady {
                step_text: outcome.text,
                renamed: outcome.renamed,
                skipped: outcome.skipped,
            })
        }
    }
}

/// Build a FeaturesChanged response from the current session.
fn features_changed(state: &EngineState) -> Result<EngineToUi, BridgeError> {
    Ok(EngineToUi::FeaturesChanged {
        features: state.session()?.features().iter().cloned().collect(),
    })
}
