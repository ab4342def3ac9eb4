//! JSON message bridge between a labeling UI and the face engine.
//!
//! A transport (HTTP handler, web worker, stdin loop) owns an `EngineState`
//! and a kernel, and feeds each incoming message through `process_message`.

pub mod dispatch;
pub mod engine_state;
pub mod messages;

pub use dispatch::{dispatch, handle_message};
pub use engine_state::{BridgeError, EngineState};
pub use messages::{EngineToUi, UiToEngine};

use brep_kernel::KernelBundle;

/// Process a JSON `UiToEngine` message and return a JSON `EngineToUi` response.
pub fn process_message(state: &mut EngineState, json_input: &str, kb: &mut dyn KernelBundle) -> String {
    let response = match serde_json::from_str::<UiToEngine>(json_input) {
        Ok(msg) => dispatch(state, msg, kb),
        Err(e) => EngineToUi::Error {
            message: format!("failed to parse message: {e}"),
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|e| {
        let error = BridgeError::Serialization {
            reason: e.to_string(),
        };
        format!(
            r#"{{"type":"error","message":{}}}"#,
            serde_json::Value::String(error.to_string())
        )
    })
}
