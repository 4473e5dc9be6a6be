//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript exception raised by a browser API
    #[error("JavaScript error in {context}: {message}")]
    JavaScript {
        /// Operation that raised the exception
        context: String,
        /// Exception message
        message: String,
    },

    /// A browser global (window, speechSynthesis, localStorage) is missing
    #[error("Browser API not available: {0}")]
    NotAvailable(String),

    /// A JS value had an unexpected type
    #[error("Unexpected JavaScript value: {0}")]
    UnexpectedType(String),

    /// Stored value could not be decoded
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl WasmError {
    /// Wrap a thrown JS value with the name of the failing operation.
    pub fn js(context: &str, value: JsValue) -> Self {
        WasmError::JavaScript {
            context: context.to_string(),
            message: js_message(&value),
        }
    }
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAvailable(what) => BridgeError::NotAvailable(what),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

/// Best-effort human-readable message for a thrown JS value.
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        message
    } else if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        let name: String = error.name().into();
        let message: String = error.message().into();
        format!("{name}: {message}")
    } else {
        format!("{value:?}")
    }
}
