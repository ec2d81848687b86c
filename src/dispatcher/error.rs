//! Errors produced while routing an inbound message to a handler.

use thiserror::Error;

use crate::schema::JsonRpcError;

/// Failure modes of the dispatch pipeline, distinct from the JSON-RPC error
/// object eventually sent on the wire — this type carries the information
/// needed to *build* that error object, plus cases (duplicate registration)
/// that never reach the wire at all.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler registered for method '{method}'")]
    MethodNotFound { method: String },

    #[error("invalid params for method '{method}': {details}")]
    InvalidParams { method: String, details: String },

    #[error("handler for '{method}' failed: {details}")]
    HandlerFailed { method: String, details: String },

    #[error("a handler is already registered for method '{method}'")]
    DuplicateRegistration { method: String },
}

impl DispatchError {
    /// Render this error as the JSON-RPC error object the peer receives,
    /// including a per-method hint for missing handlers.
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            DispatchError::MethodNotFound { method } => {
                JsonRpcError::method_not_found(method, crate::schema::missing_handler_hint(method))
            }
            DispatchError::InvalidParams { details, .. } => {
                JsonRpcError::invalid_params(details.clone())
            }
            DispatchError::HandlerFailed { details, .. } => {
                JsonRpcError::internal_error(details.clone())
            }
            DispatchError::DuplicateRegistration { method } => {
                JsonRpcError::internal_error(format!("duplicate handler for '{method}'"))
            }
        }
    }
}
