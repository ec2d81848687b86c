//! Typed wrapper over JSON-RPC error codes
//!
//! [`crate::schema::jsonrpc::JsonRpcError`] already carries the numeric wire
//! code; this module exists so call sites can match on a named constant
//! instead of a bare `i64` literal when deciding how to react to an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::jsonrpc::JsonRpcError;

/// A named JSON-RPC / ACP error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    pub const PARSE_ERROR: ErrorCode = ErrorCode(JsonRpcError::PARSE_ERROR);
    pub const INVALID_REQUEST: ErrorCode = ErrorCode(JsonRpcError::INVALID_REQUEST);
    pub const METHOD_NOT_FOUND: ErrorCode = ErrorCode(JsonRpcError::METHOD_NOT_FOUND);
    pub const INVALID_PARAMS: ErrorCode = ErrorCode(JsonRpcError::INVALID_PARAMS);
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(JsonRpcError::INTERNAL_ERROR);

    pub const CONCURRENT_PROMPT: ErrorCode = ErrorCode(JsonRpcError::CONCURRENT_PROMPT);
    pub const CAPABILITY_NOT_SUPPORTED: ErrorCode =
        ErrorCode(JsonRpcError::CAPABILITY_NOT_SUPPORTED);
    pub const SESSION_NOT_FOUND: ErrorCode = ErrorCode(JsonRpcError::SESSION_NOT_FOUND);
    pub const NOT_INITIALIZED: ErrorCode = ErrorCode(JsonRpcError::NOT_INITIALIZED);
    pub const AUTH_REQUIRED: ErrorCode = ErrorCode(JsonRpcError::AUTH_REQUIRED);
    pub const PERMISSION_DENIED: ErrorCode = ErrorCode(JsonRpcError::PERMISSION_DENIED);

    /// True for the ACP-specific range (-32000 to -32005), as opposed to
    /// the standard JSON-RPC reserved range.
    pub fn is_acp_specific(&self) -> bool {
        (-32005..=-32000).contains(&self.0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ErrorCode {
    fn from(value: i64) -> Self {
        ErrorCode(value)
    }
}

impl From<ErrorCode> for i64 {
    fn from(value: ErrorCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_acp_specific_range() {
        assert!(ErrorCode::CONCURRENT_PROMPT.is_acp_specific());
        assert!(ErrorCode::PERMISSION_DENIED.is_acp_specific());
        assert!(!ErrorCode::METHOD_NOT_FOUND.is_acp_specific());
    }
}
