//! JSON-RPC 2.0 message envelope with structural discrimination
//!
//! This module implements the three JSON-RPC 2.0 message shapes used by the
//! Agent Client Protocol: requests, responses, and notifications. Unlike a
//! tagged union with an explicit discriminator field, JSON-RPC distinguishes
//! these structurally: `method` + `id` is a request, `method` alone is a
//! notification, and `result`/`error` is a response. [`Message`] performs
//! that classification once, centrally, on decode.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait for JSON-RPC payload serialization and deserialization
///
/// Any type that implements `Serialize + Deserialize` automatically gets
/// the default implementations for JSON conversion, eliminating repeated
/// boilerplate across the three message shapes.
///
/// # Examples
///
/// ```rust
/// use acp_core::schema::{JsonRpcPayload, JsonRpcRequest, RequestId};
///
/// let request = JsonRpcRequest::new("initialize", None, RequestId::new_number(1));
/// let json = request.to_json().unwrap();
/// let parsed = JsonRpcRequest::from_json(&json).unwrap();
/// assert_eq!(request, parsed);
/// ```
pub trait JsonRpcPayload: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Serialize this payload to a JSON string.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a payload from a JSON string.
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this payload to JSON bytes, suitable for handing directly
    /// to a transport without an intermediate `String` allocation.
    fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize a payload from JSON bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Request identifier, either a string or a number, per JSON-RPC 2.0.
///
/// ACP endpoints choose their own IDs for outbound requests; they must be
/// unique among that sender's in-flight requests (spec invariant 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String-based request identifier.
    String(String),
    /// Numeric request identifier.
    Number(i64),
}

impl RequestId {
    /// Create a new string-based request ID.
    pub fn new_string(id: impl Into<String>) -> Self {
        RequestId::String(id.into())
    }

    /// Create a new numeric request ID.
    pub fn new_number(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A JSON-RPC 2.0 request: invokes a method and expects a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

impl JsonRpcPayload for JsonRpcRequest {}

/// A JSON-RPC 2.0 response: exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    pub fn error(error: JsonRpcError, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

impl JsonRpcPayload for JsonRpcResponse {}

/// A JSON-RPC 2.0 notification: fire-and-forget, never has an `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcPayload for JsonRpcNotification {}

/// Standard and ACP-specific JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub const CONCURRENT_PROMPT: i64 = -32000;
    pub const CAPABILITY_NOT_SUPPORTED: i64 = -32001;
    pub const SESSION_NOT_FOUND: i64 = -32002;
    pub const NOT_INITIALIZED: i64 = -32003;
    pub const AUTH_REQUIRED: i64 = -32004;
    pub const PERMISSION_DENIED: i64 = -32005;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i64, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error() -> Self {
        Self::new(Self::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, details)
    }

    pub fn method_not_found(method: &str, hint: Option<&str>) -> Self {
        let message = match hint {
            Some(hint) => format!("Method '{method}' not found: {hint}"),
            None => format!("Method '{method}' not found"),
        };
        Self::new(Self::METHOD_NOT_FOUND, message)
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, details)
    }

    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, details)
    }

    pub fn concurrent_prompt(session_id: &str) -> Self {
        Self::new(
            Self::CONCURRENT_PROMPT,
            format!("already an active prompt execution for session '{session_id}'"),
        )
    }

    pub fn capability_not_supported(capability: &str) -> Self {
        Self::new(
            Self::CAPABILITY_NOT_SUPPORTED,
            format!("capability '{capability}' was not negotiated"),
        )
    }

    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(
            Self::SESSION_NOT_FOUND,
            format!("session '{session_id}' not found"),
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            Self::NOT_INITIALIZED,
            "the connection has not completed initialize",
        )
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// A decoded JSON-RPC message, classified structurally rather than by a
/// discriminator field.
///
/// Discrimination rule (spec §3): `method` + `id` present ⇒ [`Message::Request`];
/// `method` without `id` ⇒ [`Message::Notification`]; `result` or `error`
/// present ⇒ [`Message::Response`]. Any other shape is a decode error.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

/// Deserialization target with every field optional; used only to classify
/// the message before producing the typed [`Message`] variant.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Error returned when a byte sequence cannot be classified into a
/// [`Message`] variant, either because the JSON itself is malformed or
/// because the decoded shape matches none of the three message kinds.
#[derive(Debug, thiserror::Error)]
pub enum MessageDecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "message has neither method, result, nor error fields; cannot classify as request, \
         response, or notification"
    )]
    Unclassifiable,
}

impl Message {
    /// Decode a message from raw bytes, classifying it per spec §3.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageDecodeError> {
        let raw: RawMessage = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Decode a message from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, MessageDecodeError> {
        let raw: RawMessage = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawMessage) -> Result<Self, MessageDecodeError> {
        if raw.result.is_some() || raw.error.is_some() {
            return Ok(Message::Response(JsonRpcResponse {
                jsonrpc: raw.jsonrpc.unwrap_or_else(|| "2.0".to_string()),
                result: raw.result,
                error: raw.error,
                id: raw.id,
            }));
        }
        match (raw.method, raw.id) {
            (Some(method), Some(id)) => Ok(Message::Request(JsonRpcRequest {
                jsonrpc: raw.jsonrpc.unwrap_or_else(|| "2.0".to_string()),
                method,
                params: raw.params,
                id,
            })),
            (Some(method), None) => Ok(Message::Notification(JsonRpcNotification {
                jsonrpc: raw.jsonrpc.unwrap_or_else(|| "2.0".to_string()),
                method,
                params: raw.params,
            })),
            (None, _) => Err(MessageDecodeError::Unclassifiable),
        }
    }

    /// Serialize this message back to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Message::Request(r) => serde_json::to_vec(r),
            Message::Response(r) => serde_json::to_vec(r),
            Message::Notification(n) => serde_json::to_vec(n),
        }
    }
}

impl From<JsonRpcRequest> for Message {
    fn from(value: JsonRpcRequest) -> Self {
        Message::Request(value)
    }
}

impl From<JsonRpcResponse> for Message {
    fn from(value: JsonRpcResponse) -> Self {
        Message::Response(value)
    }
}

impl From<JsonRpcNotification> for Message {
    fn from(value: JsonRpcNotification) -> Self {
        Message::Notification(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_request() {
        let bytes = br#"{"jsonrpc":"2.0","method":"initialize","id":1}"#;
        match Message::from_bytes(bytes).unwrap() {
            Message::Request(r) => {
                assert_eq!(r.method, "initialize");
                assert_eq!(r.id, RequestId::Number(1));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn classifies_notification() {
        let bytes = br#"{"jsonrpc":"2.0","method":"session/cancel","params":{"sessionId":"s1"}}"#;
        match Message::from_bytes(bytes).unwrap() {
            Message::Notification(n) => assert_eq!(n.method, "session/cancel"),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn classifies_success_response() {
        let bytes = br#"{"jsonrpc":"2.0","id":"c-0","result":{"ok":true}}"#;
        match Message::from_bytes(bytes).unwrap() {
            Message::Response(r) => {
                assert!(r.result.is_some());
                assert!(r.error.is_none());
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn classifies_error_response() {
        let bytes = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#;
        match Message::from_bytes(bytes).unwrap() {
            Message::Response(r) => assert_eq!(r.error.unwrap().code, -32601),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unclassifiable_shape() {
        let bytes = br#"{"jsonrpc":"2.0"}"#;
        assert!(matches!(
            Message::from_bytes(bytes),
            Err(MessageDecodeError::Unclassifiable)
        ));
    }

    #[test]
    fn round_trips_request() {
        let request = JsonRpcRequest::new(
            "session/prompt",
            Some(json!({"sessionId": "s1"})),
            RequestId::new_string("c-1"),
        );
        let message: Message = request.clone().into();
        let bytes = message.to_bytes().unwrap();
        match Message::from_bytes(&bytes).unwrap() {
            Message::Request(r) => assert_eq!(r, request),
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn request_id_wire_format() {
        assert_eq!(
            serde_json::to_string(&RequestId::new_string("a")).unwrap(),
            r#""a""#
        );
        assert_eq!(
            serde_json::to_string(&RequestId::new_number(7)).unwrap(),
            "7"
        );
    }
}
