//! Correlation error types.

use chrono::TimeDelta;
use thiserror::Error;

use crate::schema::{JsonRpcError, RequestId};

#[derive(Debug, Clone, Error)]
pub enum CorrelationError {
    #[error("request {id} timed out after {duration}")]
    Timeout { id: RequestId, duration: TimeDelta },

    #[error("request {id} not found (may have completed or been cancelled)")]
    RequestNotFound { id: RequestId },

    #[error("request {id} has already been completed")]
    AlreadyCompleted { id: RequestId },

    #[error("channel error for request {id}: {details}")]
    ChannelClosed { id: RequestId, details: String },

    #[error("internal correlation error: {message}")]
    Internal { message: String },

    #[error("request {id} was cancelled")]
    Cancelled { id: RequestId },

    /// The peer answered with a JSON-RPC error object rather than a result.
    #[error("request {id} failed: {error}")]
    Remote { id: RequestId, error: JsonRpcError },

    /// The peer's `result` didn't decode into the caller's expected type.
    #[error("request {id} returned an undecodable result: {details}")]
    ResultDecode { id: RequestId, details: String },

    /// The session has been closed; no new requests may be sent.
    #[error("session is closed")]
    SessionClosed,

    /// A facade method was called before `initialize` negotiated
    /// capabilities with the peer.
    #[error("the connection has not completed initialize")]
    NotInitialized,

    /// The peer never advertised the capability a facade method requires.
    #[error("capability '{capability}' was not negotiated")]
    CapabilityNotSupported { capability: String },
}

pub type CorrelationResult<T> = std::result::Result<T, CorrelationError>;
