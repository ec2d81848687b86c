//! Crate-level error type unifying the per-layer error enums.

use thiserror::Error;

use crate::dispatcher::DispatchError;
use crate::session::CorrelationError;
use crate::transport::TransportError;
use crate::turn::TurnConflict;

/// Top-level error for anything that can go wrong running an ACP
/// connection, layered over the more specific error each subsystem
/// produces.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("a prompt is already active for session '{}'", .0.session_id)]
    TurnConflict(#[from] TurnConflict),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
