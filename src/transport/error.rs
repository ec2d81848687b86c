//! Transport-level error types, distinct from JSON-RPC protocol errors.

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection error: {message}")]
    Connection { message: String },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("transport is closed")]
    Closed,

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl TransportError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_displays_message() {
        let err = TransportError::connection("refused");
        assert!(format!("{err}").contains("refused"));
    }
}
