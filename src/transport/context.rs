//! Per-message metadata carried alongside each delivery to a [`super::MessageHandler`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Context delivered with every inbound message: when it arrived and
/// whatever metadata the transport knows about its origin.
#[derive(Debug, Clone)]
pub struct MessageContext {
    remote_addr: Option<String>,
    timestamp: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

impl MessageContext {
    pub fn new() -> Self {
        Self {
            remote_addr: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for MessageContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_compose() {
        let ctx = MessageContext::new()
            .with_remote_addr("stdio")
            .with_metadata("pid", "123");
        assert_eq!(ctx.remote_addr(), Some("stdio"));
        assert_eq!(ctx.get_metadata("pid"), Some("123"));
    }
}
