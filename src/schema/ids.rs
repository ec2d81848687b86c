//! Session and terminal identifiers
//!
//! Both are newtypes over `Arc<str>` rather than `String`: handler
//! invocations clone them freely (dispatcher lookups, turn-controller
//! slots, correlation bookkeeping) and an `Arc<str>` clone is a refcount
//! bump instead of a heap allocation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

macro_rules! arc_str_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value.into())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.into())
            }
        }
    };
}

arc_str_id!(SessionId);
arc_str_id!(TerminalId);
arc_str_id!(SessionModeId);
arc_str_id!(ModelId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheap_clone_shares_allocation() {
        let id = SessionId::new("sess-1");
        let cloned = id.clone();
        assert_eq!(id, cloned);
        assert_eq!(id.as_str(), "sess-1");
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = TerminalId::new("term-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""term-1""#);
    }
}
