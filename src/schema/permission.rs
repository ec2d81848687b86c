//! `session/request_permission` types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ids::SessionId;
use super::session_update::ToolCallUpdate;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionOptionId(pub Arc<str>);

impl std::fmt::Display for PermissionOptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOptionKind {
    AllowOnce,
    AllowAlways,
    RejectOnce,
    RejectAlways,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionOption {
    #[serde(rename = "optionId")]
    pub id: PermissionOptionId,
    pub name: String,
    pub kind: PermissionOptionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionRequest {
    pub session_id: SessionId,
    pub tool_call: ToolCallUpdate,
    pub options: Vec<PermissionOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionResponse {
    pub outcome: RequestPermissionOutcome,
}

/// The user's decision. A `session/cancel` MUST cause any pending permission
/// request for that turn to resolve as `Cancelled`, never left hanging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestPermissionOutcome {
    Cancelled,
    #[serde(rename_all = "camelCase")]
    Selected {
        option_id: PermissionOptionId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_outcome_is_bare_tag() {
        let json = serde_json::to_value(RequestPermissionOutcome::Cancelled).unwrap();
        assert_eq!(json["outcome"], "cancelled");
    }

    #[test]
    fn selected_outcome_carries_option_id() {
        let outcome = RequestPermissionOutcome::Selected {
            option_id: PermissionOptionId(Arc::from("allow-once")),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "selected");
        assert_eq!(json["optionId"], "allow-once");
    }
}
