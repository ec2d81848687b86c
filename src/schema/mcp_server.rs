//! MCP server configuration passed through `session/new`.
//!
//! An agent that wants to talk to MCP servers on behalf of a session is
//! told how to reach them by the client. Three transport kinds exist; the
//! stdio variant is the original shape and, uniquely, carries no `type`
//! discriminator on the wire — it is recognized by the absence of a `type`
//! field, while `http`/`sse` carry an explicit one. This mirrors how
//! [`super::jsonrpc::Message`] discriminates structurally instead of by a
//! single `#[serde(tag = ...)]` attribute.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioMcpServer {
    pub name: String,
    pub command: std::path::PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMcpServer {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<EnvVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SseMcpServer {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<EnvVariable>,
}

/// An MCP server configuration, one of three transport kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum McpServer {
    Http(HttpMcpServer),
    Sse(SseMcpServer),
    Stdio(StdioMcpServer),
}

/// Deserialization target wide enough to cover all three shapes; `r#type`
/// decides which one to build.
#[derive(Debug, Deserialize)]
struct RawMcpServer {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    name: String,
    #[serde(default)]
    command: Option<std::path::PathBuf>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: Vec<EnvVariable>,
    #[serde(default)]
    headers: Vec<EnvVariable>,
}

impl<'de> Deserialize<'de> for McpServer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawMcpServer::deserialize(deserializer)?;
        match raw.kind.as_deref() {
            Some("http") => Ok(McpServer::Http(HttpMcpServer {
                name: raw.name,
                url: raw.url.ok_or_else(|| {
                    serde::de::Error::missing_field("url")
                })?,
                headers: raw.headers,
            })),
            Some("sse") => Ok(McpServer::Sse(SseMcpServer {
                name: raw.name,
                url: raw.url.ok_or_else(|| {
                    serde::de::Error::missing_field("url")
                })?,
                headers: raw.headers,
            })),
            Some(other) => Err(serde::de::Error::unknown_variant(other, &["http", "sse"])),
            None => Ok(McpServer::Stdio(StdioMcpServer {
                name: raw.name,
                command: raw.command.ok_or_else(|| {
                    serde::de::Error::missing_field("command")
                })?,
                args: raw.args,
                env: raw.env,
            })),
        }
    }
}

impl Serialize for McpServer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            McpServer::Http(server) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("type", "http")?;
                map.serialize_entry("name", &server.name)?;
                map.serialize_entry("url", &server.url)?;
                if !server.headers.is_empty() {
                    map.serialize_entry("headers", &server.headers)?;
                }
                map.end()
            }
            McpServer::Sse(server) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("type", "sse")?;
                map.serialize_entry("name", &server.name)?;
                map.serialize_entry("url", &server.url)?;
                if !server.headers.is_empty() {
                    map.serialize_entry("headers", &server.headers)?;
                }
                map.end()
            }
            McpServer::Stdio(server) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("name", &server.name)?;
                map.serialize_entry("command", &server.command)?;
                if !server.args.is_empty() {
                    map.serialize_entry("args", &server.args)?;
                }
                if !server.env.is_empty() {
                    map.serialize_entry("env", &server.env)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_has_no_type_field() {
        let json = r#"{"name":"fs","command":"/usr/bin/mcp-fs","args":[],"env":[]}"#;
        let parsed: McpServer = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, McpServer::Stdio(_)));
    }

    #[test]
    fn http_is_tagged() {
        let json = r#"{"type":"http","name":"remote","url":"https://example.test","headers":[]}"#;
        let parsed: McpServer = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, McpServer::Http(_)));
    }

    #[test]
    fn sse_is_tagged() {
        let json = r#"{"type":"sse","name":"remote","url":"https://example.test"}"#;
        let parsed: McpServer = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, McpServer::Sse(_)));
    }

    #[test]
    fn unknown_type_errors() {
        let json = r#"{"type":"grpc","name":"remote","url":"https://example.test"}"#;
        assert!(serde_json::from_str::<McpServer>(json).is_err());
    }

    #[test]
    fn stdio_round_trips_without_type_key() {
        let server = McpServer::Stdio(StdioMcpServer {
            name: "fs".into(),
            command: "/bin/mcp".into(),
            args: vec![],
            env: vec![],
        });
        let json = serde_json::to_string(&server).unwrap();
        assert!(!json.contains("\"type\""));
    }
}
