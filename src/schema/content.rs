//! Content blocks exchanged in prompts, tool calls, and session updates.

use serde::{Deserialize, Serialize};

/// Optional metadata describing who a content block is for and how stale it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<Role>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Who a piece of content is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A resource reference embedded by URI only, without its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

/// A resource embedded with its actual contents, text or binary.
///
/// The wire format distinguishes the two structurally: a `text` field means
/// text contents, a `blob` field means base64-encoded binary contents. There
/// is no separate discriminator, so decoding deduces the variant from which
/// field is present, same as [`super::jsonrpc::Message`] deduces request vs.
/// notification vs. response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedResource {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub contents: EmbeddedResourceContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddedResourceContents {
    Text { text: String },
    Blob { blob: String },
}

/// A single unit of content: text, an image, an audio clip, a resource
/// link, or an embedded resource. Tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    Image {
        data: String,
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    Audio {
        data: String,
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    ResourceLink {
        #[serde(flatten)]
        link: ResourceLink,
    },
    Resource {
        resource: EmbeddedResource,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            annotations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_round_trips() {
        let block = ContentBlock::text("hello");
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"hello"}"#);
        let parsed: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, block);
    }

    #[test]
    fn embedded_resource_deduces_text_vs_blob() {
        let text_json = r#"{"uri":"file:///a.txt","text":"hi"}"#;
        let parsed: EmbeddedResource = serde_json::from_str(text_json).unwrap();
        assert!(matches!(
            parsed.contents,
            EmbeddedResourceContents::Text { .. }
        ));

        let blob_json = r#"{"uri":"file:///a.png","blob":"AAAA"}"#;
        let parsed: EmbeddedResource = serde_json::from_str(blob_json).unwrap();
        assert!(matches!(
            parsed.contents,
            EmbeddedResourceContents::Blob { .. }
        ));
    }
}
