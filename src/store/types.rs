//! Wire types exchanged with the remote media store.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::{CONTEXT_MESSAGE_KEY, CONTEXT_NAME_KEY};
use crate::models::{ResourceType, Uploader};

/// A single asset as reported by the store, either from an upload response
/// or from a search page.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub public_id: String,
    pub secure_url: String,
    pub created_at: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub context: Option<Value>,
}

impl RawRecord {
    /// Looks up a context value. Search results carry the pairs at the top
    /// level of `context`, upload responses nest them under `custom`.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        let context = self.context.as_ref()?;
        context
            .get(key)
            .or_else(|| context.get("custom").and_then(|custom| custom.get(key)))
            .and_then(Value::as_str)
    }

    pub fn uploader(&self) -> Uploader {
        Uploader {
            name: self.context_value(CONTEXT_NAME_KEY).unwrap_or_default().to_string(),
            message: self
                .context_value(CONTEXT_MESSAGE_KEY)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub folder: String,
    pub resource_type: ResourceType,
    pub public_id: String,
    pub uploader: Uploader,
    pub file_name: String,
    pub content_type: String,
}

impl UploadOptions {
    /// Pipe-delimited `key=value` context string attached to the asset.
    pub fn context(&self) -> String {
        encode_context(&[
            (CONTEXT_NAME_KEY, &self.uploader.name),
            (CONTEXT_MESSAGE_KEY, &self.uploader.message),
        ])
    }
}

pub fn encode_context(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", escape_context(key), escape_context(value)))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_context(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '|' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub folder: String,
    pub resource_type: ResourceType,
    pub cursor: Option<String>,
    pub page_size: u32,
}

impl SearchQuery {
    /// An empty folder searches the whole account.
    pub fn expression(&self) -> String {
        let folder = self.folder.trim();
        if folder.is_empty() {
            return format!("resource_type:{}", self.resource_type);
        }
        format!("folder:{} AND resource_type:{}", folder, self.resource_type)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "resources", default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SearchPage {
    /// The cursor for the following page; an empty cursor counts as none.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}
