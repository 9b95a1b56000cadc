//! JSON shapes exchanged with hosts (REST handlers, the CLI).
//! File content travels as standard base64; directories never carry a `content` value.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

use super::builder::TreeNode;
use super::types::{Entry, EntryKind};

fn b64() -> base64::engine::GeneralPurpose { base64::engine::general_purpose::STANDARD }

pub fn encode_content(bytes: &[u8]) -> String { b64().encode(bytes) }

pub fn decode_content(s: &str) -> TreeResult<Vec<u8>> {
    b64().decode(s.trim()).map_err(|e| TreeError::InvalidContent(format!("content is not valid base64: {}", e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
}

impl From<&Entry> for EntryView {
    fn from(e: &Entry) -> Self {
        Self {
            name: e.name().to_string(),
            path: e.path.clone(),
            kind: e.kind,
            content: e.is_file().then(|| encode_content(&e.content)),
            etag: e.etag.clone(),
        }
    }
}

/// Listing node. Directories always serialize `children` (possibly empty), files never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNodeView {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub implicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNodeView>>,
}

impl From<&TreeNode> for TreeNodeView {
    fn from(n: &TreeNode) -> Self {
        Self {
            name: n.name.clone(),
            path: n.path.clone(),
            kind: n.kind,
            implicit: n.implicit,
            children: n.is_dir().then(|| n.children.iter().map(TreeNodeView::from).collect()),
        }
    }
}

pub fn forest_view(forest: &[TreeNode]) -> Vec<TreeNodeView> { forest.iter().map(TreeNodeView::from).collect() }

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateEntryRequest {
    /// Resolve kind and decoded content. Content sent with a directory is ignored.
    pub fn decode(&self) -> TreeResult<(EntryKind, Vec<u8>)> {
        let kind = EntryKind::parse(&self.kind)
            .ok_or_else(|| TreeError::InvalidContent(format!("unknown entry type '{}'", self.kind)))?;
        let content = match (&self.content, kind) {
            (Some(c), EntryKind::File) => decode_content(c)?,
            _ => Vec::new(),
        };
        Ok((kind, content))
    }
}

/// Body of a rename/move. `path` is the destination; a missing `content` keeps the current one.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEntryRequest {
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl UpdateEntryRequest {
    pub fn decode(&self) -> TreeResult<Option<Vec<u8>>> {
        self.content.as_deref().map(decode_content).transpose()
    }
}
