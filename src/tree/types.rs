//! Core data contracts for the content tree (entries persisted per scope).
//! Keep this module purely about types/serde and light helpers.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::paths::{name_of, parent_of};

/// Namespace owning one template version's entry set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub template_id: u64,
    pub version_id: u64,
}

impl Scope {
    pub fn new(template_id: u64, version_id: u64) -> Self { Self { template_id, version_id } }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template={} version={}", self.template_id, self.version_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self { EntryKind::File => "file", EntryKind::Dir => "dir" }
    }

    /// Parse the wire spelling ("file" / "dir").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(EntryKind::File),
            "dir" => Some(EntryKind::Dir),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A single file or directory record addressed by its normalized path.
/// Parent/child relationships are derived from `path`, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub content: Vec<u8>,
    pub etag: String,
    pub modified_at: i64,
}

impl Entry {
    /// Build an entry stamped with the current time. Directory content is always dropped.
    pub fn new(path: impl Into<String>, kind: EntryKind, content: Vec<u8>) -> Self {
        let content = if kind == EntryKind::Dir { Vec::new() } else { content };
        let etag = etag_for_entry(kind, &content);
        Self { path: path.into(), kind, content, etag, modified_at: Utc::now().timestamp() }
    }

    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(path, EntryKind::File, content.into())
    }

    pub fn dir(path: impl Into<String>) -> Self { Self::new(path, EntryKind::Dir, Vec::new()) }

    pub fn name(&self) -> &str { name_of(&self.path) }

    pub fn parent(&self) -> &str { parent_of(&self.path) }

    pub fn is_dir(&self) -> bool { self.kind == EntryKind::Dir }

    pub fn is_file(&self) -> bool { self.kind == EntryKind::File }

    /// Same entry at a different path; kind and content are preserved.
    pub fn moved_to(&self, path: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.path = path.into();
        next.modified_at = Utc::now().timestamp();
        next
    }

    /// Same entry with replaced content (ignored for directories).
    pub fn with_content(&self, content: Vec<u8>) -> Self { Self::new(self.path.clone(), self.kind, content) }
}

/// Stable ETag for an entry's kind and content using xxh3_64; fixed-width lowercase hex.
pub fn etag_for_entry(kind: EntryKind, content: &[u8]) -> String {
    let mut buf = Vec::with_capacity(content.len() + 1);
    buf.push(match kind { EntryKind::File => b'f', EntryKind::Dir => b'd' });
    buf.extend_from_slice(content);
    format!("{:016x}", xxh3_64(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entries_never_carry_content() {
        let d = Entry::new("src", EntryKind::Dir, b"ignored".to_vec());
        assert!(d.content.is_empty());
        assert!(d.is_dir());
        assert_eq!(d.etag, etag_for_entry(EntryKind::Dir, b""));
    }

    #[test]
    fn etag_tracks_content_and_kind() {
        let a = Entry::file("a.txt", "hello");
        let b = a.with_content(b"hello".to_vec());
        let c = a.with_content(b"world".to_vec());
        assert_eq!(a.etag, b.etag);
        assert_ne!(a.etag, c.etag);
        assert_eq!(a.etag.len(), 16);
        assert_ne!(etag_for_entry(EntryKind::File, b""), etag_for_entry(EntryKind::Dir, b""));
    }

    #[test]
    fn derived_name_and_parent() {
        let e = Entry::file("src/cmd/main.go", "package main");
        assert_eq!(e.name(), "main.go");
        assert_eq!(e.parent(), "src/cmd");
        let moved = e.moved_to("main.go");
        assert_eq!(moved.parent(), "");
        assert_eq!(moved.content, e.content);
        assert_eq!(moved.etag, e.etag);
    }

    #[test]
    fn kind_wire_spelling() {
        assert_eq!(serde_json::to_string(&EntryKind::Dir).unwrap(), "\"dir\"");
        assert_eq!(EntryKind::parse("file"), Some(EntryKind::File));
        assert_eq!(EntryKind::parse("folder"), None);
    }
}
