//! Unified error model for the content tree.
//! Every public operation returns `TreeResult<T>`; expected outcomes (bad path, conflict,
//! wrong parent type, missing target) are distinct variants so callers can handle them inline,
//! while backend failures are carried opaquely in `Store`.

use thiserror::Error;

/// Opaque failure reported by an `EntryStore` backend. Never retried by the tree logic.
#[derive(Debug, Error)]
#[error("entry store failure: {source}")]
pub struct StoreError {
    #[source]
    source: anyhow::Error,
}

impl StoreError {
    pub fn new<E: Into<anyhow::Error>>(err: E) -> Self { Self { source: err.into() } }

    pub fn msg<S: Into<String>>(msg: S) -> Self { Self { source: anyhow::anyhow!(msg.into()) } }

    pub fn inner(&self) -> &anyhow::Error { &self.source }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self { Self::new(err) }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self { Self::new(err) }
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("entry already exists at '{path}'")]
    Conflict { path: String, reason: Option<String> },
    #[error("parent entry '{parent}' of '{path}' is not a directory")]
    ParentNotDirectory { path: String, parent: String },
    #[error("entry not found: '{path}'")]
    NotFound { path: String },
    #[error("entry '{path}' is a directory and cannot hold content")]
    NotAFile { path: String },
    #[error("content for '{path}' is {size} bytes, limit is {limit}")]
    ContentTooLarge { path: String, size: usize, limit: usize },
    #[error("invalid content: {0}")]
    InvalidContent(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("host filesystem error at '{path}': {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

pub type TreeResult<T> = Result<T, TreeError>;

impl TreeError {
    pub fn invalid_path<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        TreeError::InvalidPath { path: path.into(), reason: reason.into() }
    }
    pub fn conflict<P: Into<String>>(path: P) -> Self { TreeError::Conflict { path: path.into(), reason: None } }
    pub fn conflict_because<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        TreeError::Conflict { path: path.into(), reason: Some(reason.into()) }
    }
    pub fn not_found<P: Into<String>>(path: P) -> Self { TreeError::NotFound { path: path.into() } }
    pub fn parent_not_directory<P: Into<String>, Q: Into<String>>(path: P, parent: Q) -> Self {
        TreeError::ParentNotDirectory { path: path.into(), parent: parent.into() }
    }
    pub fn io<P: Into<String>>(path: P, source: std::io::Error) -> Self { TreeError::Io { path: path.into(), source } }

    /// Stable machine-readable code, suitable for API payloads.
    pub fn code_str(&self) -> &'static str {
        match self {
            TreeError::InvalidPath { .. } => "invalid_path",
            TreeError::Conflict { .. } => "conflict",
            TreeError::ParentNotDirectory { .. } => "parent_not_directory",
            TreeError::NotFound { .. } => "not_found",
            TreeError::NotAFile { .. } => "not_a_file",
            TreeError::ContentTooLarge { .. } => "content_too_large",
            TreeError::InvalidContent(_) => "invalid_content",
            TreeError::Store(_) => "store_error",
            TreeError::Io { .. } => "io_error",
        }
    }

    /// Map to HTTP status code for hosts that expose the tree over REST.
    pub fn http_status(&self) -> u16 {
        match self {
            TreeError::InvalidPath { .. } => 400,
            TreeError::Conflict { .. } => 409,
            TreeError::ParentNotDirectory { .. } => 400,
            TreeError::NotFound { .. } => 404,
            TreeError::NotAFile { .. } => 400,
            TreeError::ContentTooLarge { .. } => 413,
            TreeError::InvalidContent(_) => 400,
            TreeError::Store(_) => 503,
            TreeError::Io { .. } => 500,
        }
    }

    /// Expected outcomes the caller should handle inline (re-prompt, show message).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TreeError::Store(_) | TreeError::Io { .. })
    }
}
