use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// What deleting a directory with entries below it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Remove the directory and every descendant in one atomic batch.
    Cascade,
    /// Refuse with `Conflict` while anything lives below the directory.
    RejectNonEmpty,
}

/// What renaming/moving a directory with entries below it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Rebase every descendant path in the same atomic batch.
    Cascade,
    /// Refuse with `Conflict` while anything lives below the directory.
    RejectNonEmpty,
}

impl DeletePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Some(DeletePolicy::Cascade),
            "reject_non_empty" | "reject" => Some(DeletePolicy::RejectNonEmpty),
            _ => None,
        }
    }
}

impl RenamePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Some(RenamePolicy::Cascade),
            "reject_non_empty" | "reject" => Some(RenamePolicy::RejectNonEmpty),
            _ => None,
        }
    }
}

/// Tree settings applied to every scope unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalTreeConfig {
    pub delete_policy: DeletePolicy,
    pub rename_policy: RenamePolicy,
    /// Create missing ancestor directories as real `Dir` entries on create/move.
    pub materialize_parents: bool,
    /// Maximum path length in bytes (after NFC normalization)
    pub max_path_len: usize,
    /// Maximum file content size in bytes
    pub max_content_bytes: usize,
}

impl Default for GlobalTreeConfig {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Cascade,
            rename_policy: RenamePolicy::Cascade,
            materialize_parents: false,
            max_path_len: 4096,
            max_content_bytes: 8 * 1024 * 1024,
        }
    }
}

impl GlobalTreeConfig {
    /// Defaults overlaid with `TEMPLATEFS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = get("TEMPLATEFS_DELETE_POLICY") {
            cfg.delete_policy = DeletePolicy::parse(&v).ok_or_else(|| anyhow!("invalid TEMPLATEFS_DELETE_POLICY '{}'", v))?;
        }
        if let Some(v) = get("TEMPLATEFS_RENAME_POLICY") {
            cfg.rename_policy = RenamePolicy::parse(&v).ok_or_else(|| anyhow!("invalid TEMPLATEFS_RENAME_POLICY '{}'", v))?;
        }
        if let Some(v) = get("TEMPLATEFS_MATERIALIZE_PARENTS") {
            cfg.materialize_parents = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = get("TEMPLATEFS_MAX_PATH_LEN") {
            cfg.max_path_len = v.trim().parse().with_context(|| format!("invalid TEMPLATEFS_MAX_PATH_LEN '{}'", v))?;
        }
        if let Some(v) = get("TEMPLATEFS_MAX_CONTENT_BYTES") {
            cfg.max_content_bytes = v.trim().parse().with_context(|| format!("invalid TEMPLATEFS_MAX_CONTENT_BYTES '{}'", v))?;
        }
        Ok(cfg)
    }

    /// Load from a JSON file; a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| format!("invalid tree config {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}

/// Per-scope overrides. Unspecified values inherit from Global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ScopeTreeConfig {
    pub delete_policy: Option<DeletePolicy>,
    pub rename_policy: Option<RenamePolicy>,
    pub materialize_parents: Option<bool>,
    pub max_content_bytes: Option<usize>,
}

/// Fully resolved config used by tree operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveConfig {
    pub delete_policy: DeletePolicy,
    pub rename_policy: RenamePolicy,
    pub materialize_parents: bool,
    pub max_path_len: usize,
    pub max_content_bytes: usize,
}

impl EffectiveConfig {
    /// Build an effective config from Global + optional Scope override.
    pub fn from_layers(global: &GlobalTreeConfig, scope: Option<&ScopeTreeConfig>) -> Self {
        let mut eff = Self {
            delete_policy: global.delete_policy,
            rename_policy: global.rename_policy,
            materialize_parents: global.materialize_parents,
            max_path_len: global.max_path_len,
            max_content_bytes: global.max_content_bytes,
        };
        if let Some(ov) = scope {
            if let Some(p) = ov.delete_policy { eff.delete_policy = p; }
            if let Some(p) = ov.rename_policy { eff.rename_policy = p; }
            if let Some(m) = ov.materialize_parents { eff.materialize_parents = m; }
            if let Some(n) = ov.max_content_bytes { eff.max_content_bytes = n; }
        }
        eff
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self { Self::from_layers(&GlobalTreeConfig::default(), None) }
}

#[cfg(test)]
mod config_tests;
