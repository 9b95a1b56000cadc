//! Query-time view over a flat entry set: existence, lookups, direct children and ancestry.
//! Built fresh from an `EntryStore::list` result for every operation; never cached.

use std::collections::BTreeMap;

use tracing::debug;

use super::paths::{ancestors_of, parent_of};
use super::types::Entry;

#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    by_path: BTreeMap<String, Entry>,
    children: BTreeMap<String, Vec<String>>,
}

impl TreeIndex {
    /// Index a flat entry sequence. When the input holds the same path twice the last one wins.
    pub fn new(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut by_path = BTreeMap::new();
        for e in entries {
            by_path.insert(e.path.clone(), e);
        }
        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // BTreeMap iteration keeps each child list in lexical path order
        for path in by_path.keys() {
            children.entry(parent_of(path).to_string()).or_default().push(path.clone());
        }
        debug!(target: "templatefs::index", "TreeIndex built: entries={} parents={}", by_path.len(), children.len());
        Self { by_path, children }
    }

    pub fn len(&self) -> usize { self.by_path.len() }

    pub fn is_empty(&self) -> bool { self.by_path.is_empty() }

    pub fn exists(&self, path: &str) -> bool { self.by_path.contains_key(path) }

    pub fn get(&self, path: &str) -> Option<&Entry> { self.by_path.get(path) }

    /// All entries, ordered by path.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> { self.by_path.values() }

    /// Direct children of `path` ("" for the root), by derived-parent match.
    pub fn children_of(&self, path: &str) -> Vec<&Entry> {
        self.children
            .get(path)
            .map(|kids| kids.iter().filter_map(|p| self.by_path.get(p)).collect())
            .unwrap_or_default()
    }

    /// Ancestor path strings of `path`, root-to-immediate-parent.
    pub fn ancestor_chain(&self, path: &str) -> Vec<String> { ancestors_of(path) }

    /// First materialized ancestor that is not a directory, if any.
    pub fn first_non_dir_ancestor(&self, path: &str) -> Option<&Entry> {
        self.ancestor_chain(path)
            .iter()
            .filter_map(|a| self.by_path.get(a))
            .find(|e| !e.is_dir())
    }

    /// Every entry strictly below `path`, in path order.
    pub fn descendants_of(&self, path: &str) -> Vec<&Entry> {
        if path.is_empty() { return self.by_path.values().collect(); }
        let prefix = format!("{}/", path);
        self.by_path
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v)
            .collect()
    }

    /// True when something (materialized or not) lives below `path`.
    pub fn has_descendants(&self, path: &str) -> bool {
        let prefix = format!("{}/", path);
        self.by_path.range(prefix.clone()..).next().map(|(k, _)| k.starts_with(&prefix)).unwrap_or(false)
    }

    /// Ancestors that appear in some entry's chain but have no entry of their own.
    pub fn implicit_dirs(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .by_path
            .keys()
            .flat_map(|p| ancestors_of(p))
            .filter(|a| !self.by_path.contains_key(a))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
