//! Conditional write batches.
//! A batch carries the checks a mutation was validated against plus the writes themselves;
//! stores evaluate the checks and apply the writes as one atomic step, so a concurrent writer
//! that slipped in between the caller's read and its commit makes the commit fail instead of
//! corrupting the entry set.

use std::collections::BTreeMap;

use crate::tree::paths::is_descendant_of;
use crate::tree::types::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// No entry at this path.
    Absent(String),
    /// An entry exists at this path.
    Present(String),
    /// An entry exists at this path with exactly this etag.
    EtagMatches { path: String, etag: String },
    /// No entry at this path, or the entry is a directory.
    NotFile(String),
    /// Exactly `count` entries live strictly below this path.
    DescendantCount { path: String, count: usize },
}

impl Precondition {
    pub fn path(&self) -> &str {
        match self {
            Precondition::Absent(p) | Precondition::Present(p) | Precondition::NotFile(p) => p,
            Precondition::EtagMatches { path, .. } | Precondition::DescendantCount { path, .. } => path,
        }
    }

    /// Evaluate against one scope's entries (keyed by path).
    pub fn holds(&self, entries: &BTreeMap<String, Entry>) -> bool {
        match self {
            Precondition::Absent(p) => !entries.contains_key(p),
            Precondition::Present(p) => entries.contains_key(p),
            Precondition::EtagMatches { path, etag } => entries.get(path).map(|e| &e.etag == etag).unwrap_or(false),
            Precondition::NotFile(p) => entries.get(p).map(|e| e.is_dir()).unwrap_or(true),
            Precondition::DescendantCount { path, count } => {
                let prefix = format!("{}/", path);
                let n = entries
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| is_descendant_of(k, path))
                    .count();
                n == *count
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put(Entry),
    Remove(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub preconditions: Vec<Precondition>,
    pub mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self { Self::default() }

    pub fn require(mut self, p: Precondition) -> Self { self.preconditions.push(p); self }

    pub fn put(mut self, entry: Entry) -> Self { self.mutations.push(Mutation::Put(entry)); self }

    pub fn remove(mut self, path: impl Into<String>) -> Self { self.mutations.push(Mutation::Remove(path.into())); self }

    pub fn is_empty(&self) -> bool { self.mutations.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// The first precondition that did not hold; nothing was written.
    Rejected(Precondition),
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool { matches!(self, CommitOutcome::Applied) }
}

/// Check every precondition, then apply mutations in order. All-or-nothing on `entries`.
pub fn apply_batch(entries: &mut BTreeMap<String, Entry>, batch: &WriteBatch) -> CommitOutcome {
    if let Some(failed) = batch.preconditions.iter().find(|p| !p.holds(entries)) {
        return CommitOutcome::Rejected(failed.clone());
    }
    for m in &batch.mutations {
        match m {
            Mutation::Put(e) => { entries.insert(e.path.clone(), e.clone()); }
            Mutation::Remove(p) => { entries.remove(p); }
        }
    }
    CommitOutcome::Applied
}
