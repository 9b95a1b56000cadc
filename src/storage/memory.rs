use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::tree::types::{Entry, Scope};

use super::batch::{apply_batch, CommitOutcome, WriteBatch};
use super::EntryStore;

/// A process-local entry store. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryEntryStore {
    scopes: Arc<RwLock<HashMap<Scope, BTreeMap<String, Entry>>>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self { Self::default() }

    /// Seed a scope with entries as-is (no tree rules applied).
    pub fn with_entries(scope: Scope, entries: impl IntoIterator<Item = Entry>) -> Self {
        let s = Self::new();
        s.scopes.write().insert(scope, entries.into_iter().map(|e| (e.path.clone(), e)).collect());
        s
    }

    pub fn len(&self, scope: &Scope) -> usize { self.scopes.read().get(scope).map(|m| m.len()).unwrap_or(0) }
}

impl EntryStore for MemoryEntryStore {
    fn list(&self, scope: &Scope) -> Result<Vec<Entry>, StoreError> {
        Ok(self.scopes.read().get(scope).map(|m| m.values().cloned().collect()).unwrap_or_default())
    }

    fn get(&self, scope: &Scope, path: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.scopes.read().get(scope).and_then(|m| m.get(path).cloned()))
    }

    fn commit(&self, scope: &Scope, batch: &WriteBatch) -> Result<CommitOutcome, StoreError> {
        let mut w = self.scopes.write();
        let entries = w.entry(*scope).or_default();
        let out = apply_batch(entries, batch);
        if entries.is_empty() { w.remove(scope); }
        Ok(out)
    }

    fn scopes(&self) -> Result<Vec<Scope>, StoreError> {
        let mut out: Vec<Scope> = self.scopes.read().keys().copied().collect();
        out.sort();
        Ok(out)
    }
}
