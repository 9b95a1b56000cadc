//!
//! templatefs storage module
//! -------------------------
//! Persistence contract for tree entries. An `EntryStore` keeps one flat, path-keyed entry set
//! per `Scope` (template id + version id) and knows nothing about hierarchy; all structural
//! rules live in `tree::ops`, which hands the store a `WriteBatch` of preconditions plus
//! mutations. The store's only obligation beyond durability is to evaluate a batch's
//! preconditions and apply its mutations as one atomic step.
//!
//! Two implementations ship with the crate:
//! - `MemoryEntryStore`: process-local maps behind a `parking_lot::RwLock`.
//! - `SnapshotEntryStore`: one bincode snapshot file per scope, replaced via temp-file rename.

use crate::error::StoreError;
use crate::tree::types::{Entry, Scope};

mod batch;
pub mod memory;
pub mod snapshot;

pub use batch::{apply_batch, CommitOutcome, Mutation, Precondition, WriteBatch};
pub use memory::MemoryEntryStore;
pub use snapshot::SnapshotEntryStore;

/// Durable key-value persistence of entries, keyed by `(scope, path)`.
pub trait EntryStore: Send + Sync {
    /// Every entry of a scope, ordered by path. An unknown scope is empty, not an error.
    fn list(&self, scope: &Scope) -> Result<Vec<Entry>, StoreError>;

    /// Evaluate `batch.preconditions` and, only if all hold, apply `batch.mutations`; atomically.
    fn commit(&self, scope: &Scope, batch: &WriteBatch) -> Result<CommitOutcome, StoreError>;

    /// Scopes that currently hold at least one entry.
    fn scopes(&self) -> Result<Vec<Scope>, StoreError>;

    fn get(&self, scope: &Scope, path: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.list(scope)?.into_iter().find(|e| e.path == path))
    }

    /// Unconditional upsert. Bypasses tree rules; callers are expected to go through `tree::ops`.
    fn put(&self, scope: &Scope, entry: Entry) -> Result<(), StoreError> {
        self.commit(scope, &WriteBatch::new().put(entry)).map(|_| ())
    }

    /// Remove one entry. Returns false when nothing was stored at `path`.
    fn delete(&self, scope: &Scope, path: &str) -> Result<bool, StoreError> {
        let batch = WriteBatch::new().require(Precondition::Present(path.to_string())).remove(path);
        Ok(self.commit(scope, &batch)?.is_applied())
    }
}

impl<S: EntryStore + ?Sized> EntryStore for std::sync::Arc<S> {
    fn list(&self, scope: &Scope) -> Result<Vec<Entry>, StoreError> { (**self).list(scope) }
    fn commit(&self, scope: &Scope, batch: &WriteBatch) -> Result<CommitOutcome, StoreError> { (**self).commit(scope, batch) }
    fn scopes(&self) -> Result<Vec<Scope>, StoreError> { (**self).scopes() }
    fn get(&self, scope: &Scope, path: &str) -> Result<Option<Entry>, StoreError> { (**self).get(scope, path) }
}

#[cfg(test)]
mod storage_tests;
