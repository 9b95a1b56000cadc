pub mod error;
pub mod storage;
pub mod tree;

pub use error::{StoreError, TreeError, TreeResult};
pub use storage::{EntryStore, MemoryEntryStore, SnapshotEntryStore};
pub use tree::{Entry, EntryKind, Scope};
