//!
//! templatefs tree module
//! ----------------------
//! Hierarchical view over a flat, path-keyed entry set. Directories are either materialized
//! `Dir` entries or implicit (synthesized from a descendant's path). Nothing here holds state
//! between calls: each operation reads the scope, validates, and commits one atomic batch.

pub mod builder;
pub mod config;
pub mod index;
pub mod materialize;
pub mod ops;
pub mod paths;
pub mod types;
pub mod wire;

pub use builder::{build_tree, flatten_tree, TreeNode};
pub use config::{DeletePolicy, EffectiveConfig, GlobalTreeConfig, RenamePolicy, ScopeTreeConfig};
pub use index::TreeIndex;
pub use materialize::{import_dir, materialize, ImportReport, MaterializeReport};
pub use ops::{create_entry, delete_entry, get_entry, list_tree, load_index, rename_entry, update_entry_content};
pub use paths::validate_path;
pub use types::{Entry, EntryKind, Scope};
pub use wire::{CreateEntryRequest, EntryView, TreeNodeView, UpdateEntryRequest};
