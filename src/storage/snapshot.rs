//! File-backed entry store: one bincode snapshot per scope at
//! `<root>/<template_id>/<version_id>/entries.bin`.
//! Every commit rewrites the scope snapshot through a temp file + rename, so readers only ever
//! see a complete previous or complete next state. A process-wide mutex serializes commits;
//! it does not coordinate separate processes sharing the same root.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::tree::types::{Entry, Scope};

use super::batch::{apply_batch, CommitOutcome, WriteBatch};
use super::EntryStore;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_FILE: &str = "entries.bin";

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    created_at: i64,
    entries: Vec<Entry>,
}

pub struct SnapshotEntryStore {
    root: PathBuf,
    commit_lock: Mutex<()>,
}

impl SnapshotEntryStore {
    /// Create a store rooted at the given directory (created if missing).
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, commit_lock: Mutex::new(()) })
    }

    pub fn root_path(&self) -> &Path { &self.root }

    fn scope_dir(&self, scope: &Scope) -> PathBuf {
        self.root.join(scope.template_id.to_string()).join(scope.version_id.to_string())
    }

    fn snapshot_path(&self, scope: &Scope) -> PathBuf { self.scope_dir(scope).join(SNAPSHOT_FILE) }

    fn load(&self, scope: &Scope) -> Result<BTreeMap<String, Entry>, StoreError> {
        let bytes = match fs::read(self.snapshot_path(scope)) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        let snap: Snapshot = bincode::deserialize(&bytes)?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(StoreError::msg(format!("unsupported snapshot version {} for {}", snap.version, scope)));
        }
        Ok(snap.entries.into_iter().map(|e| (e.path.clone(), e)).collect())
    }

    fn save(&self, scope: &Scope, entries: &BTreeMap<String, Entry>) -> Result<(), StoreError> {
        let path = self.snapshot_path(scope);
        if entries.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }
        fs::create_dir_all(self.scope_dir(scope))?;
        let snap = Snapshot { version: SNAPSHOT_VERSION, created_at: Utc::now().timestamp(), entries: entries.values().cloned().collect() };
        let bytes = bincode::serialize(&snap)?;
        let tmp = path.with_extension("bin.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
        }
        fs::rename(tmp, &path)?;
        debug!(target: "templatefs::storage", "snapshot written: {} entries={} path={}", scope, entries.len(), path.display());
        Ok(())
    }
}

impl EntryStore for SnapshotEntryStore {
    fn list(&self, scope: &Scope) -> Result<Vec<Entry>, StoreError> {
        Ok(self.load(scope)?.into_values().collect())
    }

    fn get(&self, scope: &Scope, path: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.load(scope)?.remove(path))
    }

    fn commit(&self, scope: &Scope, batch: &WriteBatch) -> Result<CommitOutcome, StoreError> {
        let _guard = self.commit_lock.lock();
        let mut entries = self.load(scope)?;
        let out = apply_batch(&mut entries, batch);
        if out.is_applied() && !batch.is_empty() {
            self.save(scope, &entries)?;
        }
        Ok(out)
    }

    fn scopes(&self) -> Result<Vec<Scope>, StoreError> {
        let mut out = Vec::new();
        for t in fs::read_dir(&self.root)? {
            let t = t?;
            let Some(template_id) = t.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) else { continue };
            if !t.file_type()?.is_dir() { continue; }
            for v in fs::read_dir(t.path())? {
                let v = v?;
                let Some(version_id) = v.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) else { continue };
                if v.path().join(SNAPSHOT_FILE).is_file() {
                    out.push(Scope::new(template_id, version_id));
                }
            }
        }
        out.sort();
        Ok(out)
    }
}
