//! Bridges between a scope and a host directory.
//! `materialize` writes the tree onto disk (implicit directories become real ones);
//! `import_dir` loads a host directory into an empty scope in a single batch.

use std::fs;
use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{TreeError, TreeResult};
use crate::storage::{CommitOutcome, EntryStore, Precondition, WriteBatch};

use super::config::EffectiveConfig;
use super::index::TreeIndex;
use super::paths::validate_path;
use super::types::{Entry, Scope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub root: String,
    pub dirs: usize,
    pub files: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub dirs: usize,
    pub files: usize,
    pub skipped: Vec<String>,
}

fn host_path(root: &Path, path: &str) -> PathBuf {
    path.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
}

fn abs_display(p: &Path) -> String {
    match p.absolutize() {
        Ok(abs) => abs.to_string_lossy().to_string(),
        Err(_) => p.to_string_lossy().to_string(),
    }
}

/// Write every entry of `scope` under `dest`. Existing host files are overwritten.
pub fn materialize<S: EntryStore + ?Sized>(store: &S, scope: &Scope, dest: &Path) -> TreeResult<MaterializeReport> {
    let index = TreeIndex::new(store.list(scope)?);
    let mut dirs: Vec<String> = index.implicit_dirs();
    dirs.extend(index.entries().filter(|e| e.is_dir()).map(|e| e.path.clone()));
    dirs.sort();

    let mut report = MaterializeReport { root: abs_display(dest), ..Default::default() };
    fs::create_dir_all(dest).map_err(|e| TreeError::io(dest.to_string_lossy(), e))?;
    for d in &dirs {
        let p = host_path(dest, d);
        fs::create_dir_all(&p).map_err(|e| TreeError::io(d.as_str(), e))?;
        report.dirs += 1;
    }
    for e in index.entries().filter(|e| e.is_file()) {
        fs::write(host_path(dest, &e.path), &e.content).map_err(|err| TreeError::io(e.path.clone(), err))?;
        report.files += 1;
        report.bytes += e.content.len() as u64;
    }
    info!(target: "templatefs::tree", "materialize ok {} root={} dirs={} files={}", scope, report.root, report.dirs, report.files);
    Ok(report)
}

/// Load `src` into `scope`. The scope must be empty; symlinks and special files are skipped.
pub fn import_dir<S: EntryStore + ?Sized>(store: &S, scope: &Scope, src: &Path, cfg: &EffectiveConfig) -> TreeResult<ImportReport> {
    if !store.list(scope)?.is_empty() {
        return Err(TreeError::conflict_because(abs_display(src), format!("{} already has entries", scope)));
    }
    let mut report = ImportReport::default();
    let mut batch = WriteBatch::new();
    let walker = WalkDir::new(src).min_depth(1).follow_links(false).sort_by_file_name();
    for item in walker {
        let item = item.map_err(|e| {
            let path = e.path().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
            TreeError::io(path, e.into())
        })?;
        let rel = item.path().strip_prefix(src).unwrap_or(item.path());
        let Some(rel) = rel.to_str().map(|s| s.replace(std::path::MAIN_SEPARATOR, "/")) else {
            warn!(target: "templatefs::tree", "import skipping non UTF-8 path {}", item.path().display());
            report.skipped.push(item.path().to_string_lossy().to_string());
            continue;
        };
        let ft = item.file_type();
        let entry = if ft.is_dir() {
            Entry::dir(validate_path(&rel)?)
        } else if ft.is_file() {
            let bytes = fs::read(item.path()).map_err(|e| TreeError::io(rel.clone(), e))?;
            if bytes.len() > cfg.max_content_bytes {
                return Err(TreeError::ContentTooLarge { path: rel, size: bytes.len(), limit: cfg.max_content_bytes });
            }
            Entry::file(validate_path(&rel)?, bytes)
        } else {
            warn!(target: "templatefs::tree", "import skipping {} (not a regular file or directory)", item.path().display());
            report.skipped.push(rel);
            continue;
        };
        if entry.path.len() > cfg.max_path_len {
            return Err(TreeError::invalid_path(entry.path, format!("path exceeds {} bytes", cfg.max_path_len)));
        }
        if entry.is_dir() { report.dirs += 1; } else { report.files += 1; }
        batch = batch.require(Precondition::Absent(entry.path.clone())).put(entry);
    }
    if !batch.is_empty() {
        if let CommitOutcome::Rejected(p) = store.commit(scope, &batch)? {
            return Err(TreeError::conflict_because(p.path(), "scope changed during import"));
        }
    }
    info!(target: "templatefs::tree", "import_dir ok {} src={} dirs={} files={} skipped={}", scope, abs_display(src), report.dirs, report.files, report.skipped.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryEntryStore;
    use crate::tree::ops::{create_entry, get_entry};
    use crate::tree::types::EntryKind;

    fn scope() -> Scope { Scope::new(4, 2) }

    #[test]
    fn materialize_writes_implicit_dirs_and_files() {
        let store = MemoryEntryStore::new();
        let cfg = EffectiveConfig::default();
        create_entry(&store, &scope(), "empty", EntryKind::Dir, vec![], &cfg).unwrap();
        create_entry(&store, &scope(), "src/main.go", EntryKind::File, b"package main".to_vec(), &cfg).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let rep = materialize(&store, &scope(), tmp.path()).unwrap();
        assert_eq!((rep.dirs, rep.files, rep.bytes), (2, 1, 12));
        assert!(tmp.path().join("empty").is_dir());
        assert_eq!(fs::read(tmp.path().join("src").join("main.go")).unwrap(), b"package main");
    }

    #[test]
    fn import_round_trips_materialized_tree() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("charts").join("app")).unwrap();
        fs::write(src.path().join("charts").join("app").join("values.yaml"), "replicas: 3").unwrap();
        fs::write(src.path().join("README.md"), "# hi").unwrap();

        let store = MemoryEntryStore::new();
        let rep = import_dir(&store, &scope(), src.path(), &EffectiveConfig::default()).unwrap();
        assert_eq!((rep.dirs, rep.files), (2, 2));
        assert_eq!(get_entry(&store, &scope(), "charts/app/values.yaml").unwrap().content, b"replicas: 3".to_vec());
        assert!(get_entry(&store, &scope(), "charts").unwrap().is_dir());

        let err = import_dir(&store, &scope(), src.path(), &EffectiveConfig::default()).unwrap_err();
        assert!(matches!(err, TreeError::Conflict { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn import_skips_symlinks() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(src.path().join("real.txt"), src.path().join("link.txt")).unwrap();
        let store = MemoryEntryStore::new();
        let rep = import_dir(&store, &scope(), src.path(), &EffectiveConfig::default()).unwrap();
        assert_eq!(rep.files, 1);
        assert_eq!(rep.skipped, vec!["link.txt".to_string()]);
    }
}
