//! Core tree operations: list/get/create/rename/update/delete against an `EntryStore`.
//! Every call re-reads the scope, validates against a fresh `TreeIndex`, then submits a single
//! `WriteBatch` whose preconditions restate the checks so the store can reject a commit that
//! raced with another writer. Validation always happens before the store write.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{TreeError, TreeResult};
use crate::storage::{CommitOutcome, EntryStore, Precondition, WriteBatch};

use super::builder::{build_tree, TreeNode};
use super::config::{DeletePolicy, EffectiveConfig, RenamePolicy};
use super::index::TreeIndex;
use super::paths::{ancestors_of, is_descendant_of, rebase, validate_path};
use super::types::{Entry, EntryKind, Scope};

/// Fresh index over the current entry set of a scope.
pub fn load_index<S: EntryStore + ?Sized>(store: &S, scope: &Scope) -> TreeResult<TreeIndex> {
    Ok(TreeIndex::new(store.list(scope)?))
}

/// Nested view of a scope, rebuilt from the flat entry set.
pub fn list_tree<S: EntryStore + ?Sized>(store: &S, scope: &Scope) -> TreeResult<Vec<TreeNode>> {
    let entries = store.list(scope)?;
    Ok(build_tree(&entries))
}

/// Fetch one entry by path.
pub fn get_entry<S: EntryStore + ?Sized>(store: &S, scope: &Scope, path: &str) -> TreeResult<Entry> {
    let path = validate_path(path)?;
    store.get(scope, &path)?.ok_or_else(|| TreeError::not_found(path))
}

/// Create a file or directory. Directory content is dropped.
pub fn create_entry<S: EntryStore + ?Sized>(
    store: &S,
    scope: &Scope,
    path: &str,
    kind: EntryKind,
    content: Vec<u8>,
    cfg: &EffectiveConfig,
) -> TreeResult<Entry> {
    let path = checked_path(path, cfg)?;
    if kind == EntryKind::File { check_content_size(&path, content.len(), cfg)?; }

    let index = load_index(store, scope)?;
    if index.exists(&path) {
        return Err(TreeError::conflict(path));
    }
    if kind == EntryKind::File && index.has_descendants(&path) {
        return Err(TreeError::conflict_because(path, "path is an implicit directory with entries below it"));
    }

    let mut batch = WriteBatch::new().require(Precondition::Absent(path.clone()));
    if kind == EntryKind::File {
        batch = batch.require(Precondition::DescendantCount { path: path.clone(), count: 0 });
    }
    batch = require_dir_ancestors(batch, &index, &path, cfg)?;

    let entry = Entry::new(path.clone(), kind, content);
    let batch = batch.put(entry.clone());
    commit(store, scope, &batch, &path)?;
    info!(target: "templatefs::tree", "create_entry ok {} path={} kind={} size={}", scope, entry.path, entry.kind, entry.content.len());
    Ok(entry)
}

/// Rename/move the entry at `old_path` to `new_path`, optionally replacing its content.
/// `new_path == old_path` is a content-only update. Directory moves follow `cfg.rename_policy`.
pub fn rename_entry<S: EntryStore + ?Sized>(
    store: &S,
    scope: &Scope,
    old_path: &str,
    new_path: &str,
    content: Option<Vec<u8>>,
    cfg: &EffectiveConfig,
) -> TreeResult<Entry> {
    let new = checked_path(new_path, cfg)?;
    let old = validate_path(old_path)?;
    if new == old {
        return match content {
            Some(c) => update_entry_content(store, scope, &old, c, None, cfg),
            None => get_entry(store, scope, &old),
        };
    }

    let index = load_index(store, scope)?;
    let src = index.get(&old).cloned().ok_or_else(|| TreeError::not_found(old.clone()))?;
    if index.exists(&new) {
        return Err(TreeError::conflict(new));
    }
    if is_descendant_of(&new, &old) {
        return Err(TreeError::invalid_path(new, format!("cannot move '{}' below itself", old)));
    }

    let moved_content = match (src.kind, content) {
        (EntryKind::Dir, Some(c)) if !c.is_empty() => return Err(TreeError::NotAFile { path: old }),
        (EntryKind::File, Some(c)) => { check_content_size(&new, c.len(), cfg)?; c }
        _ => src.content.clone(),
    };

    let descendants: Vec<Entry> = index.descendants_of(&old).into_iter().cloned().collect();
    if !descendants.is_empty() && cfg.rename_policy == RenamePolicy::RejectNonEmpty {
        return Err(TreeError::conflict_because(old, "directory is not empty"));
    }

    // Everything currently at or below `old` leaves its path in this batch.
    let moving: HashSet<&str> = std::iter::once(old.as_str()).chain(descendants.iter().map(|d| d.path.as_str())).collect();
    let below_new = index.descendants_of(&new);
    if src.is_file() && below_new.iter().any(|e| !moving.contains(e.path.as_str())) {
        return Err(TreeError::conflict_because(new, "path is an implicit directory with entries below it"));
    }

    let mut batch = WriteBatch::new()
        .require(Precondition::EtagMatches { path: old.clone(), etag: src.etag.clone() })
        .require(Precondition::DescendantCount { path: old.clone(), count: descendants.len() })
        .require(Precondition::Absent(new.clone()));
    if src.is_file() {
        batch = batch.require(Precondition::DescendantCount { path: new.clone(), count: below_new.len() });
    }
    batch = require_dir_ancestors(batch, &index, &new, cfg)?;

    let mut puts: Vec<Entry> = Vec::with_capacity(descendants.len() + 1);
    let moved = src.moved_to(new.clone());
    let moved = if moved.is_file() && moved_content != moved.content { moved.with_content(moved_content) } else { moved };
    puts.push(moved.clone());
    let mut guarded: HashSet<String> = HashSet::new();
    for d in &descendants {
        let target = rebase(&d.path, &old, &new).ok_or_else(|| TreeError::invalid_path(d.path.clone(), "descendant outside moved subtree"))?;
        if target.len() > cfg.max_path_len {
            return Err(TreeError::invalid_path(target, format!("path exceeds {} bytes", cfg.max_path_len)));
        }
        if !moving.contains(target.as_str()) {
            if index.exists(&target) {
                return Err(TreeError::conflict(target));
            }
            batch = batch.require(Precondition::Absent(target.clone()));
        }
        // Ancestors between `new` and the target that stay put must be directories.
        for a in ancestors_of(&target).into_iter().filter(|a| is_descendant_of(a, &new)) {
            if moving.contains(a.as_str()) || !guarded.insert(a.clone()) { continue; }
            match index.get(&a) {
                Some(e) if !e.is_dir() => return Err(TreeError::parent_not_directory(target, a)),
                _ => { batch = batch.require(Precondition::NotFile(a)); }
            }
        }
        if d.is_file() {
            let below = index.descendants_of(&target);
            if below.iter().any(|e| !moving.contains(e.path.as_str())) {
                return Err(TreeError::conflict_because(target, "path is an implicit directory with entries below it"));
            }
            batch = batch.require(Precondition::DescendantCount { path: target.clone(), count: below.len() });
        }
        batch = batch.require(Precondition::EtagMatches { path: d.path.clone(), etag: d.etag.clone() });
        puts.push(d.moved_to(target));
    }

    // All removals first so a target freed by this same move is not clobbered afterwards.
    batch = batch.remove(old.clone());
    for d in &descendants { batch = batch.remove(d.path.clone()); }
    for e in puts { batch = batch.put(e); }

    commit(store, scope, &batch, &old)?;
    info!(target: "templatefs::tree", "rename_entry ok {} {} -> {} kind={} descendants={}", scope, old, new, moved.kind, descendants.len());
    Ok(moved)
}

/// Replace the content of a file in place. `if_match` enables optimistic concurrency on the etag.
pub fn update_entry_content<S: EntryStore + ?Sized>(
    store: &S,
    scope: &Scope,
    path: &str,
    content: Vec<u8>,
    if_match: Option<&str>,
    cfg: &EffectiveConfig,
) -> TreeResult<Entry> {
    let path = validate_path(path)?;
    let cur = store.get(scope, &path)?.ok_or_else(|| TreeError::not_found(path.clone()))?;
    if let Some(etag) = if_match {
        if etag != cur.etag {
            return Err(TreeError::conflict_because(path, "etag does not match"));
        }
    }
    if cur.is_dir() {
        if content.is_empty() { return Ok(cur); }
        return Err(TreeError::NotAFile { path });
    }
    check_content_size(&path, content.len(), cfg)?;

    let next = cur.with_content(content);
    if next.etag == cur.etag {
        return Ok(cur);
    }
    let batch = WriteBatch::new()
        .require(Precondition::EtagMatches { path: path.clone(), etag: cur.etag.clone() })
        .put(next.clone());
    commit(store, scope, &batch, &path)?;
    info!(target: "templatefs::tree", "update_entry_content ok {} path={} size={} etag={}", scope, path, next.content.len(), next.etag);
    Ok(next)
}

/// Permanently remove the entry at `path`. Directory deletes follow `cfg.delete_policy`.
/// Returns every removed path, the target first.
pub fn delete_entry<S: EntryStore + ?Sized>(
    store: &S,
    scope: &Scope,
    path: &str,
    cfg: &EffectiveConfig,
) -> TreeResult<Vec<String>> {
    let path = validate_path(path)?;
    let index = load_index(store, scope)?;
    let target = index.get(&path).ok_or_else(|| TreeError::not_found(path.clone()))?;
    let descendants = index.descendants_of(&path);
    if !descendants.is_empty() && cfg.delete_policy == DeletePolicy::RejectNonEmpty {
        return Err(TreeError::conflict_because(path, "directory is not empty"));
    }

    let mut batch = WriteBatch::new()
        .require(Precondition::EtagMatches { path: path.clone(), etag: target.etag.clone() })
        .require(Precondition::DescendantCount { path: path.clone(), count: descendants.len() })
        .remove(path.clone());
    let mut removed = vec![path.clone()];
    for d in descendants {
        batch = batch.remove(d.path.clone());
        removed.push(d.path.clone());
    }
    commit(store, scope, &batch, &path)?;
    info!(target: "templatefs::tree", "delete_entry ok {} path={} removed={}", scope, path, removed.len());
    Ok(removed)
}

fn checked_path(path: &str, cfg: &EffectiveConfig) -> TreeResult<String> {
    let p = validate_path(path)?;
    if p.len() > cfg.max_path_len {
        return Err(TreeError::invalid_path(p, format!("path exceeds {} bytes", cfg.max_path_len)));
    }
    Ok(p)
}

fn check_content_size(path: &str, size: usize, cfg: &EffectiveConfig) -> TreeResult<()> {
    if size > cfg.max_content_bytes {
        return Err(TreeError::ContentTooLarge { path: path.to_string(), size, limit: cfg.max_content_bytes });
    }
    Ok(())
}

/// Enforce parent-type consistency for `path`: each materialized ancestor must be a directory.
/// Missing ancestors stay implicit, or become `Dir` entries when `materialize_parents` is set.
fn require_dir_ancestors(mut batch: WriteBatch, index: &TreeIndex, path: &str, cfg: &EffectiveConfig) -> TreeResult<WriteBatch> {
    if let Some(bad) = index.first_non_dir_ancestor(path) {
        return Err(TreeError::parent_not_directory(path, bad.path.clone()));
    }
    for a in index.ancestor_chain(path) {
        match index.get(&a) {
            Some(_) => { batch = batch.require(Precondition::NotFile(a)); }
            None if cfg.materialize_parents => {
                batch = batch.require(Precondition::Absent(a.clone())).put(Entry::dir(a));
            }
            None => { batch = batch.require(Precondition::NotFile(a)); }
        }
    }
    Ok(batch)
}

fn commit<S: EntryStore + ?Sized>(store: &S, scope: &Scope, batch: &WriteBatch, target: &str) -> TreeResult<()> {
    match store.commit(scope, batch)? {
        CommitOutcome::Applied => Ok(()),
        CommitOutcome::Rejected(p) => {
            debug!(target: "templatefs::tree", "commit rejected {} target={} precondition={:?}", scope, target, p);
            Err(rejection_error(p, target))
        }
    }
}

/// Translate a precondition that failed inside the store into the caller-facing error.
fn rejection_error(p: Precondition, target: &str) -> TreeError {
    match p {
        Precondition::Absent(path) => TreeError::conflict(path),
        Precondition::Present(path) => TreeError::not_found(path),
        Precondition::EtagMatches { path, .. } => TreeError::conflict_because(path, "entry changed concurrently"),
        Precondition::NotFile(parent) => TreeError::parent_not_directory(target, parent),
        Precondition::DescendantCount { path, .. } => TreeError::conflict_because(path, "entries below changed concurrently"),
    }
}
