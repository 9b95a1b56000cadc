//! Flat entry set -> nested forest for listing/presentation.
//! The forest is an owned snapshot: nodes are copied out of the entry set, there are no
//! back-pointers, and hierarchy comes purely from `parent_of` path matching.

use std::collections::BTreeMap;

use super::paths::{ancestors_of, name_of, parent_of};
use super::types::{Entry, EntryKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Directory synthesized from a descendant's path; it has no entry of its own.
    pub implicit: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool { self.kind == EntryKind::Dir }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path { return Some(self); }
        self.children.iter().find_map(|c| c.find(path))
    }
}

/// Build the forest rooted at the namespace root. Siblings are ordered lexically by name,
/// so repeated builds over the same entry set are identical.
pub fn build_tree(entries: &[Entry]) -> Vec<TreeNode> {
    let mut implicit: Vec<String> = entries.iter().flat_map(|e| ancestors_of(&e.path)).collect();
    implicit.sort();
    implicit.dedup();

    // path -> (kind, implicit); materialized entries override synthesized ancestors
    let mut nodes: BTreeMap<&str, (EntryKind, bool)> = BTreeMap::new();
    for a in &implicit {
        nodes.insert(a.as_str(), (EntryKind::Dir, true));
    }
    for e in entries {
        nodes.insert(e.path.as_str(), (e.kind, false));
    }

    let mut by_parent: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for &path in nodes.keys() {
        by_parent.entry(parent_of(path)).or_default().push(path);
    }
    attach("", &nodes, &by_parent)
}

fn attach(parent: &str, nodes: &BTreeMap<&str, (EntryKind, bool)>, by_parent: &BTreeMap<&str, Vec<&str>>) -> Vec<TreeNode> {
    let Some(kids) = by_parent.get(parent) else { return Vec::new() };
    kids.iter()
        .map(|path| {
            let (kind, implicit) = nodes[path];
            TreeNode {
                name: name_of(path).to_string(),
                path: path.to_string(),
                kind,
                implicit,
                children: attach(path, nodes, by_parent),
            }
        })
        .collect()
}

/// Materialized paths of a forest in pre-order; implicit directories are skipped.
pub fn flatten_tree(forest: &[TreeNode]) -> Vec<String> {
    fn walk(n: &TreeNode, out: &mut Vec<String>) {
        if !n.implicit { out.push(n.path.clone()); }
        for c in &n.children { walk(c, out); }
    }
    let mut out = Vec::new();
    for n in forest { walk(n, &mut out); }
    out
}
