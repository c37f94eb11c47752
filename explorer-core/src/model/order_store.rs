//! ``src/model/order_store.rs``
//! ============================================================================
//! # OrderStore: persisted custom ranks and collapse state
//!
//! Both maps are keyed by item path. Any key that names a path which no
//! longer exists is a bug; renames re-key every entry at or below the old
//! path and deletes drop them.
//!
//! Each mutation marks the store dirty and bumps [`OrderStore::revision`].
//! The owner drains the flag with [`OrderStore::take_dirty`] and hands a
//! snapshot to the debounced settings writer.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::model::item::path;
use crate::model::settings::ExplorerSettings;
use crate::model::sort;
use crate::model::tree::TreeProvider;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderStore {
    ranks: BTreeMap<String, i64>,
    collapsed: BTreeSet<String>,
    revision: u64,
    dirty: bool,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from persisted settings. Folders stored as `false` are expanded.
    pub fn from_settings(settings: &ExplorerSettings) -> Self {
        Self {
            ranks: settings.sort_order.clone(),
            collapsed: settings
                .collapsed_folders
                .iter()
                .filter(|(_, collapsed)| **collapsed)
                .map(|(path, _)| path.clone())
                .collect(),
            revision: 0,
            dirty: false,
        }
    }

    /// Copy both maps into `settings`, leaving every other field alone.
    pub fn write_into(&self, settings: &mut ExplorerSettings) {
        settings.sort_order = self.ranks.clone();
        settings.collapsed_folders = self
            .collapsed
            .iter()
            .map(|path| (path.clone(), true))
            .collect();
    }

    /* ----------------------------- queries ---------------------------- */

    pub fn rank(&self, path: &str) -> Option<i64> {
        self.ranks.get(path).copied()
    }

    pub fn ranks(&self) -> &BTreeMap<String, i64> {
        &self.ranks
    }

    pub fn is_collapsed(&self, path: &str) -> bool {
        self.collapsed.contains(path)
    }

    pub fn collapsed(&self) -> impl Iterator<Item = &str> {
        self.collapsed.iter().map(String::as_str)
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag.
    pub const fn take_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }

    /* ---------------------------- mutations --------------------------- */

    pub fn set_rank(&mut self, path: &str, rank: i64) {
        if self.ranks.insert(path.to_string(), rank) != Some(rank) {
            self.touch();
        }
    }

    /// Move `source` next to `anchor` within their shared parent and re-rank
    /// the whole sibling group `0..n-1`. Returns false, changing nothing,
    /// when the two are not siblings or either is missing from the group.
    pub fn reorder(
        &mut self,
        tree: &(impl TreeProvider + ?Sized),
        source: &str,
        anchor: &str,
        insert_before: bool,
    ) -> bool {
        let parent = path::parent(source);
        if parent != path::parent(anchor) {
            trace!(source, anchor, "reorder skipped: different parents");
            return false;
        }

        let mut siblings: Vec<String> = sort::sorted_children(tree, parent, self)
            .into_iter()
            .map(|item| item.path)
            .collect();

        let Some(from) = siblings.iter().position(|p| p == source) else {
            return false;
        };
        if !siblings.iter().any(|p| p == anchor) {
            return false;
        }

        let moved = siblings.remove(from);
        // a source equal to its anchor goes back where it was
        let at = siblings
            .iter()
            .position(|p| p == anchor)
            .map_or(from, |idx| if insert_before { idx } else { idx + 1 });
        siblings.insert(at, moved);

        debug!(source, anchor, insert_before, parent, "reordered sibling group");
        for (rank, sibling) in siblings.iter().enumerate() {
            self.ranks.insert(sibling.clone(), rank as i64);
        }
        self.touch();
        true
    }

    /// Re-key every entry equal to `old` or below it onto `new`.
    pub fn rewrite_prefix(&mut self, old: &str, new: &str) -> usize {
        if old.is_empty() || old == new {
            return 0;
        }
        let ranks = std::mem::take(&mut self.ranks);
        let mut changed = 0;
        for (key, rank) in ranks {
            match path::rebase(&key, old, new) {
                Some(rekeyed) => {
                    changed += 1;
                    self.ranks.insert(rekeyed, rank);
                }
                None => {
                    // a rebased entry may already have claimed this key
                    self.ranks.entry(key).or_insert(rank);
                }
            }
        }
        let collapsed = std::mem::take(&mut self.collapsed);
        for key in collapsed {
            match path::rebase(&key, old, new) {
                Some(rekeyed) => {
                    changed += 1;
                    self.collapsed.insert(rekeyed);
                }
                None => {
                    self.collapsed.insert(key);
                }
            }
        }
        if changed > 0 {
            debug!(old, new, changed, "rewrote order entries");
            self.touch();
        }
        changed
    }

    /// Drop every entry equal to `prefix` or below it.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }
        let before = self.ranks.len() + self.collapsed.len();
        self.ranks
            .retain(|key, _| !path::is_same_or_descendant(key, prefix));
        self.collapsed
            .retain(|key| !path::is_same_or_descendant(key, prefix));
        let removed = before - (self.ranks.len() + self.collapsed.len());
        if removed > 0 {
            debug!(prefix, removed, "removed order entries");
            self.touch();
        }
        removed
    }

    /// Drop every entry whose path fails `exists`.
    pub fn sweep(&mut self, exists: impl Fn(&str) -> bool) -> usize {
        let before = self.ranks.len() + self.collapsed.len();
        self.ranks.retain(|key, _| exists(key));
        self.collapsed.retain(|key| exists(key));
        let removed = before - (self.ranks.len() + self.collapsed.len());
        if removed > 0 {
            debug!(removed, "swept stale order entries");
            self.touch();
        }
        removed
    }

    /* --------------------------- collapse state ------------------------ */

    pub fn set_collapsed(&mut self, folder: &str, collapsed: bool) {
        let changed = if collapsed {
            self.collapsed.insert(folder.to_string())
        } else {
            self.collapsed.remove(folder)
        };
        if changed {
            self.touch();
        }
    }

    /// Flip a folder and return its new state (`true` = collapsed).
    pub fn toggle_collapsed(&mut self, folder: &str) -> bool {
        let collapsed = !self.is_collapsed(folder);
        self.set_collapsed(folder, collapsed);
        collapsed
    }

    /// Make sure `folder` is expanded.
    pub fn expand(&mut self, folder: &str) {
        self.set_collapsed(folder, false);
    }

    /// Collapse or expand every folder in `folders` at once.
    pub fn set_all_collapsed<'a>(
        &mut self,
        folders: impl IntoIterator<Item = &'a str>,
        collapse: bool,
    ) {
        if collapse {
            let before = self.collapsed.len();
            self.collapsed
                .extend(folders.into_iter().map(str::to_string));
            if self.collapsed.len() != before {
                self.touch();
            }
        } else if !self.collapsed.is_empty() {
            for folder in folders {
                self.collapsed.remove(folder);
            }
            self.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory_tree::MemoryTree;

    fn names(tree: &MemoryTree, store: &OrderStore, folder: &str) -> Vec<String> {
        sort::sorted_children(tree, folder, store)
            .into_iter()
            .map(|item| item.path)
            .collect()
    }

    #[test]
    fn test_reorder_moves_source_and_ranks_densely() {
        let tree = MemoryTree::from_paths(["a.md", "b.md", "c.md"]);
        let mut store = OrderStore::new();

        assert!(store.reorder(&tree, "c.md", "a.md", false));
        assert_eq!(names(&tree, &store, ""), ["a.md", "c.md", "b.md"]);
        let ranks: Vec<i64> = store.ranks().values().copied().collect();
        assert_eq!(ranks, [0, 2, 1]);
        assert!(store.take_dirty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_reorder_with_self_or_neighbor_anchor_is_idempotent() {
        let tree = MemoryTree::from_paths(["a.md", "b.md", "c.md"]);
        let mut store = OrderStore::new();

        assert!(store.reorder(&tree, "b.md", "b.md", true));
        assert_eq!(names(&tree, &store, ""), ["a.md", "b.md", "c.md"]);
        assert!(store.reorder(&tree, "b.md", "a.md", false));
        assert!(store.reorder(&tree, "b.md", "c.md", true));
        assert_eq!(names(&tree, &store, ""), ["a.md", "b.md", "c.md"]);
        assert_eq!(store.rank("a.md"), Some(0));
        assert_eq!(store.rank("c.md"), Some(2));
    }

    #[test]
    fn test_reorder_across_parents_is_noop() {
        let tree = MemoryTree::from_paths(["Notes/x.md", "a.md"]);
        let mut store = OrderStore::new();
        assert!(!store.reorder(&tree, "Notes/x.md", "a.md", true));
        assert!(!store.reorder(&tree, "missing.md", "a.md", true));
        assert!(store.ranks().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_rewrite_prefix_rekeys_nested_entries_only() {
        let mut store = OrderStore::new();
        store.set_rank("Notes", 0);
        store.set_rank("Notes/x.md", 0);
        store.set_rank("Notes/Sub/y.md", 3);
        store.set_rank("Notes2", 1);
        store.set_collapsed("Notes/Sub", true);

        assert_eq!(store.rewrite_prefix("Notes", "Archive/Notes"), 4);
        assert_eq!(store.rank("Archive/Notes/Sub/y.md"), Some(3));
        assert_eq!(store.rank("Notes2"), Some(1));
        assert!(store.rank("Notes/x.md").is_none());
        assert!(store.is_collapsed("Archive/Notes/Sub"));
        assert!(!store.is_collapsed("Notes/Sub"));

        // replaying the same notification changes nothing
        let revision = store.revision();
        assert_eq!(store.rewrite_prefix("Notes", "Archive/Notes"), 0);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_remove_prefix_and_sweep() {
        let mut store = OrderStore::new();
        store.set_rank("Notes", 0);
        store.set_rank("Notes/x.md", 1);
        store.set_rank("Notebook.md", 2);
        store.set_collapsed("Notes", true);

        assert_eq!(store.remove_prefix("Notes"), 3);
        assert_eq!(store.ranks().len(), 1);
        assert_eq!(store.remove_prefix("Notes"), 0);

        store.set_rank("gone.md", 5);
        assert_eq!(store.sweep(|p| p == "Notebook.md"), 1);
        assert_eq!(store.ranks().keys().collect::<Vec<_>>(), ["Notebook.md"]);
    }

    #[test]
    fn test_settings_round_trip_and_collapse_helpers() {
        let mut settings = ExplorerSettings::default();
        settings.collapsed_folders.insert("A".into(), true);
        settings.collapsed_folders.insert("B".into(), false);
        let mut store = OrderStore::from_settings(&settings);
        assert!(store.is_collapsed("A"));
        assert!(!store.is_collapsed("B"));

        assert!(!store.toggle_collapsed("A"));
        store.set_all_collapsed(["A", "B"], true);
        assert_eq!(store.collapsed().count(), 2);
        store.expand("B");

        store.write_into(&mut settings);
        assert_eq!(settings.collapsed_folders.len(), 1);
        assert_eq!(settings.collapsed_folders.get("A"), Some(&true));
    }
}
