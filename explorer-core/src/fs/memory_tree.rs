//! ``src/fs/memory_tree.rs``
//! ============================================================================
//! # MemoryTree: in-memory [`TreeProvider`]
//!
//! Used by tests and by hosts that keep their own snapshot. Children are
//! reported in insertion order, like a storage layer with no meaningful
//! natural order.

use std::collections::HashSet;
use std::io;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::error::{ExplorerError, ExplorerResult};
use crate::model::item::{Item, ItemKind, path};
use crate::model::tree::{DeleteMode, TreeEvent, TreeProvider, check_move};

#[derive(Debug)]
pub struct MemoryTree {
    entries: IndexMap<String, ItemKind>,
    contents: IndexMap<String, Vec<u8>>,
    failing: HashSet<String>,
    events_tx: UnboundedSender<TreeEvent>,
    events_rx: Option<UnboundedReceiver<TreeEvent>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    #[must_use]
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            entries: IndexMap::new(),
            contents: IndexMap::new(),
            failing: HashSet::new(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Build a tree from paths; entries ending in `/` are folders. Missing
    /// ancestors are created as folders. No events are emitted.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for raw in paths {
            let raw = raw.as_ref();
            let (path, kind) = match raw.strip_suffix('/') {
                Some(folder) => (folder, ItemKind::Folder),
                None => (raw, ItemKind::File),
            };
            tree.insert_silently(path, kind);
        }
        tree
    }

    fn insert_silently(&mut self, path: &str, kind: ItemKind) {
        let parent = path::parent(path);
        if !parent.is_empty() && !self.entries.contains_key(parent) {
            self.insert_silently(parent, ItemKind::Folder);
        }
        self.entries.entry(path.to_string()).or_insert(kind);
    }

    /// Make every storage call touching `path` fail with an IO error.
    pub fn inject_failure(&mut self, path: impl Into<String>) {
        self.failing.insert(path.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File contents, when the file was created through the provider.
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.contents.get(path).map(Vec::as_slice)
    }

    fn fail_if_injected(&self, operation: &'static str, path: &str) -> ExplorerResult<()> {
        if self.failing.contains(path) {
            return Err(ExplorerError::io(
                operation,
                path,
                io::Error::other("injected failure"),
            ));
        }
        Ok(())
    }

    fn emit(&self, event: TreeEvent) {
        trace!(?event, "memory tree event");
        let _ = self.events_tx.send(event);
    }

    fn ensure_parent_folder(&self, path: &str) -> ExplorerResult<()> {
        let parent = path::parent(path);
        match self.get(parent) {
            Some(item) if item.is_folder() => Ok(()),
            Some(_) => Err(ExplorerError::NotAFolder(parent.to_string())),
            None => Err(ExplorerError::NotFound(parent.to_string())),
        }
    }
}

#[async_trait]
impl TreeProvider for MemoryTree {
    fn get(&self, path: &str) -> Option<Item> {
        if path.is_empty() {
            return Some(Item::folder(""));
        }
        self.entries
            .get(path)
            .map(|kind| Item::new(path.to_string(), *kind))
    }

    fn children(&self, folder: &str) -> Vec<Item> {
        self.entries
            .iter()
            .filter(|(path, _)| path::parent(path) == folder)
            .map(|(path, kind)| Item::new(path.clone(), *kind))
            .collect()
    }

    async fn rename(&mut self, path: &str, new_path: &str) -> ExplorerResult<()> {
        self.fail_if_injected("rename", path)?;
        let item = check_move(self, path, new_path)?;

        // re-key the item and, for folders, everything below it while keeping
        // each entry's slot in the insertion order
        let old_entries = std::mem::take(&mut self.entries);
        for (key, kind) in old_entries {
            let key = path::rebase(&key, path, new_path).unwrap_or(key);
            self.entries.insert(key, kind);
        }
        let old_contents = std::mem::take(&mut self.contents);
        for (key, bytes) in old_contents {
            let key = path::rebase(&key, path, new_path).unwrap_or(key);
            self.contents.insert(key, bytes);
        }

        debug!(from = path, to = new_path, kind = ?item.kind, "memory tree rename");
        self.emit(TreeEvent::Renamed {
            old_path: path.to_string(),
            new_path: new_path.to_string(),
        });
        Ok(())
    }

    async fn create_folder(&mut self, path: &str) -> ExplorerResult<()> {
        self.fail_if_injected("create_folder", path)?;
        if self.exists(path) {
            return Err(ExplorerError::name_conflict(path));
        }
        self.ensure_parent_folder(path)?;
        self.entries.insert(path.to_string(), ItemKind::Folder);
        self.emit(TreeEvent::Created {
            path: path.to_string(),
        });
        Ok(())
    }

    async fn create_file(&mut self, path: &str, content: &[u8]) -> ExplorerResult<()> {
        self.fail_if_injected("create_file", path)?;
        if self.exists(path) {
            return Err(ExplorerError::name_conflict(path));
        }
        self.ensure_parent_folder(path)?;
        self.entries.insert(path.to_string(), ItemKind::File);
        self.contents.insert(path.to_string(), content.to_vec());
        self.emit(TreeEvent::Created {
            path: path.to_string(),
        });
        Ok(())
    }

    async fn read(&self, path: &str) -> ExplorerResult<Vec<u8>> {
        self.fail_if_injected("read", path)?;
        match self.entries.get(path) {
            // files seeded through `from_paths` have no stored bytes
            Some(ItemKind::File) => Ok(self.contents.get(path).cloned().unwrap_or_default()),
            Some(ItemKind::Folder) => Err(ExplorerError::io(
                "read",
                path,
                io::Error::other("is a folder"),
            )),
            None => Err(ExplorerError::NotFound(path.to_string())),
        }
    }

    async fn delete(&mut self, path: &str, mode: DeleteMode) -> ExplorerResult<()> {
        self.fail_if_injected("delete", path)?;
        if path.is_empty() || !self.entries.contains_key(path) {
            return Err(ExplorerError::NotFound(path.to_string()));
        }
        self.entries
            .retain(|key, _| !path::is_same_or_descendant(key, path));
        self.contents
            .retain(|key, _| !path::is_same_or_descendant(key, path));

        debug!(path, ?mode, "memory tree delete");
        self.emit(TreeEvent::Deleted {
            path: path.to_string(),
        });
        Ok(())
    }

    fn take_events(&mut self) -> Option<UnboundedReceiver<TreeEvent>> {
        self.events_rx.take()
    }
}
