//! ``src/model/tree.rs``
//! ============================================================================
//! # TreeProvider: the storage collaborator seen from the explorer core
//!
//! Queries are synchronous snapshot reads. Mutations are async and awaited
//! one at a time by the caller. Providers publish a [`TreeEvent`] for every
//! structural change, including the ones the core itself requested.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ExplorerResult;
use crate::model::item::{Item, path};

/// How a delete should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Move into the provider's trash area.
    #[default]
    Trash,
    /// Remove for good.
    Permanent,
}

/// Change notification emitted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    Created { path: String },
    Deleted { path: String },
    Renamed { old_path: String, new_path: String },
}

#[async_trait]
pub trait TreeProvider: Send + Sync {
    /// Look up an item by path. `""` resolves to the root folder.
    fn get(&self, path: &str) -> Option<Item>;

    /// Direct children of `folder`, in storage order.
    fn children(&self, folder: &str) -> Vec<Item>;

    /// The root folder.
    fn root(&self) -> Item {
        Item::folder("")
    }

    /// Every folder below the root, depth-first.
    fn all_folders(&self) -> Vec<Item> {
        let mut out = Vec::new();
        let mut stack = vec![String::new()];
        while let Some(folder) = stack.pop() {
            for child in self.children(&folder) {
                if child.is_folder() {
                    stack.push(child.path.clone());
                    out.push(child);
                }
            }
        }
        out
    }

    fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Move or rename `path` to `new_path`. Fails with `NameConflict` when the
    /// destination exists and `SelfContainment` when a folder would end up
    /// inside itself.
    async fn rename(&mut self, path: &str, new_path: &str) -> ExplorerResult<()>;

    async fn create_folder(&mut self, path: &str) -> ExplorerResult<()>;

    async fn create_file(&mut self, path: &str, content: &[u8]) -> ExplorerResult<()>;

    async fn delete(&mut self, path: &str, mode: DeleteMode) -> ExplorerResult<()>;

    /// Bytes of the file at `path`.
    async fn read(&self, path: &str) -> ExplorerResult<Vec<u8>>;

    /// Absolute location on disk, for providers backed by one.
    fn full_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    /// Hand over the change-event stream. Only the first call gets it.
    fn take_events(&mut self) -> Option<UnboundedReceiver<TreeEvent>>;
}

/// Shared precondition check for providers implementing [`TreeProvider::rename`].
pub fn check_move(
    provider: &(impl TreeProvider + ?Sized),
    path: &str,
    new_path: &str,
) -> ExplorerResult<Item> {
    use crate::error::ExplorerError;

    let item = provider
        .get(path)
        .filter(|item| !item.is_root())
        .ok_or_else(|| ExplorerError::NotFound(path.to_string()))?;

    if item.is_folder() && path::is_same_or_descendant(new_path, path) && new_path != path {
        return Err(ExplorerError::self_containment(path, new_path));
    }
    if provider.exists(new_path) {
        return Err(ExplorerError::name_conflict(new_path));
    }
    let target_parent = path::parent(new_path);
    match provider.get(target_parent) {
        Some(parent) if parent.is_folder() => Ok(item),
        Some(_) => Err(ExplorerError::NotAFolder(target_parent.to_string())),
        None => Err(ExplorerError::NotFound(target_parent.to_string())),
    }
}
