//! ``src/fs/dir_tree.rs``
//! ============================================================================
//! # DirTree: [`TreeProvider`] over a real directory
//!
//! A snapshot index is built once with `walkdir` on a blocking thread and
//! then kept in step with every mutation made through the provider. Hidden
//! entries (leading `.`) are not indexed; the trash folder is one of them.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs as TokioFs;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{ExplorerError, ExplorerResult};
use crate::fs::memory_tree::MemoryTree;
use crate::model::item::{Item, ItemKind, path};
use crate::model::tree::{DeleteMode, TreeEvent, TreeProvider, check_move};

/// Folder under the root that receives trashed items.
pub const TRASH_DIR: &str = ".trash";

#[derive(Debug)]
pub struct DirTree {
    root: PathBuf,
    index: MemoryTree,
}

/// Slash-delimited path of `entry` relative to `root`, if representable.
fn relative_key(root: &Path, entry: &Path) -> Option<String> {
    let rel = entry.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

fn scan(root: &Path) -> Vec<String> {
    let mut keys = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let Some(key) = relative_key(root, entry.path()) else {
            warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };
        if entry.file_type().is_dir() {
            keys.push(format!("{key}/"));
        } else {
            keys.push(key);
        }
    }
    keys
}

impl DirTree {
    /// Index `root` recursively.
    pub async fn open(root: impl Into<PathBuf>) -> ExplorerResult<Self> {
        let root: PathBuf = root.into();
        let started = Instant::now();

        let meta = TokioFs::metadata(&root)
            .await
            .map_err(|e| ExplorerError::io("open", root.display().to_string(), e))?;
        if !meta.is_dir() {
            return Err(ExplorerError::NotAFolder(root.display().to_string()));
        }

        let scan_root = root.clone();
        let keys = tokio::task::spawn_blocking(move || scan(&scan_root))
            .await
            .map_err(|e| ExplorerError::io("scan", root.display().to_string(), io::Error::other(e)))?;

        let index = MemoryTree::from_paths(&keys);
        info!(
            root = %root.display(),
            entries = index.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "indexed directory"
        );
        Ok(Self { root, index })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    fn abs(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Free name for `name` inside the trash folder.
    async fn trash_slot(&self, name: &str) -> io::Result<PathBuf> {
        let trash = self.root.join(TRASH_DIR);
        TokioFs::create_dir_all(&trash).await?;
        let mut candidate = trash.join(name);
        let mut n = 1;
        while TokioFs::try_exists(&candidate).await? {
            candidate = trash.join(format!("{} {n}{}", path::basename(name), ext_suffix(name)));
            n += 1;
        }
        Ok(candidate)
    }
}

/// `.ext` of `name`, or `""`.
fn ext_suffix(name: &str) -> &str {
    let base = path::basename(name);
    &name[base.len()..]
}

#[async_trait]
impl TreeProvider for DirTree {
    fn get(&self, path: &str) -> Option<Item> {
        self.index.get(path)
    }

    fn children(&self, folder: &str) -> Vec<Item> {
        self.index.children(folder)
    }

    async fn rename(&mut self, from: &str, to: &str) -> ExplorerResult<()> {
        check_move(self, from, to)?;
        TokioFs::rename(self.abs(from), self.abs(to))
            .await
            .map_err(|e| ExplorerError::io("rename", from, e))?;
        self.index.rename(from, to).await
    }

    async fn create_folder(&mut self, key: &str) -> ExplorerResult<()> {
        if self.exists(key) {
            return Err(ExplorerError::name_conflict(key));
        }
        TokioFs::create_dir(self.abs(key))
            .await
            .map_err(|e| ExplorerError::io("create_folder", key, e))?;
        self.index.create_folder(key).await
    }

    async fn create_file(&mut self, key: &str, content: &[u8]) -> ExplorerResult<()> {
        if self.exists(key) {
            return Err(ExplorerError::name_conflict(key));
        }
        match self.get(path::parent(key)) {
            Some(parent) if parent.is_folder() => {}
            Some(_) => return Err(ExplorerError::NotAFolder(path::parent(key).to_string())),
            None => return Err(ExplorerError::NotFound(path::parent(key).to_string())),
        }
        TokioFs::write(self.abs(key), content)
            .await
            .map_err(|e| ExplorerError::io("create_file", key, e))?;
        // the index only tracks structure
        self.index.create_file(key, &[]).await
    }

    async fn delete(&mut self, key: &str, mode: DeleteMode) -> ExplorerResult<()> {
        let item = self
            .get(key)
            .filter(|item| !item.is_root())
            .ok_or_else(|| ExplorerError::NotFound(key.to_string()))?;
        let target = self.abs(key);

        let result = match (mode, item.kind) {
            (DeleteMode::Trash, _) => match self.trash_slot(&item.name).await {
                Ok(slot) => TokioFs::rename(&target, slot).await,
                Err(e) => Err(e),
            },
            (DeleteMode::Permanent, ItemKind::Folder) => TokioFs::remove_dir_all(&target).await,
            (DeleteMode::Permanent, ItemKind::File) => TokioFs::remove_file(&target).await,
        };
        result.map_err(|e| ExplorerError::io("delete", key, e))?;
        self.index.delete(key, mode).await
    }

    async fn read(&self, key: &str) -> ExplorerResult<Vec<u8>> {
        if !self.get(key).is_some_and(|item| !item.is_folder()) {
            return Err(ExplorerError::NotFound(key.to_string()));
        }
        TokioFs::read(self.abs(key))
            .await
            .map_err(|e| ExplorerError::io("read", key, e))
    }

    fn full_path(&self, key: &str) -> Option<PathBuf> {
        self.exists(key).then(|| self.abs(key))
    }

    fn take_events(&mut self) -> Option<UnboundedReceiver<TreeEvent>> {
        self.index.take_events()
    }
}
