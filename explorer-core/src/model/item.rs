//! ``src/model/item.rs``
//! ============================================================================
//! # Item: a folder or file addressed by its slash-delimited path
//!
//! Paths are vault-relative strings: no leading slash, `/` as the only
//! separator, and the root folder is the empty string.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Folder or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
}

impl ItemKind {
    #[inline]
    pub const fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }

    #[inline]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }
}

/// Snapshot of one tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub path: String,
    pub kind: ItemKind,
    pub name: CompactString,
}

impl Item {
    pub fn new(path: impl Into<String>, kind: ItemKind) -> Self {
        let path: String = path.into();
        let name = CompactString::from(path::name(&path));
        Self { path, kind, name }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self::new(path, ItemKind::Folder)
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, ItemKind::File)
    }

    #[inline]
    pub const fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Path of the containing folder (`""` for root-level items).
    pub fn parent(&self) -> &str {
        path::parent(&self.path)
    }

    /// File name without its extension; folders return their full name.
    pub fn basename(&self) -> &str {
        match self.kind {
            ItemKind::Folder => &self.name,
            ItemKind::File => path::basename(&self.name),
        }
    }

    /// Office lock files (`~$report.docx`) never show up in the explorer.
    pub fn is_ignored(&self) -> bool {
        self.kind.is_file() && self.name.starts_with("~$")
    }
}

/// String helpers for slash-delimited paths.
pub mod path {
    /// Parent folder path; root-level items and the root itself yield `""`.
    pub fn parent(path: &str) -> &str {
        match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        }
    }

    /// Final path segment.
    pub fn name(path: &str) -> &str {
        match path.rfind('/') {
            Some(idx) => &path[idx + 1..],
            None => path,
        }
    }

    /// Name without the trailing `.ext`; dot-files keep their name.
    pub fn basename(name: &str) -> &str {
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Join a folder path and a child name.
    pub fn join(folder: &str, name: &str) -> String {
        if folder.is_empty() {
            name.to_string()
        } else {
            format!("{folder}/{name}")
        }
    }

    /// Number of separators: root-level items have depth 0.
    pub fn depth(path: &str) -> usize {
        path.matches('/').count()
    }

    /// True when `path` is `ancestor` or lies anywhere below it.
    /// Only whole segments match: `Notes2` is not under `Notes`.
    pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
        if ancestor.is_empty() {
            return true;
        }
        path == ancestor
            || (path.len() > ancestor.len()
                && path.starts_with(ancestor)
                && path.as_bytes()[ancestor.len()] == b'/')
    }

    /// Re-key `path` from under `old_prefix` to under `new_prefix`.
    /// Returns `None` when `path` is not `old_prefix` or one of its descendants.
    pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
        if old_prefix.is_empty() || !is_same_or_descendant(path, old_prefix) {
            return None;
        }
        let rest = &path[old_prefix.len()..];
        if new_prefix.is_empty() {
            // moved to root: drop the separator that followed the old prefix
            Some(rest.trim_start_matches('/').to_string())
        } else {
            Some(format!("{new_prefix}{rest}"))
        }
    }

    /// Ancestor folder of `path` at `depth` segments (0 = first segment).
    /// Negative depth means the root; depths at or beyond the item's own
    /// level resolve to its parent.
    pub fn ancestor_at_depth(path: &str, depth: i64) -> String {
        if depth < 0 {
            return String::new();
        }
        let parts: Vec<&str> = path.split('/').collect();
        let depth = depth as usize;
        if depth >= parts.len().saturating_sub(1) {
            return parent(path).to_string();
        }
        parts[..=depth].join("/")
    }

    /// Valid child names are non-empty, not `.`/`..` and have no separator.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\\')
    }
}
