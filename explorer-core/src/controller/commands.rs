//! src/controller/commands.rs
//! ============================================================================
//! # Commands: what the host may offer for the current selection
//!
//! A single selected item gets the full per-item surface. Once more than one
//! item is selected only the bulk commands remain.
//!
//! Also holds the two seams the host implements: [`Notifier`] for
//! user-visible messages and [`BookmarkSink`] for bookmarks.

use tracing::{info, warn};

use crate::error::ExplorerResult;
use crate::model::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    NewNote,
    NewBaseFile,
    NewCanvas,
    NewFolder,
    /// Create a folder and move the selection into it.
    NewFolderWithSelection,
    Rename,
    /// Copy the item next to itself as `name copy`.
    Duplicate,
    MoveTo,
    Bookmark,
    Delete,
    CopyPath,
    CopyRelativePath,
    OpenInNewTab,
    ToggleFolder,
    ExpandAll,
    CollapseAll,
}

impl Command {
    /// Commands that apply to every selected item at once.
    #[must_use]
    pub const fn is_bulk(self) -> bool {
        matches!(
            self,
            Self::NewFolderWithSelection | Self::MoveTo | Self::Bookmark | Self::Delete
        )
    }
}

const ALL: [Command; 16] = [
    Command::NewNote,
    Command::NewBaseFile,
    Command::NewCanvas,
    Command::NewFolder,
    Command::NewFolderWithSelection,
    Command::Rename,
    Command::Duplicate,
    Command::MoveTo,
    Command::Bookmark,
    Command::Delete,
    Command::CopyPath,
    Command::CopyRelativePath,
    Command::OpenInNewTab,
    Command::ToggleFolder,
    Command::ExpandAll,
    Command::CollapseAll,
];

/// Commands for a selection of `selected` items whose primary item is
/// `primary`.
pub fn available_commands(selected: usize, primary: Option<&Item>) -> Vec<Command> {
    if selected > 1 {
        return ALL.into_iter().filter(|c| c.is_bulk()).collect();
    }
    let is_folder = primary.is_some_and(Item::is_folder);
    ALL.into_iter()
        .filter(|c| match c {
            Command::ToggleFolder => is_folder,
            Command::OpenInNewTab => primary.is_some_and(|item| !item.is_folder()),
            Command::Rename
            | Command::Duplicate
            | Command::MoveTo
            | Command::Bookmark
            | Command::Delete
            | Command::CopyPath
            | Command::CopyRelativePath => primary.is_some_and(|item| !item.is_root()),
            _ => true,
        })
        .collect()
}

/* ============================ host seams ============================ */

/// Shows short messages to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "user notification");
    }
}

/// Receives items the user bookmarks.
pub trait BookmarkSink: Send {
    fn add(&mut self, item: &Item) -> ExplorerResult<()>;
}

/// Collects bookmarks in memory.
#[derive(Debug, Default, Clone)]
pub struct BookmarkList {
    pub items: Vec<Item>,
}

impl BookmarkSink for BookmarkList {
    fn add(&mut self, item: &Item) -> ExplorerResult<()> {
        if !self.items.iter().any(|known| known.path == item.path) {
            info!(path = %item.path, "bookmarked");
            self.items.push(item.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_selection_only_offers_bulk_commands() {
        let commands = available_commands(3, Some(&Item::file("a.md")));
        assert_eq!(
            commands,
            vec![
                Command::NewFolderWithSelection,
                Command::MoveTo,
                Command::Bookmark,
                Command::Delete
            ]
        );
    }

    #[test]
    fn test_single_item_surface_depends_on_kind() {
        let folder = available_commands(1, Some(&Item::folder("Notes")));
        assert!(folder.contains(&Command::ToggleFolder));
        assert!(!folder.contains(&Command::OpenInNewTab));

        let file = available_commands(1, Some(&Item::file("a.md")));
        assert!(file.contains(&Command::OpenInNewTab));
        assert!(file.contains(&Command::Rename));
        assert!(file.contains(&Command::Duplicate));
        assert!(file.contains(&Command::CopyRelativePath));

        let root = available_commands(0, Some(&Item::folder("")));
        assert!(!root.contains(&Command::Delete));
        assert!(!root.contains(&Command::Duplicate));
        assert!(!root.contains(&Command::CopyPath));
        assert!(root.contains(&Command::NewNote));
        assert!(root.contains(&Command::NewCanvas));
    }

    #[test]
    fn test_bookmark_list_ignores_duplicates() {
        let mut sink = BookmarkList::default();
        sink.add(&Item::file("a.md")).unwrap();
        sink.add(&Item::file("a.md")).unwrap();
        assert_eq!(sink.items.len(), 1);
    }
}
