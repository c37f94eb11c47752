//! ``src/operators/propagator.rs``
//! ============================================================================
//! # Propagator: keep persisted order and selection in step with the tree
//!
//! Provider notifications arrive at least once and in no particular order
//! relative to the explorer's own edits, so every handler is idempotent: a
//! replayed rename finds no keys under the old path, a replayed delete finds
//! nothing to remove.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, trace};

use crate::model::order_store::OrderStore;
use crate::model::selection::SelectionModel;
use crate::model::tree::{TreeEvent, TreeProvider};

/// Apply one notification. Returns true when the view needs a rebuild.
pub fn apply(event: &TreeEvent, order: &mut OrderStore, selection: &mut SelectionModel) -> bool {
    trace!(?event, "propagating tree event");
    match event {
        TreeEvent::Created { .. } => true,
        TreeEvent::Deleted { path } => {
            order.remove_prefix(path);
            selection.remove_prefix(path);
            true
        }
        TreeEvent::Renamed { old_path, new_path } => {
            order.rewrite_prefix(old_path, new_path);
            selection.rewrite_prefix(old_path, new_path);
            true
        }
    }
}

/// Full rebuild: drop every order entry and selected path that no longer
/// resolves in `tree`. Returns how many order entries were removed.
pub fn sweep(
    tree: &(impl TreeProvider + ?Sized),
    order: &mut OrderStore,
    selection: &mut SelectionModel,
) -> usize {
    let removed = order.sweep(|path| tree.exists(path));
    selection.prune(|path| tree.exists(path));
    if removed > 0 {
        debug!(removed, "cleaned up settings for deleted paths");
    }
    removed
}

/// Owns the provider's event stream.
#[derive(Debug)]
pub struct Propagator {
    events: UnboundedReceiver<TreeEvent>,
}

impl Propagator {
    pub const fn new(events: UnboundedReceiver<TreeEvent>) -> Self {
        Self { events }
    }

    /// Apply every event already queued without waiting. Returns the number
    /// of events handled.
    pub fn drain(&mut self, order: &mut OrderStore, selection: &mut SelectionModel) -> usize {
        let mut handled = 0;
        while let Some(event) = self.try_next() {
            apply(&event, order, selection);
            handled += 1;
        }
        handled
    }

    /// Next queued event, without waiting.
    pub fn try_next(&mut self) -> Option<TreeEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next event. `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<TreeEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory_tree::MemoryTree;
    use crate::model::selection::ClickKind;
    use crate::model::tree::DeleteMode;

    #[test]
    fn test_rename_event_rekeys_order_and_selection() {
        let mut order = OrderStore::new();
        order.set_rank("Notes/a.md", 0);
        order.set_collapsed("Notes", true);
        let mut selection = SelectionModel::new();
        let visible = vec!["Notes".to_string(), "Notes/a.md".to_string()];
        selection.click("Notes/a.md", ClickKind::Plain, &visible);

        let event = TreeEvent::Renamed {
            old_path: "Notes".into(),
            new_path: "Archive/Notes".into(),
        };
        assert!(apply(&event, &mut order, &mut selection));
        assert_eq!(order.rank("Archive/Notes/a.md"), Some(0));
        assert!(order.is_collapsed("Archive/Notes"));
        assert!(selection.is_selected("Archive/Notes/a.md"));

        // duplicate delivery leaves everything as it is
        let snapshot = order.clone();
        apply(&event, &mut order, &mut selection);
        assert_eq!(order, snapshot);
    }

    #[test]
    fn test_delete_event_cascades() {
        let mut order = OrderStore::new();
        order.set_rank("Notes", 1);
        order.set_rank("Notes/a.md", 0);
        order.set_rank("Notes/Sub/b.md", 0);
        order.set_rank("Notesbook.md", 2);
        let mut selection = SelectionModel::new();

        apply(
            &TreeEvent::Deleted { path: "Notes".into() },
            &mut order,
            &mut selection,
        );
        assert_eq!(order.ranks().keys().collect::<Vec<_>>(), ["Notesbook.md"]);
    }

    #[test]
    fn test_sweep_drops_stale_entries() {
        let tree = MemoryTree::from_paths(["a.md"]);
        let mut order = OrderStore::new();
        order.set_rank("a.md", 0);
        order.set_rank("gone.md", 1);
        order.set_collapsed("Gone", true);
        let mut selection = SelectionModel::new();
        selection.select_all(&["a.md".to_string(), "gone.md".to_string()]);

        assert_eq!(sweep(&tree, &mut order, &mut selection), 2);
        assert_eq!(order.ranks().len(), 1);
        assert_eq!(selection.paths().collect::<Vec<_>>(), ["a.md"]);
    }

    #[tokio::test]
    async fn test_drain_consumes_provider_events() {
        let mut tree = MemoryTree::from_paths(["Notes/a.md", "b.md"]);
        let mut propagator = Propagator::new(tree.take_events().unwrap());
        let mut order = OrderStore::new();
        order.set_rank("Notes/a.md", 3);
        let mut selection = SelectionModel::new();

        tree.rename("Notes", "Old").await.unwrap();
        tree.delete("b.md", DeleteMode::Trash).await.unwrap();
        assert_eq!(propagator.drain(&mut order, &mut selection), 2);
        assert_eq!(order.rank("Old/a.md"), Some(3));
        assert_eq!(propagator.drain(&mut order, &mut selection), 0);
    }
}
