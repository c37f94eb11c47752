//! ``src/model/selection.rs``
//! ============================================================================
//! # SelectionModel: multi-select with anchor, range and toggle semantics
//!
//! Every operation that depends on visual order takes the current visible
//! path list (see [`crate::view::projection::visible_paths`]). Paths that
//! vanished from the tree are tolerated and dropped on the next
//! [`SelectionModel::prune`].

use indexmap::IndexSet;
use tracing::trace;

use crate::model::item::path;

/// How a pointer click combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// Replace the selection with the clicked row.
    Plain,
    /// Select the visual range between the anchor and the clicked row.
    Range,
    /// Add or remove the clicked row.
    Toggle,
}

/// Keyboard cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: IndexSet<String>,
    anchor: Option<String>,
    cursor: Option<String>,
}

impl SelectionModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Row the keyboard cursor sits on; falls back to the anchor.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().or(self.anchor.as_deref())
    }

    /// Selected paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Selected paths in the order they appear on screen.
    pub fn in_visual_order(&self, visible: &[String]) -> Vec<String> {
        visible
            .iter()
            .filter(|p| self.selected.contains(p.as_str()))
            .cloned()
            .collect()
    }

    /* ------------------------------ clicks ----------------------------- */

    pub fn click(&mut self, target: &str, kind: ClickKind, visible: &[String]) {
        match kind {
            ClickKind::Plain => self.select_only(target),
            ClickKind::Range => match self.anchor.clone() {
                Some(anchor) => {
                    self.select_range(&anchor, target, visible);
                    self.cursor = Some(target.to_string());
                }
                None => self.select_only(target),
            },
            ClickKind::Toggle => {
                if !self.selected.shift_remove(target) {
                    self.selected.insert(target.to_string());
                }
                // a modifier click never leaves the selection empty
                if self.selected.is_empty() {
                    self.selected.insert(target.to_string());
                }
                self.anchor = Some(target.to_string());
                self.cursor = Some(target.to_string());
            }
        }
        trace!(path = target, ?kind, selected = self.selected.len(), "selection click");
    }

    pub fn select_only(&mut self, target: &str) {
        self.selected.clear();
        self.selected.insert(target.to_string());
        self.anchor = Some(target.to_string());
        self.cursor = Some(target.to_string());
    }

    /// Replace the selection with the inclusive visual slice between `from`
    /// and `to`. Falls back to `{to}` when either end is not visible.
    fn select_range(&mut self, from: &str, to: &str, visible: &[String]) {
        let start = visible.iter().position(|p| p == from);
        let end = visible.iter().position(|p| p == to);
        self.selected.clear();
        match (start, end) {
            (Some(start), Some(end)) => {
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                self.selected.extend(visible[lo..=hi].iter().cloned());
            }
            _ => {
                self.selected.insert(to.to_string());
            }
        }
    }

    pub fn select_all(&mut self, visible: &[String]) {
        self.selected.clear();
        self.selected.extend(visible.iter().cloned());
        self.anchor = visible.first().cloned();
        self.cursor = self.anchor.clone();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
        self.cursor = None;
    }

    /* ----------------------------- keyboard ---------------------------- */

    /// Move the keyboard cursor. With `extend` the selection becomes the
    /// range from the anchor to the new cursor row; otherwise the new row is
    /// selected alone. Returns the row the cursor landed on.
    pub fn move_cursor(
        &mut self,
        movement: CursorMove,
        extend: bool,
        visible: &[String],
    ) -> Option<String> {
        if visible.is_empty() {
            return None;
        }
        let current = self
            .cursor()
            .and_then(|c| visible.iter().position(|p| p == c));
        let last = visible.len() - 1;
        let next = match (movement, current) {
            (CursorMove::Home, _) => 0,
            (CursorMove::End, _) => last,
            (CursorMove::Up, Some(idx)) => idx.saturating_sub(1),
            (CursorMove::Down, Some(idx)) => (idx + 1).min(last),
            (CursorMove::Up, None) => last,
            (CursorMove::Down, None) => 0,
        };
        let target = visible[next].clone();

        match self.anchor.clone() {
            Some(anchor) if extend => {
                self.select_range(&anchor, &target, visible);
                self.cursor = Some(target.clone());
            }
            _ => self.select_only(&target),
        }
        Some(target)
    }

    /// Select the folder containing the cursor row. Root-level rows have no
    /// parent to move to.
    pub fn focus_parent(&mut self) -> Option<String> {
        let cursor = self.cursor()?;
        let parent = path::parent(cursor).to_string();
        if parent.is_empty() {
            return None;
        }
        self.select_only(&parent);
        Some(parent)
    }

    /* ------------------------- tree maintenance ------------------------ */

    /// Drop paths that no longer exist.
    pub fn prune(&mut self, exists: impl Fn(&str) -> bool) {
        self.selected.retain(|p| exists(p));
        if self.anchor.as_deref().is_some_and(|a| !exists(a)) {
            self.anchor = None;
        }
        if self.cursor.as_deref().is_some_and(|c| !exists(c)) {
            self.cursor = None;
        }
    }

    /// Drop `prefix` and everything below it.
    pub fn remove_prefix(&mut self, prefix: &str) {
        self.prune(|p| !path::is_same_or_descendant(p, prefix));
    }

    /// Re-key selected paths, the anchor and the cursor after a rename.
    pub fn rewrite_prefix(&mut self, old: &str, new: &str) {
        let rekey = |p: &String| path::rebase(p, old, new).unwrap_or_else(|| p.clone());
        self.selected = self.selected.iter().map(rekey).collect();
        self.anchor = self.anchor.as_ref().map(rekey);
        self.cursor = self.cursor.as_ref().map(rekey);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible() -> Vec<String> {
        ["A", "A/x.md", "A/y.md", "b.md", "c.md"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn selected(model: &SelectionModel) -> Vec<&str> {
        model.paths().collect()
    }

    #[test]
    fn test_range_click_selects_exact_slice_and_keeps_anchor() {
        let rows = visible();
        let mut model = SelectionModel::new();
        model.click("A/y.md", ClickKind::Plain, &rows);
        model.click("c.md", ClickKind::Range, &rows);
        assert_eq!(selected(&model), ["A/y.md", "b.md", "c.md"]);
        assert_eq!(model.anchor(), Some("A/y.md"));

        // shrinking the range drops rows outside it
        model.click("A/x.md", ClickKind::Range, &rows);
        assert_eq!(selected(&model), ["A/x.md", "A/y.md"]);
        assert_eq!(model.anchor(), Some("A/y.md"));
    }

    #[test]
    fn test_range_click_without_anchor_is_plain() {
        let rows = visible();
        let mut model = SelectionModel::new();
        model.click("b.md", ClickKind::Range, &rows);
        assert_eq!(selected(&model), ["b.md"]);
        assert_eq!(model.anchor(), Some("b.md"));
    }

    #[test]
    fn test_toggle_never_empties_selection() {
        let rows = visible();
        let mut model = SelectionModel::new();
        model.click("b.md", ClickKind::Toggle, &rows);
        model.click("c.md", ClickKind::Toggle, &rows);
        assert_eq!(model.len(), 2);
        assert_eq!(model.anchor(), Some("c.md"));

        model.click("c.md", ClickKind::Toggle, &rows);
        assert_eq!(selected(&model), ["b.md"]);
        model.click("b.md", ClickKind::Toggle, &rows);
        assert_eq!(selected(&model), ["b.md"]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let rows = visible();
        let mut model = SelectionModel::new();
        model.select_all(&rows);
        assert_eq!(model.len(), 5);
        assert_eq!(model.anchor(), Some("A"));
        model.clear();
        assert!(model.is_empty());
        assert_eq!(model.anchor(), None);
    }

    #[test]
    fn test_keyboard_navigation_and_extend() {
        let rows = visible();
        let mut model = SelectionModel::new();
        assert_eq!(model.move_cursor(CursorMove::Down, false, &rows).as_deref(), Some("A"));
        model.move_cursor(CursorMove::Down, false, &rows);
        model.move_cursor(CursorMove::Down, true, &rows);
        model.move_cursor(CursorMove::Down, true, &rows);
        assert_eq!(selected(&model), ["A/x.md", "A/y.md", "b.md"]);
        assert_eq!(model.anchor(), Some("A/x.md"));

        model.move_cursor(CursorMove::End, false, &rows);
        assert_eq!(selected(&model), ["c.md"]);
        model.move_cursor(CursorMove::Up, false, &rows);
        assert_eq!(model.focus_parent(), None);

        model.click("A/x.md", ClickKind::Plain, &rows);
        assert_eq!(model.focus_parent().as_deref(), Some("A"));
        assert_eq!(selected(&model), ["A"]);
    }

    #[test]
    fn test_rename_and_delete_maintenance() {
        let rows = visible();
        let mut model = SelectionModel::new();
        model.select_all(&rows);

        model.rewrite_prefix("A", "Archive/A");
        assert!(model.is_selected("Archive/A/x.md"));
        assert_eq!(model.anchor(), Some("Archive/A"));

        model.remove_prefix("Archive/A");
        assert_eq!(selected(&model), ["b.md", "c.md"]);
        assert_eq!(model.anchor(), None);

        model.prune(|p| p != "c.md");
        assert_eq!(selected(&model), ["b.md"]);
    }
}
