//! ``src/view/projection.rs``
//! ============================================================================
//! # Render projection: the tree flattened into display rows
//!
//! Depth-first in sort-engine order. Children of collapsed folders are not
//! emitted. The row list is rebuilt in full after every mutation; it is the
//! single source of visual order for selection and drag handling.

use compact_str::CompactString;

use crate::model::item::ItemKind;
use crate::model::order_store::OrderStore;
use crate::model::selection::SelectionModel;
use crate::model::settings::ExplorerSettings;
use crate::model::sort;
use crate::model::tree::TreeProvider;
use crate::operators::drop_zone::{DropGeometry, RowBox};

/// One visible line of the explorer.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub path: String,
    pub kind: ItemKind,
    pub depth: usize,
    /// Text shown for the row.
    pub label: CompactString,
    /// Icon name, when icons are enabled. Folders use the collapse marker.
    pub icon: Option<&'static str>,
    /// Small extension badge shown next to the label.
    pub badge: Option<&'static str>,
    pub collapsed: bool,
    pub selected: bool,
    /// Row of the file open in the editor.
    pub active: bool,
    /// Left padding in pixels.
    pub indent: f64,
}

/// Icon for a file by extension.
pub fn file_icon(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "canvas" => "layout-dashboard",
        "base" => "layout-list",
        "png" | "jpg" | "jpeg" | "gif" | "svg" => "image",
        "mp4" | "webm" | "mov" => "film",
        "mp3" | "wav" | "ogg" => "audio-file",
        "pdf" => "file-text",
        "zip" | "rar" | "7z" => "archive",
        _ => "document",
    }
}

fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}

/// Everything the projection reads, borrowed for one rebuild.
pub struct ProjectionInput<'a, P: TreeProvider + ?Sized> {
    pub tree: &'a P,
    pub order: &'a OrderStore,
    pub selection: &'a SelectionModel,
    pub settings: &'a ExplorerSettings,
    pub geometry: &'a DropGeometry,
    pub active: Option<&'a str>,
}

pub fn project<P: TreeProvider + ?Sized>(input: &ProjectionInput<'_, P>) -> Vec<Row> {
    let mut rows = Vec::new();
    push_children(input, "", 0, &mut rows);
    rows
}

fn push_children<P: TreeProvider + ?Sized>(
    input: &ProjectionInput<'_, P>,
    folder: &str,
    depth: usize,
    rows: &mut Vec<Row>,
) {
    for item in sort::sorted_children(input.tree, folder, input.order) {
        let collapsed = item.is_folder() && input.order.is_collapsed(&item.path);
        let label = if item.kind.is_file() && input.settings.hide_file_extensions {
            CompactString::from(item.basename())
        } else {
            item.name.clone()
        };
        let ext = extension(&item.name);
        let icon = (item.kind.is_file() && input.settings.show_icons).then(|| file_icon(ext));
        let badge = (item.kind.is_file() && input.settings.show_base_badge && ext == "base")
            .then_some("BASE");

        rows.push(Row {
            kind: item.kind,
            depth,
            label,
            icon,
            badge,
            collapsed,
            selected: input.selection.is_selected(&item.path),
            active: input.active == Some(item.path.as_str()),
            indent: input.geometry.row_indent(item.kind, depth),
            path: item.path.clone(),
        });

        if item.is_folder() && !collapsed {
            push_children(input, &item.path, depth + 1, rows);
        }
    }
}

/// Paths of the rows, in visual order.
pub fn visible_paths(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| row.path.clone()).collect()
}

/// Stack rows vertically at a fixed height, starting at `top`.
pub fn layout(rows: &[Row], top: f64, row_height: f64) -> Vec<RowBox> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| RowBox {
            path: row.path.clone(),
            kind: row.kind,
            top: top + i as f64 * row_height,
            height: row_height,
            left: row.indent,
        })
        .collect()
}

/// Render rows as indented text, one per line.
pub fn render_text(rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        let marker = match (row.kind, row.collapsed) {
            (ItemKind::Folder, true) => "▸ ",
            (ItemKind::Folder, false) => "▾ ",
            (ItemKind::File, _) => "  ",
        };
        out.push_str(&"  ".repeat(row.depth));
        out.push_str(marker);
        out.push_str(&row.label);
        if let Some(badge) = row.badge {
            out.push_str(" [");
            out.push_str(badge);
            out.push(']');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory_tree::MemoryTree;
    use crate::model::selection::ClickKind;

    struct Fixture {
        tree: MemoryTree,
        order: OrderStore,
        selection: SelectionModel,
        settings: ExplorerSettings,
        geometry: DropGeometry,
    }

    impl Fixture {
        fn new(paths: &[&str]) -> Self {
            Self {
                tree: MemoryTree::from_paths(paths),
                order: OrderStore::new(),
                selection: SelectionModel::new(),
                settings: ExplorerSettings::default(),
                geometry: DropGeometry::default(),
            }
        }

        fn rows(&self, active: Option<&str>) -> Vec<Row> {
            project(&ProjectionInput {
                tree: &self.tree,
                order: &self.order,
                selection: &self.selection,
                settings: &self.settings,
                geometry: &self.geometry,
                active,
            })
        }
    }

    #[test]
    fn test_depth_first_sorted_with_indents() {
        let fx = Fixture::new(&["b.md", "Z/", "Z/y.md", "Z/A/", "a.md"]);
        let rows = fx.rows(None);
        assert_eq!(visible_paths(&rows), ["Z", "Z/A", "Z/y.md", "a.md", "b.md"]);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[1].indent, 24.0);
        assert_eq!(rows[2].indent, 36.0);
        assert_eq!(rows[3].indent, 20.0);
    }

    #[test]
    fn test_collapsed_folder_hides_children() {
        let mut fx = Fixture::new(&["Z/y.md", "a.md"]);
        fx.order.set_collapsed("Z", true);
        let rows = fx.rows(None);
        assert_eq!(visible_paths(&rows), ["Z", "a.md"]);
        assert!(rows[0].collapsed);
        assert_eq!(render_text(&rows), "▸ Z\n  a.md\n");
    }

    #[test]
    fn test_labels_icons_and_flags() {
        let mut fx = Fixture::new(&["Tasks.base", "photo.PNG", "note.md"]);
        fx.settings.hide_file_extensions = true;
        fx.settings.show_base_badge = true;
        let visible = visible_paths(&fx.rows(None));
        fx.selection.click("note.md", ClickKind::Plain, &visible);

        let rows = fx.rows(Some("photo.PNG"));
        let by_path = |p: &str| rows.iter().find(|row| row.path == p).unwrap();
        assert_eq!(by_path("Tasks.base").label, "Tasks");
        assert_eq!(by_path("Tasks.base").badge, Some("BASE"));
        assert_eq!(by_path("Tasks.base").icon, Some("layout-list"));
        assert_eq!(by_path("photo.PNG").icon, Some("image"));
        assert!(by_path("photo.PNG").active);
        assert!(by_path("note.md").selected);
        assert!(!by_path("photo.PNG").selected);
    }

    #[test]
    fn test_layout_stacks_rows() {
        let fx = Fixture::new(&["A/", "A/x.md"]);
        let boxes = layout(&fx.rows(None), 4.0, 24.0);
        assert_eq!(boxes[1].top, 28.0);
        assert_eq!(boxes[1].left, 36.0);
    }
}
