//! ``src/operators/drop_zone.rs``
//! ============================================================================
//! # Drop-zone classification
//!
//! Pure function from a pointer position plus the on-screen row boxes to the
//! structural intent of a drop. Coordinates are container-relative pixels.
//!
//! Zones, first match wins:
//! 1. left gutter or whitespace -> root (top strip inserts first)
//! 2. dragging a single item over itself -> nothing
//! 3. pointer far left of the row's indent -> un-indent to an ancestor
//! 4. middle band of a folder row -> into that folder
//! 5. upper half -> before the row; lower half -> before the next sibling,
//!    or after the row when it is the last sibling

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::item::{ItemKind, path};

/// Pixel and ratio thresholds for drop classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropGeometry {
    /// Pointer x below this always targets the root.
    pub root_gutter: f64,
    /// Whitespace y below this inserts at the top of the root.
    pub top_whitespace: f64,
    /// Fraction of a folder row's height above and below the center band.
    pub folder_edge_ratio: f64,
    /// Left padding of a depth-0 folder row.
    pub indent_base: f64,
    /// Extra indentation per depth level.
    pub indent_step: f64,
    /// Extra left padding of file rows compared to folder rows.
    pub file_indent_offset: f64,
    /// How far left of a row's indent the pointer must be to un-indent.
    pub unindent_slack: f64,
}

impl Default for DropGeometry {
    fn default() -> Self {
        Self {
            root_gutter: 30.0,
            top_whitespace: 40.0,
            folder_edge_ratio: 0.3,
            indent_base: 8.0,
            indent_step: 16.0,
            file_indent_offset: 12.0,
            unindent_slack: 20.0,
        }
    }
}

impl DropGeometry {
    /// Left indent of a row at `depth`.
    pub fn row_indent(&self, kind: ItemKind, depth: usize) -> f64 {
        let base = match kind {
            ItemKind::Folder => self.indent_base,
            ItemKind::File => self.indent_base + self.file_indent_offset,
        };
        base + self.indent_step * depth as f64
    }

    /// Depth level an x offset corresponds to. Negative left of the first level.
    pub fn depth_at(&self, x: f64) -> i64 {
        ((x - self.indent_base) / self.indent_step).floor() as i64
    }
}

/// Container-relative pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Layout of one visible row, in visual order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBox {
    pub path: String,
    pub kind: ItemKind,
    pub top: f64,
    pub height: f64,
    /// Row indent (where the row's content starts).
    pub left: f64,
}

impl RowBox {
    fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// Where a drop would land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Dragged onto itself; nothing happens.
    None,
    /// Move into the folder.
    IntoFolder { folder: String },
    /// Reorder relative to `target` within its sibling group.
    Reorder { target: String, insert_before: bool },
    /// Move to the root, first (`top`) or last.
    Root { top: bool },
    /// Un-indent gesture: move into this ancestor (`""` is the root).
    Ancestor { folder: String },
}

impl DropTarget {
    /// Folder the dropped items end up in, given the hovered parent for
    /// sibling reorders.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::IntoFolder { folder } | Self::Ancestor { folder } => Some(folder),
            Self::Reorder { target, .. } => Some(path::parent(target)),
            Self::Root { .. } => Some(""),
        }
    }
}

fn row_at<'a>(rows: &'a [RowBox], pointer: Pointer) -> Option<(usize, &'a RowBox)> {
    rows.iter()
        .enumerate()
        .find(|(_, row)| row.contains_y(pointer.y))
}

/// Next row in the same sibling group, skipping the descendants of `idx`.
fn next_sibling(rows: &[RowBox], idx: usize) -> Option<&RowBox> {
    let current = &rows[idx];
    let parent = path::parent(&current.path);
    rows[idx + 1..]
        .iter()
        .find(|row| !path::is_same_or_descendant(&row.path, &current.path))
        .filter(|row| path::parent(&row.path) == parent)
}

/// Classify an internal drag. `dragged` is the payload in visual order.
pub fn classify_drop_zone(
    pointer: Pointer,
    rows: &[RowBox],
    dragged: &[String],
    geometry: &DropGeometry,
) -> DropTarget {
    let hovered = row_at(rows, pointer);
    let Some((idx, row)) = hovered.filter(|_| pointer.x >= geometry.root_gutter) else {
        return DropTarget::Root {
            top: pointer.y < geometry.top_whitespace,
        };
    };

    if dragged.len() == 1 && dragged[0] == row.path {
        return DropTarget::None;
    }

    let row_depth = geometry.depth_at(row.left);
    let pointer_depth = geometry.depth_at(pointer.x);
    if pointer_depth < row_depth - 1 && pointer.x < row.left - geometry.unindent_slack {
        let folder = path::ancestor_at_depth(&row.path, pointer_depth);
        trace!(row = %row.path, pointer_depth, %folder, "un-indent zone");
        return DropTarget::Ancestor { folder };
    }

    let offset = pointer.y - row.top;
    if row.kind.is_folder() {
        let edge = row.height * geometry.folder_edge_ratio;
        if offset > edge && offset < row.height - edge {
            return DropTarget::IntoFolder {
                folder: row.path.clone(),
            };
        }
    }

    if offset < row.height / 2.0 {
        return DropTarget::Reorder {
            target: row.path.clone(),
            insert_before: true,
        };
    }
    match next_sibling(rows, idx) {
        Some(next) => DropTarget::Reorder {
            target: next.path.clone(),
            insert_before: true,
        },
        None => DropTarget::Reorder {
            target: row.path.clone(),
            insert_before: false,
        },
    }
}

/// Folder that receives files dragged in from outside the explorer.
pub fn classify_external_drop(pointer: Pointer, rows: &[RowBox], geometry: &DropGeometry) -> String {
    if pointer.x < geometry.root_gutter {
        return String::new();
    }
    match row_at(rows, pointer) {
        Some((_, row)) if row.kind.is_folder() => row.path.clone(),
        Some((_, row)) => path::parent(&row.path).to_string(),
        None => String::new(),
    }
}
