//! ``src/controller/explorer.rs``
//! ============================================================================
//! # Explorer: the state owner the host talks to
//!
//! Owns the tree provider, the order store, the selection, the drag session
//! and the projected rows. Every operation mutates state, drains pending
//! provider events and re-projects once at the end, so [`Explorer::rows`]
//! always reflects the latest tree.
//!
//! Settings reach disk through an optional [`SettingsWriter`]; without one
//! the explorer still keeps [`Explorer::settings`] current.

use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::controller::commands::{BookmarkSink, Command, LogNotifier, Notifier, available_commands};
use crate::error::{ExplorerError, ExplorerResult};
use crate::fs::settings_store::SettingsWriter;
use crate::model::item::{Item, path};
use crate::model::order_store::OrderStore;
use crate::model::selection::{ClickKind, CursorMove, SelectionModel};
use crate::model::settings::{ExplorerSettings, ModifierAction};
use crate::model::tree::{DeleteMode, TreeEvent, TreeProvider};
use crate::operators::drag_session::{DragPayload, DragSession, NativeFile};
use crate::operators::drop_zone::{DropTarget, Pointer, RowBox};
use crate::operators::propagator::{self, Propagator};
use crate::operators::reconciler::{self, BatchReport};
use crate::view::projection::{self, ProjectionInput, Row};

/// Content of a freshly created `.base` file.
pub const BASE_TEMPLATE: &str = "views:\n  - type: table\n    name: Table\n";

const UNTITLED: &str = "Untitled";

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS.
    pub platform: bool,
}

/// What a click asks the host to do beyond updating the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Selection changed, nothing to open.
    Selected,
    /// Folder expanded or collapsed.
    Toggled { collapsed: bool },
    /// Open the file, in a new tab when `new_tab`.
    Open { path: String, new_tab: bool },
}

pub struct Explorer<P: TreeProvider> {
    tree: P,
    order: OrderStore,
    selection: SelectionModel,
    settings: ExplorerSettings,
    settings_dirty: bool,
    drag: DragSession,
    propagator: Option<Propagator>,
    writer: Option<SettingsWriter>,
    notifier: Box<dyn Notifier>,
    active: Option<String>,
    rows: Vec<Row>,
    row_height: f64,
}

impl<P: TreeProvider> Explorer<P> {
    pub fn new(mut tree: P, settings: ExplorerSettings, config: &Config) -> Self {
        let propagator = tree.take_events().map(Propagator::new);
        let mut explorer = Self {
            order: OrderStore::from_settings(&settings),
            selection: SelectionModel::new(),
            settings,
            settings_dirty: false,
            drag: DragSession::new(config.geometry.clone(), config.drag.frame_interval),
            propagator,
            writer: None,
            notifier: Box::new(LogNotifier),
            active: None,
            rows: Vec::new(),
            row_height: config.drag.row_height,
            tree,
        };
        explorer.project();
        explorer
    }

    #[must_use]
    pub fn with_writer(mut self, writer: SettingsWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /* ============================ accessors ============================ */

    pub const fn tree(&self) -> &P {
        &self.tree
    }

    /// Direct provider access. Changes made here are picked up through the
    /// provider's events on the next [`Self::handle_events`].
    pub const fn tree_mut(&mut self) -> &mut P {
        &mut self.tree
    }

    pub const fn order(&self) -> &OrderStore {
        &self.order
    }

    pub const fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub const fn settings(&self) -> &ExplorerSettings {
        &self.settings
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub const fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// Paths of the visible rows, top to bottom.
    pub fn visible(&self) -> Vec<String> {
        projection::visible_paths(&self.rows)
    }

    /// Row boxes for hit testing, stacked from y = 0.
    pub fn row_boxes(&self) -> Vec<RowBox> {
        projection::layout(&self.rows, 0.0, self.row_height)
    }

    pub fn commands(&self) -> Vec<Command> {
        let primary = self
            .selection
            .cursor()
            .and_then(|p| self.tree.get(p))
            .unwrap_or_else(|| self.tree.root());
        available_commands(self.selection.len(), Some(&primary))
    }

    /* =========================== maintenance =========================== */

    fn project(&mut self) {
        let rows = projection::project(&ProjectionInput {
            tree: &self.tree,
            order: &self.order,
            selection: &self.selection,
            settings: &self.settings,
            geometry: self.drag.geometry(),
            active: self.active.as_deref(),
        });
        self.rows = rows;
    }

    /// Apply queued provider events, then re-project. Returns how many
    /// events were handled.
    pub fn handle_events(&mut self) -> usize {
        let mut handled = 0;
        if let Some(propagator) = self.propagator.as_mut() {
            while let Some(event) = propagator.try_next() {
                propagator::apply(&event, &mut self.order, &mut self.selection);
                if let TreeEvent::Renamed { old_path, new_path } = &event {
                    Self::follow(&mut self.active, old_path, new_path);
                }
                handled += 1;
            }
        }
        if self.active.as_deref().is_some_and(|a| !self.tree.exists(a)) {
            self.active = None;
        }
        self.project();
        handled
    }

    /// Full rebuild: forget settings for paths that are gone.
    pub fn rebuild(&mut self) -> usize {
        self.handle_events();
        let removed = propagator::sweep(&self.tree, &mut self.order, &mut self.selection);
        self.project();
        removed
    }

    fn follow(active: &mut Option<String>, old: &str, new: &str) {
        if let Some(moved) = active.as_deref().and_then(|a| path::rebase(a, old, new)) {
            *active = Some(moved);
        }
    }

    fn follow_moves(&mut self, moved: &[(String, String)]) {
        for (old, new) in moved {
            self.selection.rewrite_prefix(old, new);
            Self::follow(&mut self.active, old, new);
        }
    }

    fn report(&self, report: &BatchReport) {
        for (path, err) in &report.failures {
            self.notifier.notify(&format!("{path}: {err}"));
        }
    }

    /// Hand changed settings to the writer.
    pub async fn persist(&mut self) {
        let order_dirty = self.order.take_dirty();
        if !order_dirty && !self.settings_dirty {
            return;
        }
        self.settings_dirty = false;
        self.order.write_into(&mut self.settings);
        if let Some(writer) = &self.writer {
            writer.submit(self.settings.clone()).await;
        }
    }

    /// Persist and wait until the settings are on disk.
    pub async fn flush(&mut self) -> ExplorerResult<()> {
        self.persist().await;
        match &self.writer {
            Some(writer) => writer.flush().await,
            None => Ok(()),
        }
    }

    pub async fn shutdown(mut self) -> ExplorerResult<()> {
        self.persist().await;
        match self.writer.take() {
            Some(writer) => writer.shutdown().await,
            None => Ok(()),
        }
    }

    async fn finish(&mut self) {
        self.handle_events();
        self.persist().await;
    }

    /// Change display settings and re-project.
    pub async fn update_settings(&mut self, edit: impl FnOnce(&mut ExplorerSettings)) {
        edit(&mut self.settings);
        self.settings_dirty = true;
        self.project();
        self.persist().await;
    }

    /// The host reports which file is open.
    pub fn set_active(&mut self, active: Option<&str>) {
        self.active = active.map(str::to_string);
        self.project();
    }

    /* ============================== clicks ============================= */

    #[instrument(level = "debug", skip(self))]
    pub async fn click(&mut self, target: &str, modifiers: Modifiers) -> Option<ClickEffect> {
        let item = self.tree.get(target)?;
        let visible = self.visible();
        let select_multiple = self.settings.modifier_action == ModifierAction::SelectMultiple;

        let effect = if modifiers.shift {
            self.selection.click(target, ClickKind::Range, &visible);
            ClickEffect::Selected
        } else if modifiers.platform && select_multiple {
            self.selection.click(target, ClickKind::Toggle, &visible);
            ClickEffect::Selected
        } else if item.is_folder() {
            self.selection.click(target, ClickKind::Plain, &visible);
            ClickEffect::Toggled {
                collapsed: self.order.toggle_collapsed(target),
            }
        } else if modifiers.platform {
            self.selection.click(target, ClickKind::Plain, &visible);
            ClickEffect::Open {
                path: target.to_string(),
                new_tab: true,
            }
        } else if self.active.as_deref() == Some(target) {
            self.selection.click(target, ClickKind::Plain, &visible);
            ClickEffect::Selected
        } else {
            // first click on another file opens it without selecting
            self.selection.clear();
            self.active = Some(target.to_string());
            ClickEffect::Open {
                path: target.to_string(),
                new_tab: false,
            }
        };
        self.project();
        self.persist().await;
        Some(effect)
    }

    /* ============================= keyboard ============================ */

    pub fn select_all(&mut self) {
        let visible = self.visible();
        self.selection.select_all(&visible);
        self.project();
    }

    /// Escape: drop the selection and the anchor.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.project();
    }

    pub fn move_cursor(&mut self, movement: CursorMove, extend: bool) -> Option<String> {
        let visible = self.visible();
        let landed = self.selection.move_cursor(movement, extend, &visible);
        self.project();
        landed
    }

    pub fn focus_parent(&mut self) -> Option<String> {
        let parent = self.selection.focus_parent();
        self.project();
        parent
    }

    /* ============================= folders ============================= */

    /// Flip a folder's collapsed state. Returns the new state.
    pub async fn toggle_folder(&mut self, folder: &str) -> ExplorerResult<bool> {
        match self.tree.get(folder) {
            Some(item) if item.is_folder() && !item.is_root() => {}
            Some(_) => return Err(ExplorerError::NotAFolder(folder.to_string())),
            None => return Err(ExplorerError::NotFound(folder.to_string())),
        }
        let collapsed = self.order.toggle_collapsed(folder);
        self.project();
        self.persist().await;
        Ok(collapsed)
    }

    pub async fn expand_all(&mut self) {
        self.set_all_collapsed(false).await;
    }

    pub async fn collapse_all(&mut self) {
        self.set_all_collapsed(true).await;
    }

    async fn set_all_collapsed(&mut self, collapse: bool) {
        let folders: Vec<String> = self.tree.all_folders().into_iter().map(|f| f.path).collect();
        self.order
            .set_all_collapsed(folders.iter().map(String::as_str), collapse);
        self.project();
        self.persist().await;
    }

    /* ============================= creation ============================ */

    /// First free `stem{ext}`, `stem {n}{ext}`, ... inside `folder`, counting
    /// from `first`.
    fn unique_child(&self, folder: &str, stem: &str, ext: &str, first: u32) -> String {
        let mut candidate = path::join(folder, &format!("{stem}{ext}"));
        let mut n = first;
        while self.tree.exists(&candidate) {
            candidate = path::join(folder, &format!("{stem} {n}{ext}"));
            n += 1;
        }
        candidate
    }

    async fn create_and_open(&mut self, folder: &str, ext: &str, content: &[u8]) -> ExplorerResult<String> {
        let target = self.unique_child(folder, UNTITLED, ext, 1);
        self.tree.create_file(&target, content).await?;
        self.order.expand(folder);
        self.selection.select_only(&target);
        self.active = Some(target.clone());
        info!(path = %target, "created file");
        self.finish().await;
        Ok(target)
    }

    /// Create `Untitled.md` (or the next free `Untitled N.md`) and open it.
    pub async fn new_note(&mut self, folder: &str) -> ExplorerResult<String> {
        self.create_and_open(folder, ".md", b"").await
    }

    /// Create an `Untitled.base` file holding a single table view.
    pub async fn new_base_file(&mut self, folder: &str) -> ExplorerResult<String> {
        self.create_and_open(folder, ".base", BASE_TEMPLATE.as_bytes()).await
    }

    /// Create an empty `Untitled.canvas` and open it.
    pub async fn new_canvas(&mut self, folder: &str) -> ExplorerResult<String> {
        self.create_and_open(folder, ".canvas", b"").await
    }

    pub async fn new_folder(&mut self, parent: &str, name: &str) -> ExplorerResult<String> {
        if !path::is_valid_name(name) {
            return Err(ExplorerError::InvalidName(name.to_string()));
        }
        let target = path::join(parent, name);
        self.tree.create_folder(&target).await?;
        self.order.expand(parent);
        self.selection.select_only(&target);
        info!(path = %target, "created folder");
        self.finish().await;
        Ok(target)
    }

    fn selection_in_order(&self) -> Vec<String> {
        self.selection.in_visual_order(&self.visible())
    }

    /// Create a folder named after `name` (`name 2`, `name 3`, ... when
    /// taken) and move the selection into it. The parent defaults to the
    /// selection's common parent, or the root when the items are spread out.
    #[instrument(level = "debug", skip(self))]
    pub async fn new_folder_with_selection(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> ExplorerResult<(String, BatchReport)> {
        if !path::is_valid_name(name) {
            return Err(ExplorerError::InvalidName(name.to_string()));
        }
        let paths = self.selection_in_order();
        if paths.is_empty() {
            return Err(ExplorerError::NotFound("selection".to_string()));
        }
        let parent = parent.map_or_else(|| common_parent(&paths), str::to_string);

        let folder = self.unique_child(&parent, name, "", 2);
        self.tree.create_folder(&folder).await?;
        self.order.expand(&parent);

        let report = reconciler::move_all(&mut self.tree, &mut self.order, &paths, &folder).await;
        self.follow_moves(&report.moved);
        self.report(&report);
        self.selection.select_only(&folder);
        info!(%folder, moved = report.moved.len(), "created folder from selection");
        self.finish().await;
        Ok((folder, report))
    }

    /// Move every selected item into `folder`.
    pub async fn move_selection_to(&mut self, folder: &str) -> BatchReport {
        let paths = self.selection_in_order();
        let report = reconciler::move_all(&mut self.tree, &mut self.order, &paths, folder).await;
        self.follow_moves(&report.moved);
        self.report(&report);
        self.finish().await;
        report
    }

    /// Bookmark every selected item. Returns how many were accepted.
    pub fn bookmark_selection(&self, sink: &mut dyn BookmarkSink) -> usize {
        let mut added = 0;
        for item in self.selection_in_order().iter().filter_map(|p| self.tree.get(p)) {
            match sink.add(&item) {
                Ok(()) => added += 1,
                Err(err) => self.notifier.notify(&format!("{}: {err}", item.path)),
            }
        }
        added
    }

    /// Delete the selection. Items below another selected folder go with it.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_selection(&mut self, mode: DeleteMode) -> BatchReport {
        let paths = self.selection_in_order();
        let roots: Vec<&String> = paths
            .iter()
            .filter(|p| {
                !paths
                    .iter()
                    .any(|other| other != *p && path::is_same_or_descendant(p, other))
            })
            .collect();

        let mut report = BatchReport::default();
        for target in roots {
            match self.tree.delete(target, mode).await {
                Ok(()) => {
                    self.order.remove_prefix(target);
                    self.selection.remove_prefix(target);
                    report.removed.push(target.clone());
                }
                Err(err) => report.fail(target, err),
            }
        }
        self.report(&report);
        info!(removed = report.removed.len(), ?mode, "deleted selection");
        self.finish().await;
        report
    }

    pub async fn rename(&mut self, target: &str, new_name: &str) -> ExplorerResult<String> {
        let new_path = reconciler::rename_item(&mut self.tree, &mut self.order, target, new_name).await?;
        self.follow_moves(&[(target.to_string(), new_path.clone())]);
        self.finish().await;
        Ok(new_path)
    }

    /// Copy `source` next to itself as `name copy.ext`, then `name copy 2.ext`
    /// and so on. Folders are copied with everything below them.
    #[instrument(level = "debug", skip(self))]
    pub async fn duplicate(&mut self, source: &str) -> ExplorerResult<String> {
        let item = self
            .tree
            .get(source)
            .filter(|item| !item.is_root())
            .ok_or_else(|| ExplorerError::NotFound(source.to_string()))?;
        let stem = format!("{} copy", item.basename());
        let ext = &item.name[item.basename().len()..];
        let target = self.unique_child(item.parent(), &stem, ext, 2);

        let mut pending = vec![(item, target.clone())];
        while let Some((from, to)) = pending.pop() {
            if from.is_folder() {
                self.tree.create_folder(&to).await?;
                for child in self.tree.children(&from.path) {
                    let dest = path::join(&to, &child.name);
                    pending.push((child, dest));
                }
            } else {
                let bytes = self.tree.read(&from.path).await?;
                self.tree.create_file(&to, &bytes).await?;
            }
        }

        self.selection.select_only(&target);
        info!(from = source, to = %target, "duplicated item");
        self.finish().await;
        Ok(target)
    }

    /// Text for the copy-path commands: the location on disk, or the
    /// vault path when `relative` is set or the provider has no disk.
    pub fn copy_path(&self, target: &str, relative: bool) -> ExplorerResult<String> {
        if !self.tree.exists(target) {
            return Err(ExplorerError::NotFound(target.to_string()));
        }
        let full = if relative { None } else { self.tree.full_path(target) };
        Ok(full.map_or_else(|| target.to_string(), |p| p.display().to_string()))
    }

    /* =============================== drag ============================== */

    /// Start dragging `target`. Returns the payload JSON for the host's
    /// data transfer.
    pub fn begin_drag(&mut self, target: &str) -> ExplorerResult<String> {
        let item: Item = self
            .tree
            .get(target)
            .ok_or_else(|| ExplorerError::NotFound(target.to_string()))?;
        let payload = DragPayload::for_item(&item, &self.selection, &self.visible());
        let json = payload.to_json()?;
        self.drag.begin(payload);
        Ok(json)
    }

    pub fn begin_external_drag(&mut self) {
        self.drag.begin_external();
    }

    /// Adopt a payload dragged in from another view.
    pub fn adopt_drag(&mut self, json: &str) -> ExplorerResult<()> {
        self.drag.adopt_json(json)
    }

    pub fn drag_over(&mut self, pointer: Pointer, now: Instant) {
        self.drag.drag_over(pointer, now);
    }

    /// Frame tick during a drag. Returns the hover target when it changed.
    pub fn on_frame(&mut self, now: Instant) -> Option<DropTarget> {
        let boxes = self.row_boxes();
        self.drag.on_frame(&boxes, now).cloned()
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    /// Drop at `pointer`. `files` are native files from outside. Returns the
    /// batch outcome, or `None` when the drop resolved to nothing.
    #[instrument(level = "debug", skip(self, files))]
    pub async fn drop(&mut self, pointer: Pointer, files: Vec<NativeFile>) -> Option<BatchReport> {
        let boxes = self.row_boxes();
        let plan = self.drag.drop(pointer, &boxes, files)?;
        let report = reconciler::execute(&mut self.tree, &mut self.order, plan).await;
        self.report(&report);
        if report.is_noop() {
            debug!("drop changed nothing");
            return Some(report);
        }
        self.follow_moves(&report.moved);
        debug!(moved = report.moved.len(), created = report.created.len(), "drop applied");
        self.finish().await;
        Some(report)
    }
}

/// Shared parent of every path, or the root when they differ.
fn common_parent(paths: &[String]) -> String {
    let mut parents = paths.iter().map(|p| path::parent(p));
    match parents.next() {
        Some(first) if parents.all(|p| p == first) => first.to_string(),
        _ => String::new(),
    }
}
