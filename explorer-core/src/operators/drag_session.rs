//! ``src/operators/drag_session.rs``
//! ============================================================================
//! # DragSession: drag lifecycle, payload and per-frame hover evaluation
//!
//! ```text
//! Idle --begin--> Dragging --drop--> DropPlan --(reconciler)--> Idle
//!   \--begin_external--> ExternalDragging --drop--> DropPlan::Import
//! any --end/cancel--> Idle
//! ```
//!
//! Hover events are funnelled through a [`FrameThrottle`] so classification
//! runs at most once per frame on the latest pointer position.

use std::time::{Duration, Instant};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ExplorerResult;
use crate::model::item::{Item, ItemKind};
use crate::model::selection::SelectionModel;
use crate::operators::drop_zone::{
    DropGeometry, DropTarget, Pointer, RowBox, classify_drop_zone, classify_external_drop,
};

/* ============================ DragPayload =========================== */

/// What an internal drag carries across the drag boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragPayload {
    /// Dragged paths in visual order.
    pub paths: Vec<String>,
    /// Row the drag started on.
    pub primary: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

/// Wire shape accepting both the current and the single-path form.
#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    paths: Option<Vec<String>>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    primary: Option<String>,
    #[serde(rename = "type")]
    kind: ItemKind,
}

impl DragPayload {
    /// Payload for a drag starting on `item`: the whole selection when the
    /// item is selected, otherwise just the item.
    pub fn for_item(item: &Item, selection: &SelectionModel, visible: &[String]) -> Self {
        let paths = if selection.is_selected(&item.path) {
            selection.in_visual_order(visible)
        } else {
            vec![item.path.clone()]
        };
        Self {
            paths,
            primary: item.path.clone(),
            kind: item.kind,
        }
    }

    pub fn to_json(&self) -> ExplorerResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> ExplorerResult<Self> {
        let raw: RawPayload = serde_json::from_str(text)?;
        let paths = match (raw.paths, raw.path) {
            (Some(paths), _) if !paths.is_empty() => paths,
            (_, Some(path)) => vec![path],
            _ => return Err(serde_json::Error::custom("drag payload has no paths").into()),
        };
        let primary = raw.primary.unwrap_or_else(|| paths[0].clone());
        Ok(Self {
            paths,
            primary,
            kind: raw.kind,
        })
    }
}

/* ============================ FrameThrottle ========================= */

/// One pending job, latest wins, released at most once per frame.
#[derive(Debug)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    frame_started: Option<Instant>,
    interval: Duration,
}

impl<T> FrameThrottle<T> {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            pending: None,
            frame_started: None,
            interval,
        }
    }

    /// Queue `job`, replacing any job still waiting for the frame.
    pub fn schedule(&mut self, job: T, now: Instant) {
        if self.frame_started.is_none() {
            self.frame_started = Some(now);
        }
        self.pending = Some(job);
    }

    /// Release the queued job once a frame has elapsed. When `active` is
    /// false the job is discarded instead.
    pub fn poll(&mut self, now: Instant, active: bool) -> Option<T> {
        let started = self.frame_started?;
        if now.duration_since(started) < self.interval {
            return None;
        }
        self.frame_started = None;
        let job = self.pending.take();
        if active { job } else { None }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the queued job and the frame request.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.frame_started = None;
    }
}

/* ============================= DragSession ========================== */

/// A file dragged in from outside the explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Structural edit a drop resolved to. Executed by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    IntoFolder { paths: Vec<String>, folder: String },
    Reorder { paths: Vec<String>, target: String, insert_before: bool },
    ToRoot { paths: Vec<String>, top: bool },
    ToAncestor { paths: Vec<String>, folder: String },
    Import { folder: String, files: Vec<NativeFile> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragPayload),
    ExternalDragging,
}

#[derive(Debug)]
pub struct DragSession {
    phase: DragPhase,
    geometry: DropGeometry,
    throttle: FrameThrottle<Pointer>,
    hover: Option<DropTarget>,
}

impl DragSession {
    pub fn new(geometry: DropGeometry, frame_interval: Duration) -> Self {
        Self {
            phase: DragPhase::Idle,
            geometry,
            throttle: FrameThrottle::new(frame_interval),
            hover: None,
        }
    }

    pub const fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self.phase, DragPhase::Idle)
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.phase {
            DragPhase::Dragging(payload) => Some(payload),
            _ => None,
        }
    }

    /// Current drop target feedback, if any.
    pub const fn hover(&self) -> Option<&DropTarget> {
        self.hover.as_ref()
    }

    pub fn geometry(&self) -> &DropGeometry {
        &self.geometry
    }

    pub fn begin(&mut self, payload: DragPayload) {
        debug!(count = payload.paths.len(), primary = %payload.primary, "drag started");
        self.reset();
        self.phase = DragPhase::Dragging(payload);
    }

    pub fn begin_external(&mut self) {
        self.reset();
        self.phase = DragPhase::ExternalDragging;
    }

    /// Adopt a payload that arrived as text, e.g. a drag started in another
    /// view. Ignored while a drag with the same payload is running.
    pub fn adopt_json(&mut self, text: &str) -> ExplorerResult<()> {
        let payload = DragPayload::from_json(text)?;
        if self.payload() != Some(&payload) {
            self.begin(payload);
        }
        Ok(())
    }

    /// Record a hover position; evaluated on the next [`Self::on_frame`].
    pub fn drag_over(&mut self, pointer: Pointer, now: Instant) {
        self.throttle.schedule(pointer, now);
    }

    /// Run the queued hover evaluation if a frame has elapsed. Returns the
    /// new target only when it differs from the current one.
    pub fn on_frame(&mut self, rows: &[RowBox], now: Instant) -> Option<&DropTarget> {
        let active = self.is_active();
        let pointer = self.throttle.poll(now, active)?;
        let target = self.classify(pointer, rows);
        if self.hover.as_ref() == Some(&target) {
            return None;
        }
        trace!(?target, "drop target changed");
        self.hover = Some(target);
        self.hover.as_ref()
    }

    fn classify(&self, pointer: Pointer, rows: &[RowBox]) -> DropTarget {
        match &self.phase {
            DragPhase::Dragging(payload) => {
                classify_drop_zone(pointer, rows, &payload.paths, &self.geometry)
            }
            DragPhase::ExternalDragging => DropTarget::IntoFolder {
                folder: classify_external_drop(pointer, rows, &self.geometry),
            },
            DragPhase::Idle => DropTarget::None,
        }
    }

    /// Finish the drag at `pointer`. Native `files` take precedence over any
    /// internal payload. The session is idle afterwards on every path.
    pub fn drop(
        &mut self,
        pointer: Pointer,
        rows: &[RowBox],
        files: Vec<NativeFile>,
    ) -> Option<DropPlan> {
        let phase = std::mem::take(&mut self.phase);
        self.reset();

        if !files.is_empty() || phase == DragPhase::ExternalDragging {
            let folder = classify_external_drop(pointer, rows, &self.geometry);
            return (!files.is_empty()).then_some(DropPlan::Import { folder, files });
        }
        let DragPhase::Dragging(payload) = phase else {
            return None;
        };

        let plan = match classify_drop_zone(pointer, rows, &payload.paths, &self.geometry) {
            DropTarget::None => return None,
            DropTarget::IntoFolder { folder } => DropPlan::IntoFolder {
                paths: payload.paths,
                folder,
            },
            DropTarget::Reorder {
                target,
                insert_before,
            } => DropPlan::Reorder {
                paths: payload.paths,
                target,
                insert_before,
            },
            DropTarget::Root { top } => DropPlan::ToRoot {
                paths: payload.paths,
                top,
            },
            DropTarget::Ancestor { folder } => DropPlan::ToAncestor {
                paths: payload.paths,
                folder,
            },
        };
        debug!(?plan, "drop resolved");
        Some(plan)
    }

    /// Drag ended without a drop (cancel, escape, left the window).
    pub fn end(&mut self) {
        if self.is_active() {
            debug!("drag ended");
        }
        self.phase = DragPhase::Idle;
        self.reset();
    }

    fn reset(&mut self) {
        self.throttle.cancel();
        self.hover = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::path;

    const FRAME: Duration = Duration::from_millis(16);

    fn rows() -> Vec<RowBox> {
        let geometry = DropGeometry::default();
        ["A", "b.md", "c.md"]
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = if *p == "A" { ItemKind::Folder } else { ItemKind::File };
                RowBox {
                    path: (*p).to_string(),
                    kind,
                    top: i as f64 * 24.0,
                    height: 24.0,
                    left: geometry.row_indent(kind, path::depth(p)),
                }
            })
            .collect()
    }

    fn payload(paths: &[&str]) -> DragPayload {
        DragPayload {
            paths: paths.iter().map(|p| (*p).to_string()).collect(),
            primary: paths[0].to_string(),
            kind: ItemKind::File,
        }
    }

    #[test]
    fn test_payload_json_and_legacy_form() {
        let json = payload(&["b.md", "c.md"]).to_json().unwrap();
        assert_eq!(json, r#"{"paths":["b.md","c.md"],"primary":"b.md","type":"file"}"#);
        assert_eq!(DragPayload::from_json(&json).unwrap(), payload(&["b.md", "c.md"]));

        let legacy = DragPayload::from_json(r#"{"path":"A","type":"folder"}"#).unwrap();
        assert_eq!(legacy.paths, ["A"]);
        assert_eq!(legacy.primary, "A");
        assert_eq!(legacy.kind, ItemKind::Folder);

        assert!(DragPayload::from_json(r#"{"type":"file"}"#).is_err());
    }

    #[test]
    fn test_payload_uses_selection_in_visual_order() {
        let visible: Vec<String> = ["A", "b.md", "c.md"].map(String::from).to_vec();
        let mut selection = SelectionModel::new();
        selection.click("c.md", crate::model::selection::ClickKind::Plain, &visible);
        selection.click("A", crate::model::selection::ClickKind::Toggle, &visible);

        let dragged = DragPayload::for_item(&Item::file("c.md"), &selection, &visible);
        assert_eq!(dragged.paths, ["A", "c.md"]);
        assert_eq!(dragged.primary, "c.md");

        let single = DragPayload::for_item(&Item::file("b.md"), &selection, &visible);
        assert_eq!(single.paths, ["b.md"]);
    }

    #[test]
    fn test_throttle_keeps_latest_and_waits_a_frame() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::new(FRAME);
        throttle.schedule(1, start);
        throttle.schedule(2, start + Duration::from_millis(5));
        assert_eq!(throttle.poll(start + Duration::from_millis(10), true), None);
        assert_eq!(throttle.poll(start + FRAME, true), Some(2));
        assert_eq!(throttle.poll(start + FRAME * 2, true), None);
    }

    #[test]
    fn test_throttle_cancel_and_inactive_discard() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::new(FRAME);
        throttle.schedule("a", start);
        throttle.cancel();
        assert!(!throttle.is_pending());
        assert_eq!(throttle.poll(start + FRAME, true), None);

        throttle.schedule("b", start);
        assert_eq!(throttle.poll(start + FRAME, false), None);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_session_reports_only_changed_targets() {
        let start = Instant::now();
        let rows = rows();
        let mut session = DragSession::new(DropGeometry::default(), FRAME);
        session.begin(payload(&["c.md"]));

        session.drag_over(Pointer::new(100.0, 12.0), start);
        assert_eq!(
            session.on_frame(&rows, start + FRAME),
            Some(&DropTarget::IntoFolder { folder: "A".into() })
        );
        session.drag_over(Pointer::new(110.0, 13.0), start + FRAME);
        assert_eq!(session.on_frame(&rows, start + FRAME * 2), None);
    }

    #[test]
    fn test_drop_resolves_plan_and_returns_to_idle() {
        let start = Instant::now();
        let rows = rows();
        let mut session = DragSession::new(DropGeometry::default(), FRAME);
        session.begin(payload(&["b.md", "c.md"]));
        session.drag_over(Pointer::new(100.0, 2.0), start);

        let plan = session.drop(Pointer::new(100.0, 26.0), &rows, Vec::new());
        assert_eq!(
            plan,
            Some(DropPlan::Reorder {
                paths: vec!["b.md".into(), "c.md".into()],
                target: "b.md".into(),
                insert_before: true,
            })
        );
        assert_eq!(session.phase(), &DragPhase::Idle);
        // a frame queued before the drop never runs
        assert_eq!(session.on_frame(&rows, start + FRAME), None);
        assert!(session.hover().is_none());
    }

    #[test]
    fn test_native_files_become_import_plan() {
        let rows = rows();
        let mut session = DragSession::new(DropGeometry::default(), FRAME);
        session.begin_external();
        let files = vec![NativeFile {
            name: "photo.png".into(),
            bytes: vec![1, 2, 3],
        }];
        let plan = session.drop(Pointer::new(100.0, 30.0), &rows, files.clone());
        assert_eq!(plan, Some(DropPlan::Import { folder: String::new(), files }));

        session.begin_external();
        assert_eq!(session.drop(Pointer::new(100.0, 30.0), &rows, Vec::new()), None);
        session.end();
        assert!(!session.is_active());
    }
}
