//! ``src/operators/reconciler.rs``
//! ============================================================================
//! # Reconciler: turn a drop plan into storage moves plus rank edits
//!
//! Every item in a batch is attempted on its own. A failed item is recorded
//! in the [`BatchReport`] and the batch carries on. The order store is
//! re-keyed right after each successful move, so the provider's later
//! rename notification finds nothing left to rewrite.

use tracing::{debug, info, instrument, warn};

use crate::error::{ExplorerError, ExplorerResult};
use crate::model::item::path;
use crate::model::order_store::OrderStore;
use crate::model::sort;
use crate::model::tree::TreeProvider;
use crate::operators::drag_session::{DropPlan, NativeFile};

/// Per-item outcome of a batch operation.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(old_path, new_path)` for every item that changed location.
    pub moved: Vec<(String, String)>,
    /// Paths created by the batch.
    pub created: Vec<String>,
    /// Paths deleted by the batch.
    pub removed: Vec<String>,
    /// Paths left alone because they already were where the batch wanted them.
    pub skipped: Vec<String>,
    pub failures: Vec<(String, ExplorerError)>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// True when no item landed anywhere: nothing moved, created, removed or
    /// re-placed. Failures alone leave the tree and the order untouched.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty()
            && self.created.is_empty()
            && self.removed.is_empty()
            && self.skipped.is_empty()
    }

    pub(crate) fn fail(&mut self, path: &str, err: ExplorerError) {
        warn!(path, error = %err, "batch item failed");
        self.failures.push((path.to_string(), err));
    }
}

/// Reject moving a folder into itself or below itself.
fn check_containment(
    tree: &(impl TreeProvider + ?Sized),
    source: &str,
    folder: &str,
) -> ExplorerResult<()> {
    let is_folder = tree.get(source).is_some_and(|item| item.is_folder());
    if is_folder && path::is_same_or_descendant(folder, source) {
        return Err(ExplorerError::self_containment(source, folder));
    }
    Ok(())
}

/// Move one item into `folder`, keeping its name. Returns the new path, or
/// `None` when the item already lives there.
#[instrument(level = "debug", skip(tree, order))]
pub async fn move_item<P>(
    tree: &mut P,
    order: &mut OrderStore,
    source: &str,
    folder: &str,
) -> ExplorerResult<Option<String>>
where
    P: TreeProvider + ?Sized,
{
    if tree.get(source).is_none() {
        return Err(ExplorerError::NotFound(source.to_string()));
    }
    if path::parent(source) == folder {
        return Ok(None);
    }
    check_containment(tree, source, folder)?;

    let new_path = path::join(folder, path::name(source));
    tree.rename(source, &new_path).await?;
    order.rewrite_prefix(source, &new_path);
    info!(from = source, to = %new_path, "moved item");
    Ok(Some(new_path))
}

/// Rename an item in place, re-keying its order entries.
pub async fn rename_item<P>(
    tree: &mut P,
    order: &mut OrderStore,
    source: &str,
    new_name: &str,
) -> ExplorerResult<String>
where
    P: TreeProvider + ?Sized,
{
    if !path::is_valid_name(new_name) {
        return Err(ExplorerError::InvalidName(new_name.to_string()));
    }
    let new_path = path::join(path::parent(source), new_name);
    if new_path == source {
        return Ok(new_path);
    }
    tree.rename(source, &new_path).await?;
    order.rewrite_prefix(source, &new_path);
    info!(from = source, to = %new_path, "renamed item");
    Ok(new_path)
}

/// Move every path into `folder`, recording outcomes in `report`. Returns
/// the final location of every item now in `folder`, in input order.
async fn relocate_all<P>(
    tree: &mut P,
    order: &mut OrderStore,
    paths: &[String],
    folder: &str,
    report: &mut BatchReport,
) -> Vec<String>
where
    P: TreeProvider + ?Sized,
{
    let mut placed = Vec::with_capacity(paths.len());
    for source in paths {
        match move_item(tree, order, source, folder).await {
            Ok(Some(new_path)) => {
                report.moved.push((source.clone(), new_path.clone()));
                placed.push(new_path);
            }
            Ok(None) => {
                report.skipped.push(source.clone());
                placed.push(source.clone());
            }
            Err(err) => report.fail(source, err),
        }
    }
    placed
}

/// Move a batch of items into `folder`.
pub async fn move_all<P>(
    tree: &mut P,
    order: &mut OrderStore,
    paths: &[String],
    folder: &str,
) -> BatchReport
where
    P: TreeProvider + ?Sized,
{
    let mut report = BatchReport::default();
    relocate_all(tree, order, paths, folder, &mut report).await;
    report
}

/// Land `placed` as one contiguous run at `anchor`. The first item goes
/// before or after the anchor; every later item goes right after the one
/// placed before it. An anchor inside the run stays put.
fn thread_reorder<P>(
    tree: &P,
    order: &mut OrderStore,
    placed: &[String],
    anchor: &str,
    insert_before: bool,
) where
    P: TreeProvider + ?Sized,
{
    let Some((first, rest)) = placed.split_first() else {
        return;
    };
    order.reorder(tree, first, anchor, insert_before);
    let mut previous = first;
    for item in rest {
        order.reorder(tree, item, previous, false);
        previous = item;
    }
}

/// Create each native file inside `folder`.
pub async fn import_files<P>(tree: &mut P, folder: &str, files: &[NativeFile]) -> BatchReport
where
    P: TreeProvider + ?Sized,
{
    let mut report = BatchReport::default();
    for file in files {
        let target = path::join(folder, &file.name);
        if !path::is_valid_name(&file.name) {
            report.fail(&target, ExplorerError::InvalidName(file.name.clone()));
            continue;
        }
        match tree.create_file(&target, &file.bytes).await {
            Ok(()) => report.created.push(target),
            Err(err) => report.fail(&target, err),
        }
    }
    report
}

/// Carry out a resolved drop.
#[instrument(level = "debug", skip_all)]
pub async fn execute<P>(tree: &mut P, order: &mut OrderStore, plan: DropPlan) -> BatchReport
where
    P: TreeProvider + ?Sized,
{
    let mut report = BatchReport::default();
    match plan {
        DropPlan::IntoFolder { paths, folder } | DropPlan::ToAncestor { paths, folder } => {
            relocate_all(tree, order, &paths, &folder, &mut report).await;
        }

        DropPlan::Reorder {
            paths,
            target,
            insert_before,
        } => {
            let folder = path::parent(&target).to_string();
            let placed = relocate_all(tree, order, &paths, &folder, &mut report).await;
            if !placed.is_empty() {
                thread_reorder(tree, order, &placed, &target, insert_before);
            }
        }

        DropPlan::ToRoot { paths, top } => {
            let placed = relocate_all(tree, order, &paths, "", &mut report).await;
            if !placed.is_empty() {
                // moved items keep their ranks, so the edge must be a bystander
                let mut bystanders = sort::sorted_children(tree, "", order)
                    .into_iter()
                    .map(|item| item.path)
                    .filter(|p| !placed.contains(p));
                let edge = if top { bystanders.next() } else { bystanders.last() };
                let edge = edge.unwrap_or_else(|| placed[0].clone());
                thread_reorder(tree, order, &placed, &edge, top);
            }
        }

        DropPlan::Import { folder, files } => {
            report = import_files(tree, &folder, &files).await;
        }
    }
    debug!(
        moved = report.moved.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "drop executed"
    );
    report
}
