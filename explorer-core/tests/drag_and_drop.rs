//! End-to-end drag sessions against the in-memory tree.

use std::time::{Duration, Instant};

use explorer_core::{
    config::Config,
    controller::{Explorer, Modifiers},
    fs::MemoryTree,
    model::{ExplorerSettings, ModifierAction, TreeProvider},
    operators::{DropTarget, Pointer},
};

const ROW: f64 = 24.0;
const SHIFT: Modifiers = Modifiers {
    shift: true,
    platform: false,
};

fn explorer(paths: &[&str]) -> Explorer<MemoryTree> {
    Explorer::new(
        MemoryTree::from_paths(paths),
        ExplorerSettings::default(),
        &Config::default(),
    )
}

fn visible(explorer: &Explorer<MemoryTree>) -> Vec<String> {
    explorer.visible()
}

/// Pointer over row `idx`, `fraction` of the way down, well inside the
/// indent so no un-indent gesture fires.
fn over(idx: usize, fraction: f64) -> Pointer {
    Pointer::new(200.0, idx as f64 * ROW + ROW * fraction)
}

#[tokio::test]
async fn test_reorder_three_files_gives_dense_ranks() {
    let mut ex = explorer(&["c.md", "a.md", "b.md"]);
    assert_eq!(visible(&ex), ["a.md", "b.md", "c.md"]);

    // c.md above a.md
    ex.begin_drag("c.md").unwrap();
    ex.drop(over(0, 0.25), Vec::new()).await.unwrap();
    assert_eq!(visible(&ex), ["c.md", "a.md", "b.md"]);

    // and back below b.md: lower half of the last row inserts after it
    ex.begin_drag("c.md").unwrap();
    ex.drop(over(2, 0.75), Vec::new()).await.unwrap();
    assert_eq!(visible(&ex), ["a.md", "b.md", "c.md"]);

    let order = ex.order();
    assert_eq!(order.rank("a.md"), Some(0));
    assert_eq!(order.rank("b.md"), Some(1));
    assert_eq!(order.rank("c.md"), Some(2));
}

#[tokio::test]
async fn test_ranked_file_sorts_above_unranked_folder() {
    let mut ex = explorer(&["Z/", "a.md"]);
    assert_eq!(visible(&ex), ["Z", "a.md"]);

    ex.begin_drag("a.md").unwrap();
    ex.drop(over(0, 0.1), Vec::new()).await.unwrap();
    assert_eq!(visible(&ex), ["a.md", "Z"]);
}

#[tokio::test]
async fn test_folder_move_carries_ranks_collapse_and_selection() {
    let mut ex = explorer(&["Archive/", "Notes/a.md", "Notes/b.md", "Notes/Deep/c.md"]);

    // give Notes a custom child order and collapse its subfolder
    let rows = visible(&ex);
    let a = rows.iter().position(|p| p == "Notes/a.md").unwrap();
    ex.begin_drag("Notes/b.md").unwrap();
    ex.drop(over(a, 0.25), Vec::new()).await.unwrap();
    ex.toggle_folder("Notes/Deep").await.unwrap();
    ex.click("Notes/b.md", SHIFT).await;

    // drop Notes onto the middle of Archive
    ex.begin_drag("Notes").unwrap();
    let now = Instant::now();
    ex.drag_over(over(0, 0.5), now);
    assert_eq!(
        ex.on_frame(now + Duration::from_millis(50)),
        Some(DropTarget::IntoFolder {
            folder: "Archive".into()
        })
    );
    let report = ex.drop(over(0, 0.5), Vec::new()).await.unwrap();
    assert!(!report.has_failures());

    assert!(ex.tree().exists("Archive/Notes/Deep/c.md"));
    let order = ex.order();
    // ranks are dense over every sibling, the subfolder included
    assert_eq!(order.rank("Archive/Notes/Deep"), Some(0));
    assert_eq!(order.rank("Archive/Notes/b.md"), Some(1));
    assert_eq!(order.rank("Archive/Notes/a.md"), Some(2));
    assert!(order.rank("Notes/b.md").is_none());
    assert!(order.is_collapsed("Archive/Notes/Deep"));
    assert!(ex.selection().is_selected("Archive/Notes/b.md"));

    assert_eq!(
        visible(&ex),
        [
            "Archive",
            "Archive/Notes",
            "Archive/Notes/Deep",
            "Archive/Notes/b.md",
            "Archive/Notes/a.md"
        ]
    );

    // a folder never goes inside itself
    ex.begin_drag("Archive").unwrap();
    let report = ex.drop(over(1, 0.5), Vec::new()).await.unwrap();
    assert!(report.has_failures());
    assert!(ex.tree().exists("Archive/Notes"));
}

#[tokio::test]
async fn test_multi_selection_drag_keeps_visual_order() {
    let mut ex = explorer(&["Box/", "a.md", "b.md", "c.md"]);
    ex.update_settings(|s| s.modifier_action = ModifierAction::SelectMultiple)
        .await;
    ex.click("a.md", SHIFT).await;
    ex.click("c.md", SHIFT).await;
    assert_eq!(ex.selection().len(), 3);

    let json = ex.begin_drag("b.md").unwrap();
    assert!(json.contains(r#""paths":["a.md","b.md","c.md"]"#));

    let report = ex.drop(over(0, 0.5), Vec::new()).await.unwrap();
    assert_eq!(report.moved.len(), 3);
    assert_eq!(ex.tree().children("Box").len(), 3);
    assert_eq!(
        visible(&ex),
        ["Box", "Box/a.md", "Box/b.md", "Box/c.md"]
    );
}

#[tokio::test]
async fn test_drop_in_gutter_near_top_moves_to_root_start() {
    let mut ex = explorer(&["Notes/x.md", "a.md", "b.md"]);
    ex.begin_drag("Notes/x.md").unwrap();
    ex.drop(Pointer::new(10.0, 5.0), Vec::new()).await.unwrap();
    assert_eq!(visible(&ex)[0], "x.md");
    assert_eq!(ex.order().rank("x.md"), Some(0));
}

#[tokio::test]
async fn test_cancelled_drag_changes_nothing() {
    let mut ex = explorer(&["Archive/", "a.md"]);
    ex.begin_drag("a.md").unwrap();
    let now = Instant::now();
    ex.drag_over(over(0, 0.5), now);
    ex.end_drag();
    assert_eq!(ex.on_frame(now + Duration::from_secs(1)), None);
    assert!(ex.drop(over(0, 0.5), Vec::new()).await.is_none());
    assert!(ex.tree().exists("a.md"));
}

#[tokio::test]
async fn test_multi_drop_onto_own_member_keeps_order() {
    let mut ex = explorer(&["Box/", "a.md", "b.md", "c.md"]);
    ex.click("b.md", SHIFT).await;
    ex.click("c.md", SHIFT).await;
    assert_eq!(ex.selection().len(), 2);

    // upper half of the b.md row, which is itself being dragged
    ex.begin_drag("c.md").unwrap();
    let report = ex.drop(over(2, 0.25), Vec::new()).await.unwrap();
    assert!(!report.has_failures());
    assert_eq!(visible(&ex), ["Box", "a.md", "b.md", "c.md"]);

    let order = ex.order();
    assert!(order.rank("b.md") < order.rank("c.md"));
}
