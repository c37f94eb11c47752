pub mod error;
pub use error::{ExplorerError, ExplorerResult};

pub mod config;

pub mod logging;
pub use logging::Logger;

pub mod model {
    pub mod item;
    pub use item::{Item, ItemKind};

    pub mod tree;
    pub use tree::{DeleteMode, TreeEvent, TreeProvider};

    pub mod settings;
    pub use settings::{ExplorerSettings, ModifierAction, OutlineMode};

    pub mod order_store;
    pub use order_store::OrderStore;

    pub mod sort;

    pub mod selection;
    pub use selection::{ClickKind, CursorMove, SelectionModel};
}

pub mod fs {
    pub mod memory_tree;
    pub use memory_tree::MemoryTree;

    pub mod dir_tree;
    pub use dir_tree::DirTree;

    pub mod settings_store;
    pub use settings_store::{SettingsStore, SettingsWriter};
}

pub mod operators {
    pub mod drop_zone;
    pub use drop_zone::{DropGeometry, DropTarget, Pointer, RowBox, classify_drop_zone};

    pub mod drag_session;
    pub use drag_session::{DragPayload, DragSession, DropPlan, FrameThrottle, NativeFile};

    pub mod reconciler;
    pub use reconciler::BatchReport;

    pub mod propagator;
    pub use propagator::Propagator;
}

pub mod view {
    pub mod projection;
    pub use projection::{Row, project, render_text};
}

pub mod controller {
    pub mod commands;
    pub use commands::{BookmarkSink, Command, Notifier, available_commands};

    pub mod explorer;
    pub use explorer::{ClickEffect, Explorer, Modifiers};
}

pub mod util {
    pub mod debounce;
}
