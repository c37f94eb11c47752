//! src/main.rs
//! `explorer [ROOT]`: print ROOT as the explorer would show it

use std::{env, panic::PanicHookInfo, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use explorer_core::{
    Logger,
    config::Config,
    controller::Explorer,
    fs::{DirTree, SettingsStore, SettingsWriter},
    util::debounce::DebounceConfig,
    view::render_text,
};

#[tokio::main]
async fn main() -> Result<()> {
    setup_panic_handler();

    let root = env::args_os()
        .nth(1)
        .map_or_else(env::current_dir, |arg| Ok(PathBuf::from(arg)))
        .context("Failed to determine the folder to show")?;

    let config = Config::load().await.context("Failed to load configuration")?;
    let _guard = Logger::init_tracing(&config.logging).context("Failed to initialize logging")?;

    let tree = DirTree::open(&root)
        .await
        .with_context(|| format!("Failed to open {}", root.display()))?;

    let store = SettingsStore::new(config.settings_path()?);
    let settings = store
        .load()
        .await
        .with_context(|| format!("Failed to read settings from {}", store.path().display()))?;

    let debounce = DebounceConfig {
        delay: config.persistence.save_debounce,
        ..DebounceConfig::settings_save()
    };
    let writer = SettingsWriter::spawn(store, debounce);
    let mut explorer = Explorer::new(tree, settings, &config).with_writer(writer);

    let removed = explorer.rebuild();
    if removed > 0 {
        info!(removed, "dropped settings for missing paths");
    }

    print!("{}", render_text(explorer.rows()));

    explorer
        .shutdown()
        .await
        .context("Failed to save settings")?;
    info!("explorer exited cleanly");
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        error!("explorer panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
