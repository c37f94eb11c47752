//! ``src/fs/settings_store.rs``
//! ============================================================================
//! # Settings persistence
//!
//! [`SettingsStore`] reads and writes the settings JSON. Writes go to a
//! sibling temp file that is then renamed over the target, so a crash never
//! leaves a half-written file.
//!
//! [`SettingsWriter`] puts a trailing debouncer in front of the store and
//! writes on a background task. Only the newest snapshot of a burst reaches
//! disk; `flush` forces the pending snapshot out and waits for the write.

use std::path::{Path, PathBuf};

use tokio::fs as TokioFs;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ExplorerError, ExplorerResult};
use crate::model::settings::ExplorerSettings;
use crate::util::debounce::{DebounceConfig, Debouncer};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings, or the defaults when no file exists yet.
    pub async fn load(&self) -> ExplorerResult<ExplorerSettings> {
        let text = match TokioFs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(ExplorerSettings::default());
            }
            Err(e) => return Err(ExplorerError::io("load_settings", self.path.display().to_string(), e)),
        };
        Ok(ExplorerSettings::from_json(&text)?)
    }

    pub async fn save(&self, settings: &ExplorerSettings) -> ExplorerResult<()> {
        let json = settings.to_json()?;
        let display = self.path.display().to_string();
        if let Some(parent) = self.path.parent() {
            TokioFs::create_dir_all(parent)
                .await
                .map_err(|e| ExplorerError::io("save_settings", display.clone(), e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        TokioFs::write(&tmp, json)
            .await
            .map_err(|e| ExplorerError::io("save_settings", display.clone(), e))?;
        TokioFs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ExplorerError::io("save_settings", display, e))?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

fn writer_stopped() -> ExplorerError {
    ExplorerError::io(
        "flush_settings",
        "settings writer",
        std::io::Error::other("writer task stopped"),
    )
}

enum WriterMsg {
    Save(Box<ExplorerSettings>),
    Flush(oneshot::Sender<ExplorerResult<()>>),
}

/// Debounced, last-write-wins settings writer.
pub struct SettingsWriter {
    debouncer: Debouncer<WriterMsg>,
    tx: mpsc::UnboundedSender<WriterMsg>,
    worker: JoinHandle<()>,
}

impl SettingsWriter {
    /// Spawn the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(store: SettingsStore, cfg: DebounceConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::with_sender(cfg, tx.clone());
        let worker = tokio::spawn(Self::run(store, rx));
        Self {
            debouncer,
            tx,
            worker,
        }
    }

    async fn run(store: SettingsStore, mut rx: mpsc::UnboundedReceiver<WriterMsg>) {
        let mut last_error: Option<ExplorerError> = None;
        while let Some(msg) = rx.recv().await {
            match msg {
                WriterMsg::Save(settings) => match store.save(&settings).await {
                    Ok(()) => last_error = None,
                    Err(err) => {
                        warn!(error = %err, "failed to save settings");
                        last_error = Some(err);
                    }
                },
                WriterMsg::Flush(reply) => {
                    let _ = reply.send(last_error.take().map_or(Ok(()), Err));
                }
            }
        }
        debug!("settings writer stopped");
    }

    /// Queue a snapshot; written after the debounce delay.
    pub async fn submit(&self, settings: ExplorerSettings) {
        self.debouncer.submit(WriterMsg::Save(Box::new(settings))).await;
    }

    /// Write the pending snapshot now and wait until it is on disk. Returns
    /// the error of the most recent failed write, if any.
    pub async fn flush(&self) -> ExplorerResult<()> {
        self.debouncer.flush().await;
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(WriterMsg::Flush(reply_tx)).is_err() {
            return Err(writer_stopped());
        }
        // the worker dropping the reply means it died before answering
        reply_rx.await.map_err(|_| writer_stopped())?
    }

    /// Flush and stop the writer task.
    pub async fn shutdown(self) -> ExplorerResult<()> {
        let result = self.flush().await;
        let Self {
            debouncer,
            tx,
            worker,
        } = self;
        drop(debouncer);
        drop(tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "settings writer task ended abnormally");
        }
        result
    }
}
