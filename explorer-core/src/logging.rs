//! ``src/logging.rs``
//! ============================================================================
//! # Logger: tracing subscriber setup for the `explorer` binary
//!
//! Two fmt layers share one compact formatter: a daily-rolling file under
//! the configured directory and an optional stderr layer. `RUST_LOG`
//! overrides the configured level.

use std::{
    fmt,
    fs,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};
use tracing::Metadata;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self as tracing_fmt, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    prelude::*,
};

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`. Keep the returned guard alive
    /// for as long as log lines should reach the file.
    pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard> {
        fs::create_dir_all(&config.dir)
            .with_context(|| format!("cannot create log dir {}", config.dir.display()))?;

        // daily rolling file appender -> <dir>/<prefix>.YYYY-MM-DD
        let appender = rolling::daily(&config.dir, &config.file_prefix);
        let (file_writer, guard) = tracing_appender::non_blocking(appender);

        let file_layer = tracing_fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(file_writer)
            .with_ansi(false)
            .with_filter(Self::filter(&config.level)?);

        let stderr_layer = if config.stderr {
            Some(
                tracing_fmt::layer()
                    .event_format(SeqFileMod)
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_filter(Self::filter(&config.level)?),
            )
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init()
            .context("tracing subscriber already installed")?;

        Ok(guard)
    }

    fn filter(level: &str) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(level)
                .with_context(|| format!("invalid log level directive {level:?}")),
        }
    }
}

static SEQ: AtomicUsize = AtomicUsize::new(1);

/// Custom formatter: `[SEQ] LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> fmt::Result {
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        // message plus structured fields
        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}
