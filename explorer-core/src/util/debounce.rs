//!  src/util/debounce.rs
//!  ===================================================================
//!  Trailing-edge debouncer
//!
//!  • Only the latest submitted value is kept; earlier ones are dropped.
//!  • Uses a spawned `tokio::time::sleep_until` task per burst; a new
//!    submit aborts the previous sleeper, so nothing leaks.
//!  • `flush` emits the pending value immediately.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{Instant as TokioInstant, sleep_until},
};
use tracing::{debug, trace};

/* ======================== DebounceConfig ============================ */

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet period after the last submit.
    pub delay: Duration,
    /// Upper bound on how long a value may wait while submits keep coming.
    pub max_delay: Option<Duration>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::settings_save()
    }
}

impl DebounceConfig {
    /// Settings persistence: 250 ms quiet period, at most 2 s of deferral.
    #[must_use]
    pub const fn settings_save() -> Self {
        Self {
            delay: Duration::from_millis(250),
            max_delay: Some(Duration::from_millis(2000)),
        }
    }

    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            max_delay: None,
        }
    }
}

/* ============================ Debouncer ============================ */

struct Slot<T> {
    pending: Option<T>,
    burst_started: Option<TokioInstant>,
    sleeper: Option<JoinHandle<()>>,
}

/// Trailing debouncer emitting into an unbounded channel.
pub struct Debouncer<T> {
    cfg: DebounceConfig,
    slot: Arc<Mutex<Slot<T>>>,
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its values come out of.
    #[must_use]
    pub fn new(cfg: DebounceConfig) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_sender(cfg, tx), rx)
    }

    /// Create a debouncer that emits into an existing channel.
    #[must_use]
    pub fn with_sender(cfg: DebounceConfig, tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            cfg,
            slot: Arc::new(Mutex::new(Slot {
                pending: None,
                burst_started: None,
                sleeper: None,
            })),
            tx,
        }
    }

    /// Submit a value; it is emitted once no newer value arrives for `delay`.
    pub async fn submit(&self, value: T) {
        let mut slot = self.slot.lock().await;
        let now = TokioInstant::now();
        let burst_started = *slot.burst_started.get_or_insert(now);

        slot.pending = Some(value);
        if let Some(handle) = slot.sleeper.take() {
            handle.abort();
        }

        let mut deadline = now + self.cfg.delay;
        if let Some(max) = self.cfg.max_delay {
            deadline = deadline.min(burst_started + max);
        }
        trace!(delay_ms = self.cfg.delay.as_millis(), "debounce rescheduled");

        let slot_ptr = Arc::clone(&self.slot);
        let tx = self.tx.clone();
        slot.sleeper = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let mut slot = slot_ptr.lock().await;
            slot.burst_started = None;
            slot.sleeper = None;
            if let Some(value) = slot.pending.take() {
                debug!("debounce trailing edge");
                let _ = tx.send(value);
            }
        }));
    }

    /// Emit the pending value now, if there is one. Returns whether a value
    /// was emitted.
    pub async fn flush(&self) -> bool {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.sleeper.take() {
            handle.abort();
        }
        slot.burst_started = None;
        match slot.pending.take() {
            Some(value) => {
                debug!("debounce flushed");
                let _ = self.tx.send(value);
                true
            }
            None => false,
        }
    }

    pub async fn is_pending(&self) -> bool {
        self.slot.lock().await.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_latest_value_is_emitted() {
        let (debouncer, mut rx) = Debouncer::new(DebounceConfig::with_delay(Duration::from_millis(20)));
        debouncer.submit(1).await;
        debouncer.submit(2).await;
        debouncer.submit(3).await;

        assert_eq!(rx.recv().await, Some(3));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_flush_emits_immediately_once() {
        let (debouncer, mut rx) = Debouncer::new(DebounceConfig::with_delay(Duration::from_secs(60)));
        debouncer.submit("a").await;
        assert!(debouncer.is_pending().await);
        assert!(debouncer.flush().await);
        assert_eq!(rx.try_recv().ok(), Some("a"));
        assert!(!debouncer.flush().await);
    }

    #[tokio::test]
    async fn test_max_delay_caps_deferral() {
        let cfg = DebounceConfig {
            delay: Duration::from_millis(40),
            max_delay: Some(Duration::from_millis(60)),
        };
        let (debouncer, mut rx) = Debouncer::new(cfg);
        for i in 0..10 {
            debouncer.submit(i).await;
            tokio::time::sleep(Duration::from_millis(15)).await;
            if let Ok(value) = rx.try_recv() {
                assert!(value < 9);
                return;
            }
        }
        panic!("value was deferred past max_delay");
    }
}
