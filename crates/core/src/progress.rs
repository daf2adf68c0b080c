//! Progress sink consulted by the presentation layer.
//!
//! The orchestrator calls [`ProgressReporter::report`] at every phase
//! transition and [`ProgressReporter::clear`] once a run settles. Only the
//! latest label matters; no history is kept.

use tokio::sync::watch;

/// Receives human-readable phase labels as a run advances.
///
/// Implementations must be cheap and non-blocking: they are called inline
/// from the orchestrator between suspension points.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, label: &str);

    /// Called when a run completes or fails.
    fn clear(&self) {}
}

/// Discards every label.
impl ProgressReporter for () {
    fn report(&self, _label: &str) {}
}

// ---------------------------------------------------------------------------
// WatchReporter
// ---------------------------------------------------------------------------

/// Publishes the latest label on a [`tokio::sync::watch`] channel.
///
/// Subscribers always observe the most recent value; `None` means no run is
/// in progress.
pub struct WatchReporter {
    tx: watch::Sender<Option<String>>,
}

impl WatchReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    /// The label currently on display.
    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for WatchReporter {
    fn report(&self, label: &str) {
        // send_replace stores the value even with zero receivers.
        self.tx.send_replace(Some(label.to_string()));
    }

    fn clear(&self) {
        self.tx.send_replace(None);
    }
}

// ---------------------------------------------------------------------------
// TracingReporter
// ---------------------------------------------------------------------------

/// Emits each label as an `info` event. Used by the headless worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, label: &str) {
        tracing::info!(phase = %label, "Pipeline progress");
    }

    fn clear(&self) {
        tracing::debug!("Pipeline progress cleared");
    }
}
