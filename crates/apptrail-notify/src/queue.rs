//! Notification dispatch queue.
//!
//! Decouples version detection from delivery. Producers enqueue through a
//! cloneable [`UpdateSender`]; one [`NotifierQueue`] task delivers each
//! update to every backend, one backend at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use apptrail_core::WorkloadUpdate;

use crate::error::NotifyError;
use crate::notifier::Notifier;

/// Result of handing an update to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The queue was full; the update was discarded.
    Dropped,
    /// The dispatch task has stopped.
    Closed,
}

/// Producer handle for the dispatch queue.
#[derive(Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<WorkloadUpdate>,
    dropped: Arc<AtomicU64>,
}

impl UpdateSender {
    /// Enqueue an update without waiting.
    ///
    /// When the queue is full the new update is dropped so that the caller
    /// is never stalled by slow backends.
    pub fn enqueue(&self, update: WorkloadUpdate) -> EnqueueOutcome {
        match self.tx.try_send(update) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(update)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    workload = %update.identity(),
                    current = %update.current_version,
                    dropped,
                    "notification queue full, dropping update"
                );
                EnqueueOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(update)) => {
                warn!(
                    workload = %update.identity(),
                    "notification queue closed, update not delivered"
                );
                EnqueueOutcome::Closed
            }
        }
    }

    /// Number of updates dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Per-update delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Single consumer that delivers queued updates to all notifiers.
pub struct NotifierQueue {
    updates: mpsc::Receiver<WorkloadUpdate>,
    notifiers: Vec<Arc<dyn Notifier>>,
    notify_timeout: Duration,
}

impl NotifierQueue {
    /// Create the queue and its producer handle.
    ///
    /// `capacity` must be at least 1.
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        capacity: usize,
        notify_timeout: Duration,
    ) -> (Self, UpdateSender) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queue = Self {
            updates: rx,
            notifiers,
            notify_timeout,
        };
        let sender = UpdateSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (queue, sender)
    }

    /// Names of the registered notifiers, in invocation order.
    pub fn notifier_names(&self) -> Vec<String> {
        self.notifiers.iter().map(|n| n.name().to_string()).collect()
    }

    /// Run the dispatch loop until shutdown.
    ///
    /// On shutdown the queue stops accepting updates, delivers what is
    /// already queued, and returns. The loop also returns once every
    /// sender has been dropped and the queue is empty.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            notifiers = ?self.notifier_names(),
            timeout_ms = self.notify_timeout.as_millis() as u64,
            "notifier queue started"
        );

        loop {
            tokio::select! {
                next = self.updates.recv() => match next {
                    Some(update) => {
                        self.dispatch(&update).await;
                    }
                    None => {
                        info!("all update producers gone, notifier queue stopping");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    self.updates.close();
                    let mut drained = 0usize;
                    while let Some(update) = self.updates.recv().await {
                        self.dispatch(&update).await;
                        drained += 1;
                    }
                    info!(drained, "notifier queue shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one update to every notifier in registration order.
    ///
    /// A failing or slow backend never prevents delivery to the next one.
    pub async fn dispatch(&self, update: &WorkloadUpdate) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        if update.previous_version.is_empty() {
            debug!(
                workload = %update.identity(),
                "update has no previous version, not announcing"
            );
            return summary;
        }

        for notifier in &self.notifiers {
            let result = match tokio::time::timeout(self.notify_timeout, notifier.notify(update)).await
            {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
            };

            match result {
                Ok(()) => {
                    summary.delivered += 1;
                    debug!(
                        notifier = notifier.name(),
                        workload = %update.identity(),
                        "notification delivered"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        notifier = notifier.name(),
                        workload = %update.identity(),
                        error = %e,
                        "failed to notify"
                    );
                }
            }
        }

        summary
    }
}
