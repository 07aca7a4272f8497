//! apptrail-notify — delivery of version updates to external channels.
//!
//! Producers hand [`WorkloadUpdate`]s to an [`UpdateSender`] without
//! waiting for delivery. A single [`NotifierQueue`] task drains the queue
//! in FIFO order and invokes every registered [`Notifier`] in
//! registration order. Failures are logged and never retried.
//!
//! # Architecture
//!
//! ```text
//! UpdateSender::enqueue()  (many producers, never blocks)
//!   └── bounded mpsc channel (drop-newest when full)
//!         └── NotifierQueue::run()  (one consumer task)
//!               ├── SlackNotifier  → HTTP POST {"text": ...}
//!               └── LogNotifier    → tracing
//! ```
//!
//! [`WorkloadUpdate`]: apptrail_core::WorkloadUpdate

pub mod backends;
pub mod error;
pub mod notifier;
pub mod queue;

pub use backends::{LogNotifier, SlackNotifier, build_notifiers};
pub use error::{NotifyError, NotifyResult};
pub use notifier::Notifier;
pub use queue::{DispatchSummary, EnqueueOutcome, NotifierQueue, UpdateSender};
