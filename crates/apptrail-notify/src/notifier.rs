//! The notifier capability implemented by every backend.

use async_trait::async_trait;

use apptrail_core::WorkloadUpdate;

use crate::error::NotifyError;

/// Delivers a workload update to an external channel.
///
/// Implementations may perform network I/O. Every failure must come back
/// as an `Err`; the dispatch queue logs it and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn notify(&self, update: &WorkloadUpdate) -> Result<(), NotifyError>;
}
