//! Notifier that writes updates to the structured log.

use async_trait::async_trait;
use tracing::info;

use apptrail_core::WorkloadUpdate;

use crate::error::NotifyError;
use crate::notifier::Notifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, update: &WorkloadUpdate) -> Result<(), NotifyError> {
        info!(
            kind = %update.kind,
            namespace = %update.namespace,
            name = %update.name,
            previous = %update.previous_version,
            current = %update.current_version,
            "workload version released"
        );
        Ok(())
    }
}
