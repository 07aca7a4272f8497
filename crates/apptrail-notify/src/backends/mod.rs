//! Notifier backends and the config-driven registry.

pub mod log;
pub mod slack;

use std::sync::Arc;

use tracing::info;

use apptrail_core::NotifierConfig;

use crate::error::NotifyResult;
use crate::notifier::Notifier;

pub use self::log::LogNotifier;
pub use self::slack::SlackNotifier;

/// Build notifiers in configured order.
///
/// Fails if any backend is misconfigured, e.g. a Slack webhook whose
/// environment variable is unset.
pub fn build_notifiers(configs: &[NotifierConfig]) -> NotifyResult<Vec<Arc<dyn Notifier>>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::with_capacity(configs.len());
    for config in configs {
        let notifier: Arc<dyn Notifier> = match config {
            NotifierConfig::Slack(slack) => {
                let url = slack.webhook_url()?;
                let notifier = match slack.timeout()? {
                    Some(timeout) => SlackNotifier::with_timeout(url, timeout)?,
                    None => SlackNotifier::new(url)?,
                };
                Arc::new(notifier)
            }
            NotifierConfig::Log => Arc::new(LogNotifier),
        };
        info!(notifier = notifier.name(), "notifier registered");
        notifiers.push(notifier);
    }
    Ok(notifiers)
}
