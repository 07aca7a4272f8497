//! Version gauge — one retained series per observed version transition.
//!
//! The gauge is a cheaply cloneable handle; all clones share the same
//! series map.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Label set identifying one series of the version gauge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VersionLabels {
    pub namespace: String,
    pub app: String,
    pub previous_version: String,
    pub current_version: String,
    pub last_updated: String,
}

impl VersionLabels {
    /// Label names and values in exposition order.
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("namespace", self.namespace.as_str()),
            ("app", self.app.as_str()),
            ("previous_version", self.previous_version.as_str()),
            ("current_version", self.current_version.as_str()),
            ("last_updated", self.last_updated.as_str()),
        ]
    }
}

/// Labeled gauge recording version transitions.
#[derive(Clone)]
pub struct VersionGauge {
    series: Arc<RwLock<BTreeMap<VersionLabels, f64>>>,
    /// Warn when the series count crosses a multiple of this value.
    warn_threshold: usize,
    /// Highest multiple of `warn_threshold` already warned about.
    warned_multiple: Arc<AtomicUsize>,
}

impl Default for VersionGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionGauge {
    /// Create a gauge with no cardinality warning.
    pub fn new() -> Self {
        Self::with_warn_threshold(0)
    }

    /// Create a gauge that warns as the number of series grows.
    pub fn with_warn_threshold(warn_threshold: usize) -> Self {
        Self {
            series: Arc::new(RwLock::new(BTreeMap::new())),
            warn_threshold,
            warned_multiple: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the value of the series identified by `labels`.
    pub async fn set(&self, labels: VersionLabels, value: f64) {
        let count = {
            let mut series = self.series.write().await;
            series.insert(labels, value);
            series.len()
        };
        debug!(series = count, "version gauge updated");
        self.check_cardinality(count);
    }

    /// All series, ordered by label set.
    pub async fn series(&self) -> Vec<(VersionLabels, f64)> {
        let series = self.series.read().await;
        series.iter().map(|(l, v)| (l.clone(), *v)).collect()
    }

    pub async fn series_count(&self) -> usize {
        self.series.read().await.len()
    }

    fn check_cardinality(&self, count: usize) {
        if self.warn_threshold == 0 {
            return;
        }
        let multiple = count / self.warn_threshold;
        if multiple == 0 {
            return;
        }
        let previous = self.warned_multiple.fetch_max(multiple, Ordering::Relaxed);
        if multiple > previous {
            warn!(
                series = count,
                threshold = self.warn_threshold,
                "version gauge cardinality is growing; series are never removed"
            );
        }
    }
}
