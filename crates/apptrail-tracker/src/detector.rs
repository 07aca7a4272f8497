//! Version transition detector.
//!
//! Invoked once per watch event. Compares the workload's declared version
//! with the stored one, records transitions in the store and the version
//! gauge, and produces a [`WorkloadUpdate`] for genuine changes.

use std::sync::Arc;

use chrono::SecondsFormat;
use tracing::{debug, info};

use apptrail_core::{WorkloadIdentity, WorkloadKind, WorkloadUpdate};
use apptrail_metrics::{VersionGauge, VersionLabels};

use crate::clock::{Clock, SystemClock};
use crate::store::VersionStore;

/// Outcome of observing a workload's declared version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// The stored version changed.
    pub changed: bool,
    /// Update to announce; only set when a previous version existed.
    pub update: Option<WorkloadUpdate>,
}

impl Observation {
    fn unchanged() -> Self {
        Self::default()
    }
}

/// Detects version transitions for watched workloads.
#[derive(Clone)]
pub struct VersionDetector {
    store: VersionStore,
    gauge: VersionGauge,
    clock: Arc<dyn Clock>,
    kind: WorkloadKind,
}

impl VersionDetector {
    pub fn new(store: VersionStore, gauge: VersionGauge) -> Self {
        Self::with_clock(store, gauge, Arc::new(SystemClock))
    }

    pub fn with_clock(store: VersionStore, gauge: VersionGauge, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            gauge,
            clock,
            kind: WorkloadKind::Deployment,
        }
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn gauge(&self) -> &VersionGauge {
        &self.gauge
    }

    /// Observe the declared version of a workload.
    ///
    /// A missing or empty version means there is nothing to track and
    /// leaves the store untouched.
    pub async fn observe(&self, identity: &WorkloadIdentity, declared: Option<&str>) -> Observation {
        let Some(declared) = declared.filter(|v| !v.is_empty()) else {
            debug!(workload = %identity, "no version label, skipping");
            return Observation::unchanged();
        };

        let Some(transition) = self.store.apply(identity, declared, self.clock.now()).await else {
            debug!(workload = %identity, version = %declared, "version unchanged");
            return Observation::unchanged();
        };

        self.gauge
            .set(
                VersionLabels {
                    namespace: identity.namespace.clone(),
                    app: identity.name.clone(),
                    previous_version: transition.previous_version.clone(),
                    current_version: transition.current_version.clone(),
                    last_updated: transition
                        .last_updated
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                },
                1.0,
            )
            .await;

        if transition.is_first_observation() {
            info!(
                namespace = %identity.namespace,
                name = %identity.name,
                version = %transition.current_version,
                "workload discovered"
            );
            return Observation {
                changed: true,
                update: None,
            };
        }

        info!(
            namespace = %identity.namespace,
            name = %identity.name,
            previous = %transition.previous_version,
            current = %transition.current_version,
            "workload version updated"
        );

        Observation {
            changed: true,
            update: Some(WorkloadUpdate {
                kind: self.kind,
                name: identity.name.clone(),
                namespace: identity.namespace.clone(),
                previous_version: transition.previous_version,
                current_version: transition.current_version,
            }),
        }
    }
}
