//! In-memory version store keyed by workload identity.
//!
//! Records live for the lifetime of the process and are never removed.
//! Nothing is persisted; a restart starts from an empty store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use apptrail_core::{VersionRecord, WorkloadIdentity};

/// A version change applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Current version before this change; empty on first observation.
    pub previous_version: String,
    pub current_version: String,
    pub last_updated: DateTime<Utc>,
}

impl Transition {
    /// Whether this is the first version ever seen for the workload.
    pub fn is_first_observation(&self) -> bool {
        self.previous_version.is_empty()
    }
}

/// Shared handle to the per-workload version records.
#[derive(Clone, Default)]
pub struct VersionStore {
    records: Arc<RwLock<HashMap<WorkloadIdentity, VersionRecord>>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `declared` with the stored current version and, if they
    /// differ, shift current into previous and store the new version.
    ///
    /// The comparison and update happen under a single write lock, so two
    /// observations of the same workload never interleave.
    pub async fn apply(
        &self,
        identity: &WorkloadIdentity,
        declared: &str,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        let mut records = self.records.write().await;

        if records
            .get(identity)
            .is_some_and(|r| r.current_version == declared)
        {
            return None;
        }

        let record = records.entry(identity.clone()).or_default();
        let previous_version = std::mem::replace(&mut record.current_version, declared.to_string());
        record.previous_version = previous_version.clone();
        record.last_updated = Some(now);

        Some(Transition {
            previous_version,
            current_version: declared.to_string(),
            last_updated: now,
        })
    }

    /// Record for a single workload, if it has been observed.
    pub async fn get(&self, identity: &WorkloadIdentity) -> Option<VersionRecord> {
        self.records.read().await.get(identity).cloned()
    }

    /// All records, ordered by identity.
    pub async fn snapshot(&self) -> Vec<(WorkloadIdentity, VersionRecord)> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
