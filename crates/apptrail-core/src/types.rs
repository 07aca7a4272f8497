//! Domain types shared across AppTrail crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label read from a workload's metadata to determine its version.
pub const DEFAULT_VERSION_LABEL: &str = "app.kubernetes.io/version";

/// Kind of a tracked workload object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
}

impl WorkloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a watched workload: `(namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadIdentity {
    pub namespace: String,
    pub name: String,
}

impl WorkloadIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Last observed version state for a single workload.
///
/// The default value stands for a workload that has never been observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version seen before the most recent transition; empty until a
    /// second distinct version has been observed.
    pub previous_version: String,
    /// Latest observed version.
    pub current_version: String,
    /// Time of the most recent transition.
    pub last_updated: Option<DateTime<Utc>>,
}

/// A version change announced to notifier backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadUpdate {
    pub kind: WorkloadKind,
    pub name: String,
    pub namespace: String,
    pub previous_version: String,
    pub current_version: String,
}

impl WorkloadUpdate {
    pub fn identity(&self) -> WorkloadIdentity {
        WorkloadIdentity::new(&self.namespace, &self.name)
    }
}
