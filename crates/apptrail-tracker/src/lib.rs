//! apptrail-tracker — version transition detection for watched workloads.
//!
//! # Architecture
//!
//! ```text
//! watch event (namespace, name, version label)
//!   └── VersionDetector::observe()
//!         ├── VersionStore  (read-modify-write under one lock)
//!         ├── VersionGauge  (one series per transition)
//!         └── Option<WorkloadUpdate> → caller enqueues for notification
//! ```
//!
//! The first observation of a workload is recorded but never announced;
//! only a change from one known version to another yields an update.

pub mod clock;
pub mod detector;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use detector::{Observation, VersionDetector};
pub use store::VersionStore;
