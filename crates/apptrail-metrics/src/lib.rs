//! apptrail-metrics — observability for AppTrail version tracking.
//!
//! Every version transition is recorded as one series of the
//! `apptrail_app_version` gauge. Series are never removed, so the set of
//! series doubles as a history of rollouts for whatever scrapes it.
//!
//! # Architecture
//!
//! ```text
//! VersionGauge
//!   ├── set() ← called by the detector on each transition
//!   └── series() → sorted label sets
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod gauge;
pub mod prometheus;

pub use gauge::{VersionGauge, VersionLabels};
pub use prometheus::render_prometheus;

/// Name of the version transition gauge.
pub const APP_VERSION_METRIC: &str = "apptrail_app_version";

/// Help text for the version transition gauge.
pub const APP_VERSION_HELP: &str = "App version for a given deployment";
