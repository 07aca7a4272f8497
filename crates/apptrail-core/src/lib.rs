//! apptrail-core — shared types and configuration for AppTrail.
//!
//! AppTrail watches Deployments for changes to their version label,
//! records each transition as a metric series, and announces genuine
//! version changes to notifier backends.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    DispatchConfig, MetricsConfig, NotifierConfig, ServerConfig, SlackConfig, TrailConfig,
    WatchConfig, parse_duration,
};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
