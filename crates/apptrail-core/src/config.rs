//! apptrail.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::DEFAULT_VERSION_LABEL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub watch: WatchConfig,
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub metrics: MetricsConfig,
    pub notifiers: Vec<NotifierConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Restrict the watch to one namespace. All namespaces when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub version_label: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            version_label: DEFAULT_VERSION_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the inbound update queue. Updates arriving while the
    /// queue is full are dropped.
    pub queue_capacity: usize,
    /// Upper bound on a single backend delivery.
    pub notify_timeout: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            notify_timeout: "10s".to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn notify_timeout(&self) -> ConfigResult<Duration> {
        parse_duration(&self.notify_timeout)
            .ok_or_else(|| ConfigError::InvalidDuration(self.notify_timeout.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Warn each time the version gauge grows past a multiple of this
    /// many series. Zero disables the warning.
    pub series_warn_threshold: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            series_warn_threshold: 10_000,
        }
    }
}

/// A notifier backend, in the order it should be invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    Slack(SlackConfig),
    Log,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Name of an environment variable holding the webhook URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url_env: Option<String>,
    /// Request timeout for the webhook call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl SlackConfig {
    /// Resolve the webhook URL from the inline value or the environment.
    pub fn webhook_url(&self) -> ConfigResult<String> {
        self.webhook_url_with(|key| std::env::var(key).ok())
    }

    /// Same as [`SlackConfig::webhook_url`] with an explicit variable lookup.
    pub fn webhook_url_with<F>(&self, lookup: F) -> ConfigResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = self.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        match self.webhook_url_env.as_deref() {
            Some(key) => lookup(key).filter(|u| !u.is_empty()).ok_or_else(|| {
                ConfigError::Invalid {
                    field: "notifiers.slack.webhook_url_env",
                    reason: format!("environment variable {key} is not set"),
                }
            }),
            None => Err(ConfigError::Invalid {
                field: "notifiers.slack",
                reason: "one of webhook_url or webhook_url_env is required".to_string(),
            }),
        }
    }

    pub fn timeout(&self) -> ConfigResult<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|t| parse_duration(t).ok_or_else(|| ConfigError::InvalidDuration(t.to_string())))
            .transpose()
    }
}

impl TrailConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: TrailConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.watch.version_label.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "watch.version_label",
                reason: "must not be empty".to_string(),
            });
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch.queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        self.dispatch.notify_timeout()?;
        for notifier in &self.notifiers {
            if let NotifierConfig::Slack(slack) = notifier {
                slack.timeout()?;
            }
        }
        Ok(())
    }

    /// Scaffold a config with a Slack webhook read from the environment
    /// and a log notifier.
    pub fn scaffold() -> Self {
        TrailConfig {
            notifiers: vec![
                NotifierConfig::Slack(SlackConfig {
                    webhook_url: None,
                    webhook_url_env: Some("SLACK_WEBHOOK_URL".to_string()),
                    timeout: Some("5s".to_string()),
                }),
                NotifierConfig::Log,
            ],
            ..Default::default()
        }
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = TrailConfig::from_toml_str("").unwrap();
        assert_eq!(config.watch.version_label, DEFAULT_VERSION_LABEL);
        assert_eq!(config.watch.namespace, None);
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.dispatch.queue_capacity, 1024);
        assert_eq!(
            config.dispatch.notify_timeout().unwrap(),
            Duration::from_secs(10)
        );
        assert!(config.notifiers.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[watch]
namespace = "production"
version_label = "example.com/release"

[server]
listen = "127.0.0.1:9090"

[dispatch]
queue_capacity = 16
notify_timeout = "500ms"

[metrics]
series_warn_threshold = 50

[[notifiers]]
type = "slack"
webhook_url = "https://hooks.example.com/T000/B000"
timeout = "3s"

[[notifiers]]
type = "log"
"#;
        let config = TrailConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.watch.namespace.as_deref(), Some("production"));
        assert_eq!(config.watch.version_label, "example.com/release");
        assert_eq!(config.dispatch.queue_capacity, 16);
        assert_eq!(
            config.dispatch.notify_timeout().unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(config.metrics.series_warn_threshold, 50);
        assert_eq!(config.notifiers.len(), 2);
        match &config.notifiers[0] {
            NotifierConfig::Slack(slack) => {
                assert_eq!(
                    slack.webhook_url().unwrap(),
                    "https://hooks.example.com/T000/B000"
                );
                assert_eq!(slack.timeout().unwrap(), Some(Duration::from_secs(3)));
            }
            other => panic!("expected slack notifier, got {other:?}"),
        }
        assert_eq!(config.notifiers[1], NotifierConfig::Log);
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let err = TrailConfig::from_toml_str("[dispatch]\nqueue_capacity = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "dispatch.queue_capacity",
                ..
            }
        ));
    }

    #[test]
    fn bad_timeout_rejected() {
        let err =
            TrailConfig::from_toml_str("[dispatch]\nnotify_timeout = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(_)));
    }

    #[test]
    fn unknown_notifier_type_rejected() {
        let err = TrailConfig::from_toml_str("[[notifiers]]\ntype = \"pager\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn slack_webhook_from_env() {
        let slack = SlackConfig {
            webhook_url_env: Some("HOOK".to_string()),
            ..Default::default()
        };
        let url = slack
            .webhook_url_with(|key| (key == "HOOK").then(|| "https://hook".to_string()))
            .unwrap();
        assert_eq!(url, "https://hook");

        assert!(slack.webhook_url_with(|_| None).is_err());
    }

    #[test]
    fn slack_without_url_rejected() {
        let slack = SlackConfig::default();
        assert!(slack.webhook_url_with(|_| None).is_err());
    }

    #[test]
    fn scaffold_parses_back() {
        let scaffold = TrailConfig::scaffold();
        let text = scaffold.to_toml_string().unwrap();
        assert!(text.contains("SLACK_WEBHOOK_URL"));
        let parsed = TrailConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, scaffold);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apptrail.toml");
        std::fs::write(&path, "[server]\nlisten = \"127.0.0.1:1\"\n").unwrap();
        let config = TrailConfig::from_file(&path).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:1");

        let missing = TrailConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("later"), None);
        assert_eq!(parse_duration("307445734561825861m"), None);
    }

    #[test]
    fn oversized_minutes_are_rejected_not_panicking() {
        let text = "[dispatch]\nnotify_timeout = \"307445734561825861m\"\n";
        let err = TrailConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(t) if t == "307445734561825861m"));
    }
}
