use downlink_error::RouteResult;
use downlink_models::{DEFAULT_ENVELOPE_VERSION, PROPERTY_SET_TOPIC};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Injected configuration of the routing core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RouterConfig {
    /// Envelope version stamped on every command.
    pub version: String,
    /// Bound on every synchronous wait for a device reply.
    pub sync_timeout_ms: u64,
    pub topics: TopicTemplates,
}

/// Publish topic templates, keyed by command family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TopicTemplates {
    pub property_set: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_ENVELOPE_VERSION.to_string(),
            sync_timeout_ms: 10_000,
            topics: TopicTemplates::default(),
        }
    }
}

impl Default for TopicTemplates {
    fn default() -> Self {
        Self {
            property_set: PROPERTY_SET_TOPIC.to_string(),
        }
    }
}

impl RouterConfig {
    #[inline]
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    /// Load from an optional file, with `DOWNLINK_`-prefixed
    /// environment overrides (`DOWNLINK_SYNC_TIMEOUT_MS=5000`).
    pub fn from_file(path: &str) -> RouteResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DOWNLINK").separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
