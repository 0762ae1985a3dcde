use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    BEACON_MAX_BYTES, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_MAX_BATCH, DEFAULT_TIME_SLICE_MS,
    DEFAULT_TRANSPORT_TIMEOUT_MS, PIXEL_MAX_CHARS,
};
use crate::event::EventKind;
use crate::types::ConfigError;
use crate::utils::is_valid_url;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    pub monitor: MonitorConfig,
    pub builder: BuilderConfig,
    pub sender: SenderConfig,
    pub queue: QueueConfig,
    /// Turns on the built-in logger plugin.
    pub debug: bool,
}

impl AgentConfig {
    /// Minimal config: defaults plus the collection endpoint.
    pub fn with_url(url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.sender.url = url.into();
        config
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sender.validate()?;
        self.queue.validate()
    }
}

// -----------------------------------------------------------------------------
// Monitor
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportingPolicy {
    /// Running total over the whole page lifetime.
    Cumulative,
    /// Each window's value once, then reset.
    #[default]
    Windowed,
}

/// Per-source settings. Everything besides `enable` and `reporting` is handed
/// to the source factory as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enable: bool,
    /// Per-source override of `monitor.reporting`; filled in by
    /// `MonitorConfig::source` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting: Option<ReportingPolicy>,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { enable: true, reporting: None, options: serde_json::Map::new() }
    }
}

impl SourceConfig {
    pub fn disabled() -> Self {
        Self { enable: false, ..Self::default() }
    }

    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }

    pub fn reporting(&self) -> ReportingPolicy {
        self.reporting.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Keyed by source name. Sources without an entry use `SourceConfig::default()`.
    pub sources: BTreeMap<String, SourceConfig>,
    pub reporting: ReportingPolicy,
}

impl MonitorConfig {
    /// Settings for source `name`, with the monitor-wide reporting policy
    /// applied unless the source overrides it.
    pub fn source(&self, name: &str) -> SourceConfig {
        let mut config = self.sources.get(name).cloned().unwrap_or_default();
        config.reporting.get_or_insert(self.reporting);
        config
    }
}

// -----------------------------------------------------------------------------
// Builder
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Attach the host descriptor (`userAgent`) to every message.
    pub device_info: bool,
    /// Where the visitor id persists. `None` keeps it for the process only.
    pub visitor_store_path: Option<PathBuf>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { device_info: true, visitor_store_path: None }
    }
}

// -----------------------------------------------------------------------------
// Sender
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Background POST with a JSON body.
    #[default]
    Beacon,
    /// Tracking-pixel GET with the payload in `?data=`.
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SenderConfig {
    pub strategy: Strategy,
    pub url: String,
    /// Per-type endpoint overrides.
    pub urls: HashMap<EventKind, String>,
    pub timeout_ms: u64,
    pub pixel_max_chars: usize,
    pub beacon_max_bytes: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            url: String::new(),
            urls: HashMap::new(),
            timeout_ms: DEFAULT_TRANSPORT_TIMEOUT_MS,
            pixel_max_chars: PIXEL_MAX_CHARS,
            beacon_max_bytes: BEACON_MAX_BYTES,
        }
    }
}

impl SenderConfig {
    /// Endpoint for `kind`: the override if present, else `url`.
    pub fn endpoint_for(&self, kind: EventKind) -> &str {
        self.urls.get(&kind).map(String::as_str).unwrap_or(&self.url)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Missing("sender.url"));
        }
        if !is_valid_url(&self.url) {
            return Err(ConfigError::Invalid { field: "sender.url", reason: format!("`{}` is not an http(s) url", self.url) });
        }
        if let Some((kind, url)) = self.urls.iter().find(|(_, url)| !is_valid_url(url)) {
            return Err(ConfigError::Invalid { field: "sender.urls", reason: format!("override for `{kind}` is not an http(s) url: `{url}`") });
        }
        if self.pixel_max_chars == 0 {
            return Err(ConfigError::Invalid { field: "sender.pixelMaxChars", reason: "must be > 0".into() });
        }
        if self.beacon_max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "sender.beaconMaxBytes", reason: "must be > 0".into() });
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Queue
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueConfig {
    pub max_batch: usize,
    pub time_slice_ms: u64,
    /// Idle request timeout; a cycle is forced to run after this long.
    pub timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
            time_slice_ms: DEFAULT_TIME_SLICE_MS,
            timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl QueueConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch == 0 {
            return Err(ConfigError::Invalid { field: "queue.maxBatch", reason: "must be > 0".into() });
        }
        if self.time_slice_ms == 0 {
            return Err(ConfigError::Invalid { field: "queue.timeSliceMs", reason: "must be > 0".into() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_queue_constants() {
        let q = QueueConfig::default();
        assert_eq!(q.max_batch, 15);
        assert_eq!(q.time_slice_ms, 5);
        assert_eq!(q.timeout_ms, 2_000);
    }

    #[test]
    fn endpoint_override_wins() {
        let mut s = AgentConfig::with_url("https://a.example/r").sender;
        s.urls.insert(EventKind::Error, "https://errors.example/r".into());
        assert_eq!(s.endpoint_for(EventKind::Error), "https://errors.example/r");
        assert_eq!(s.endpoint_for(EventKind::PageView), "https://a.example/r");
    }

    #[test]
    fn source_options_pass_through() {
        let json = r#"{ "monitor": { "sources": { "memory": { "enable": false, "interval": 30 } } } }"#;
        let config = AgentConfig::from_json_str(json).unwrap();
        let memory = config.monitor.source("memory");
        assert!(!memory.enable);
        assert_eq!(memory.option("interval"), Some(&serde_json::json!(30)));
        assert!(config.monitor.source("unlisted").enable);
    }
}
