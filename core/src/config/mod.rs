//! config: agent configuration and the ready signal.
//!
//! `AgentConfig` is plain serde data with defaults for everything except the
//! collection endpoint. `ConfigManager` owns the resolved config, runs the
//! `init` / `beforeReady` / `ready` hooks once, and releases `on_ready`
//! callbacks.

pub mod types;
pub mod manager;

pub use types::{
    AgentConfig, BuilderConfig, MonitorConfig, QueueConfig, ReportingPolicy, SenderConfig, SourceConfig, Strategy,
};
pub use manager::ConfigManager;
