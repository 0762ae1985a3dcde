//! river-core
//!
//! Client-side telemetry agent.
//! Sources -> aggregator -> ingestion queue -> enrichment -> delivery.
//! Nothing in here is allowed to break the host application.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod logging;

// Extension points + scheduling
pub mod hooks;
pub mod scheduler;

// Data model
pub mod event;
pub mod storage;
pub mod config;

// Pipeline stages
pub mod source;
pub mod aggregator;
pub mod queue;
pub mod enrich;
pub mod sender;

// Self-metrics
pub mod telemetry;

// Wiring
pub mod plugins;
pub mod client;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::client::{Client, PipelineContext};
    pub use crate::config::{AgentConfig, ConfigManager};
    pub use crate::event::{EventKind, EventPayload, OutgoingMessage, RawEvent};
    pub use crate::hooks::{HookMode, HookRegistry};
    pub use crate::plugins::{ApplyPlugin, ComponentRef, Plugin, PluginTarget};
    pub use crate::scheduler::{LoopScheduler, ManualScheduler, Scheduler};
    pub use crate::source::{Emitter, EventSource};
    pub use crate::types::{AgentError, ConfigError};
}
