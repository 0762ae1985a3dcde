//! Error taxonomy for the agent.
//!
//! - Runtime failures (source, enrichment, delivery) are contained where they
//!   happen and only surface through `tracing`.
//! - Setup failures (`ConfigError`, `AgentError`) are the only errors that are
//!   returned to the integrator, and only before the pipeline is live.

use std::io;
use thiserror::Error;

use crate::event::DeliveryState;

/// Extension point misuse (registration against a name the owner never declared).
#[derive(Debug, Error)]
pub enum HookError {
    #[error("{owner} has no hook named `{name}` (known: {known})")]
    UnknownHook {
        owner: &'static str,
        name: String,
        known: String,
    },
}

/// Source instantiation / start failures. Isolated per source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source `{name}` is not supported here: {reason}")]
    Unsupported { name: String, reason: String },

    #[error("source `{name}` failed to start: {reason}")]
    StartFailed { name: String, reason: String },
}

/// Transport-level failures. Always caught by the sender.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport `{0}` is not supported in this environment")]
    Unsupported(&'static str),

    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("payload too large: {have} > {max}")]
    PayloadTooLarge { have: usize, max: usize },

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Request(String),

    #[error("endpoint answered with status {0}")]
    Status(u16),

    #[error("transport `{0}` panicked")]
    Panicked(&'static str),
}

/// Key/value persistence failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Illegal per-message lifecycle transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal delivery transition {from:?} -> {to:?}")]
    IllegalTransition { from: DeliveryState, to: DeliveryState },
}

/// Integrator programming errors. Fatal at setup time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unknown plugin target `{0}`")]
    UnknownPluginTarget(String),

    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error returned by `Client` setup calls.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("plugin `{name}` failed to apply: {reason}")]
    Plugin { name: String, reason: String },

    #[error("client is not initialized")]
    NotInitialized,
}
