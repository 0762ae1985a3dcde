//! telemetry/mod.rs
//! Pipeline counters, stage timers, and immutable snapshots.
//!
//! Each stage gets a cloned `TelemetryRecorder`; `Client::snapshot` turns the
//! shared state into a `TelemetrySnapshot`.

pub mod counters;
pub mod timers;
pub mod snapshot;
pub mod recorder;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
pub use recorder::*;
