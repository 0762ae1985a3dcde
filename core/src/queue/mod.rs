//! queue: ingestion buffer drained in idle time.
//!
//! - `enqueue` is O(1) and never runs downstream work itself.
//! - Draining happens in scheduler idle slices, one cycle at a time
//!   (single-flight), each bounded by `DrainPolicy`.
//! - Nothing is dropped before `start`; `stop` discards what is pending.

pub mod ingestion;
pub mod stats;

pub use ingestion::{Forward, IngestionQueue};
pub use stats::QueueStats;
