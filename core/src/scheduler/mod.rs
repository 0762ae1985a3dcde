//! scheduler: cooperative, time-bounded scheduling for the pipeline.
//!
//! The pipeline has exactly one suspension point (the ingestion queue's drain
//! cycle). Everything it needs from the host is captured by [`Scheduler`]:
//! - `request_idle`: run a task in a time-bounded slice, reporting whether the
//!   slice was granted because the timeout expired.
//! - `defer`: run a task after the current turn (deferred hooks).
//!
//! Two implementations:
//! - [`ManualScheduler`]: driven by the host loop (or a test), fully deterministic.
//! - [`LoopScheduler`]: timer-based approximation on one dedicated agent thread.

pub mod idle;
pub mod manual;
pub mod agent_loop;
pub mod policy;

pub use idle::{DeferredTask, FixedDeadline, IdleDeadline, IdleTask, Scheduler, SliceDeadline};
pub use manual::ManualScheduler;
pub use agent_loop::LoopScheduler;
pub use policy::DrainPolicy;
