//! source: the event-source boundary.
//!
//! A source observes something on the host and turns it into `RawEvent`s. It
//! never talks to the pipeline directly: `start` hands it an `Emitter`, and
//! after `stop` that emitter refuses further events.
//!
//! Bundled sources:
//! - `ManualSource`: host pushes events through a `ManualHandle`.
//! - `RequestObserver`: wraps requests the host routes through it and reports
//!   failed ones as `ajaxError`.
//! - `ShiftAccumulator`: layout-shift bookkeeping for `paint/cls`.

pub mod emitter;
pub mod manual;
pub mod request;
pub mod shift;

pub use emitter::{Emitter, EventSink};
pub use manual::{ManualHandle, ManualSource};
pub use request::{RequestHandle, RequestObserver, RequestOutcome};
pub use shift::ShiftAccumulator;

pub use crate::config::{ReportingPolicy, SourceConfig};

use crate::types::SourceError;

pub trait EventSource: Send {
    fn name(&self) -> &str;

    /// Begin observing. Events go through `emitter` until `stop`.
    fn start(&mut self, emitter: Emitter) -> Result<(), SourceError>;

    fn stop(&mut self);
}
