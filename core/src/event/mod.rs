//! event: the pipeline's data model.
//!
//! - `RawEvent`: platform-neutral observation, immutable once created.
//! - `OutgoingMessage`: a `RawEvent` plus enrichment context, only built by
//!   the enrichment stage.
//! - `DeliveryState`: per-message lifecycle, checked transitions.

pub mod types;
pub mod message;
pub mod state;

pub use types::{
    AjaxError, AssetsError, EventKind, EventPayload, History, JsError, LayoutShift, LongTask, LongTaskContainer,
    Memory, MemoryAlert, Navigation, Paint, PaintMetric, RawEvent, Resource, StayTime, UnhandledRejection,
    UserAction, UserActionSteps, WhiteScreen,
};
pub use message::{DeviceDescriptor, OutgoingMessage};
pub use state::DeliveryState;
