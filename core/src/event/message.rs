//! event/message.rs
//! OutgoingMessage: a RawEvent plus the context added during enrichment.

use serde::Serialize;

use crate::event::{EventKind, RawEvent};

/// Host/runtime descriptor attached by the user-agent plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub host_name: String,
    pub arch: String,
    pub cpu_count: usize,
    pub agent: String,
}

/// What goes over the wire. Serializes as the raw event's fields with the
/// enrichment fields alongside (`userId`, `traceId`, `reportTimeStamp`, ...).
///
/// Only the enrichment stage creates these; hooks mutate the public fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    #[serde(flatten)]
    event: RawEvent,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time_stamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<DeviceDescriptor>,

    /// Free-form fields added by custom plugins.
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,

    #[serde(skip)]
    enriched_at: i64,
}

impl OutgoingMessage {
    pub(crate) fn from_raw(event: RawEvent, enriched_at: i64) -> Self {
        Self {
            event,
            user_id: None,
            trace_id: None,
            report_time_stamp: None,
            user_agent: None,
            extra: serde_json::Map::new(),
            enriched_at,
        }
    }

    pub fn event(&self) -> &RawEvent {
        &self.event
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn sub_type(&self) -> &'static str {
        self.event.sub_type()
    }

    /// When the enrichment stage built this message (epoch millis).
    pub fn enriched_at(&self) -> i64 {
        self.enriched_at
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
