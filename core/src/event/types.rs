//! event/types.rs
//! RawEvent and its per-subtype payloads.
//!
//! Wire shape (kept identical to what collectors already ingest):
//!
//! ```text
//! { "type": "error",
//!   "info": { "subType": "jsError", "pageUrl": "...", "errorMsg": "...", ... },
//!   "timeStamp": 1700000000000 }
//! ```
//!
//! `type` is derived from the payload variant, so (`type`, `subType`) can never
//! disagree on a constructed event; deserialization rejects a mismatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Error,
    Performance,
    UserAction,
    PageView,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [EventKind::Error, EventKind::Performance, EventKind::UserAction, EventKind::PageView];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Error => "error",
            EventKind::Performance => "performance",
            EventKind::UserAction => "userAction",
            EventKind::PageView => "pageView",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// Payloads
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsError {
    pub error_msg: String,
    pub filename: String,
    pub line: u32,
    pub col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsError {
    pub resource_url: String,
    pub tag_name: String,
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AjaxError {
    pub status: u16,
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnhandledRejection {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub dns: f64,
    pub tcp: f64,
    pub ssl: f64,
    pub ttfb: f64,
    pub download: f64,
    pub dom_ready: f64,
    pub full_load: f64,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
    pub decoded_body_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintMetric {
    Fcp,
    Lcp,
    Fid,
    Cls,
    Inp,
    Ttfb,
    Load,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutShift {
    pub value: f64,
    #[serde(default)]
    pub sources: Vec<String>,
    pub timestamp: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    pub extra_desc: PaintMetric,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_shifts: Option<Vec<LayoutShift>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub initiator_type: String,
    pub url: String,
    pub duration: f64,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongTaskContainer {
    Object,
    Window,
    Iframe,
    Embed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTask {
    pub duration: f64,
    pub container: LongTaskContainer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryAlert {
    MemoryLeak,
    MemoryOverflow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub extra_desc: MemoryAlert,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_usage_alert: Option<f64>,
    #[serde(rename = "usedMB")]
    pub used_mb: f64,
    #[serde(rename = "totalMB", default, skip_serializing_if = "Option::is_none")]
    pub total_mb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteScreen {
    pub empty_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    pub action: String,
    pub target: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActionSteps {
    pub steps: Vec<UserAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayTime {
    pub duration: f64,
}

/// Payload keyed by `subType`. Each variant fixes the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subType")]
pub enum EventPayload {
    #[serde(rename = "jsError")]
    JsError(JsError),
    #[serde(rename = "assetsError")]
    AssetsError(AssetsError),
    #[serde(rename = "ajaxError")]
    AjaxError(AjaxError),
    #[serde(rename = "unhandledrejectionError")]
    UnhandledRejection(UnhandledRejection),

    #[serde(rename = "paint")]
    Paint(Paint),
    #[serde(rename = "resource")]
    Resource(Resource),
    #[serde(rename = "longTask")]
    LongTask(LongTask),
    #[serde(rename = "memory")]
    Memory(Memory),
    #[serde(rename = "whiteScreen")]
    WhiteScreen(WhiteScreen),
    #[serde(rename = "pageBlock")]
    PageBlock,
    #[serde(rename = "navigation")]
    Navigation(Navigation),

    #[serde(rename = "userActionSteps")]
    UserActionSteps(UserActionSteps),

    #[serde(rename = "history")]
    History(History),
    #[serde(rename = "time")]
    Time(StayTime),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        use EventPayload::*;
        match self {
            JsError(_) | AssetsError(_) | AjaxError(_) | UnhandledRejection(_) => EventKind::Error,
            Paint(_) | Resource(_) | LongTask(_) | Memory(_) | WhiteScreen(_) | PageBlock | Navigation(_) => {
                EventKind::Performance
            }
            UserActionSteps(_) => EventKind::UserAction,
            History(_) | Time(_) => EventKind::PageView,
        }
    }

    pub fn sub_type(&self) -> &'static str {
        use EventPayload::*;
        match self {
            JsError(_) => "jsError",
            AssetsError(_) => "assetsError",
            AjaxError(_) => "ajaxError",
            UnhandledRejection(_) => "unhandledrejectionError",
            Paint(_) => "paint",
            Resource(_) => "resource",
            LongTask(_) => "longTask",
            Memory(_) => "memory",
            WhiteScreen(_) => "whiteScreen",
            PageBlock => "pageBlock",
            Navigation(_) => "navigation",
            UserActionSteps(_) => "userActionSteps",
            History(_) => "history",
            Time(_) => "time",
        }
    }
}

// -----------------------------------------------------------------------------
// RawEvent
// -----------------------------------------------------------------------------

/// One observation, as captured. No setters: immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEventRepr", into = "RawEventRepr")]
pub struct RawEvent {
    kind: EventKind,
    page_url: String,
    payload: EventPayload,
    captured_at: i64,
}

impl RawEvent {
    /// Capture now.
    pub fn new(page_url: impl Into<String>, payload: EventPayload) -> Self {
        Self::at(page_url, payload, now_millis())
    }

    /// Capture at an explicit epoch-millis timestamp.
    pub fn at(page_url: impl Into<String>, payload: EventPayload, captured_at: i64) -> Self {
        Self {
            kind: payload.kind(),
            page_url: page_url.into(),
            payload,
            captured_at,
        }
    }

    pub fn js_error(page_url: impl Into<String>, message: impl Into<String>, filename: impl Into<String>, line: u32, col: u32) -> Self {
        Self::new(
            page_url,
            EventPayload::JsError(JsError {
                error_msg: message.into(),
                filename: filename.into(),
                line,
                col,
                stack: None,
            }),
        )
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn sub_type(&self) -> &'static str {
        self.payload.sub_type()
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }
}

#[derive(Serialize, Deserialize)]
struct RawEventRepr {
    #[serde(rename = "type")]
    kind: EventKind,
    info: InfoRepr,
    #[serde(rename = "timeStamp")]
    captured_at: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoRepr {
    page_url: String,
    #[serde(flatten)]
    payload: EventPayload,
}

impl TryFrom<RawEventRepr> for RawEvent {
    type Error = String;

    fn try_from(repr: RawEventRepr) -> Result<Self, Self::Error> {
        let expected = repr.info.payload.kind();
        if repr.kind != expected {
            return Err(format!(
                "subType `{}` belongs to type `{}`, not `{}`",
                repr.info.payload.sub_type(),
                expected,
                repr.kind
            ));
        }

        Ok(RawEvent::at(repr.info.page_url, repr.info.payload, repr.captured_at))
    }
}

impl From<RawEvent> for RawEventRepr {
    fn from(event: RawEvent) -> Self {
        RawEventRepr {
            kind: event.kind,
            info: InfoRepr { page_url: event.page_url, payload: event.payload },
            captured_at: event.captured_at,
        }
    }
}
