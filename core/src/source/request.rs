//! source/request.rs
//! Explicit request interception.
//!
//! The host routes outgoing requests through `RequestHandle::observe`; nothing
//! is patched globally. A request is reported as `ajaxError` when it answers
//! with status >= 400 or fails outright (reported with status 0).

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

use crate::event::{AjaxError, EventPayload, RawEvent};
use crate::source::emitter::{emit_via, EmitterSlot};
use crate::source::{Emitter, EventSource};
use crate::types::SourceError;
use crate::utils::lock;

#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub status: u16,
    pub status_text: String,
    pub response: Option<serde_json::Value>,
}

impl RequestOutcome {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self { status, status_text: status_text.into(), response: None }
    }

    pub fn is_failure(&self) -> bool {
        self.status >= 400 || self.status == 0
    }
}

pub struct RequestObserver {
    name: String,
    slot: EmitterSlot,
}

#[derive(Clone)]
pub struct RequestHandle {
    slot: EmitterSlot,
    page_url: Arc<Mutex<String>>,
}

impl RequestObserver {
    pub fn new(name: impl Into<String>) -> (Self, RequestHandle) {
        let slot: EmitterSlot = Arc::new(Mutex::new(None));
        let handle = RequestHandle { slot: Arc::clone(&slot), page_url: Arc::new(Mutex::new(String::new())) };
        (Self { name: name.into(), slot }, handle)
    }
}

impl EventSource for RequestObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, emitter: Emitter) -> Result<(), SourceError> {
        *lock(&self.slot) = Some(emitter);
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.slot).take();
    }
}

impl RequestHandle {
    /// Location reported as `pageUrl` on subsequent events.
    pub fn set_page_url(&self, page_url: impl Into<String>) {
        *lock(&self.page_url) = page_url.into();
    }

    /// Run `request`, report it if it failed, and hand its result back
    /// unchanged.
    pub fn observe<F, E>(&self, method: &str, url: &str, request: F) -> Result<RequestOutcome, E>
    where
        F: FnOnce() -> Result<RequestOutcome, E>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let result = request();
        let cost_time = started.elapsed().as_millis() as u64;

        let failure = match &result {
            Ok(outcome) if outcome.is_failure() => Some(AjaxError {
                status: outcome.status,
                status_text: outcome.status_text.clone(),
                url: Some(url.to_string()),
                method: Some(method.to_string()),
                response: outcome.response.clone(),
                cost_time: Some(cost_time),
            }),
            Ok(_) => None,
            Err(e) => Some(AjaxError {
                status: 0,
                status_text: e.to_string(),
                url: Some(url.to_string()),
                method: Some(method.to_string()),
                response: None,
                cost_time: Some(cost_time),
            }),
        };

        if let Some(payload) = failure {
            let page_url = lock(&self.page_url).clone();
            let status = payload.status;
            let emitted = emit_via(&self.slot, RawEvent::new(page_url, EventPayload::AjaxError(payload)));
            debug!(target: "river::source", method, url, status, emitted, "request failure observed");
        }

        result
    }
}
