//! sender: delivery stage.
//!
//! Per message:
//! 1. `beforeSend` hooks
//! 2. resolve the endpoint (per-type override or `url`) and validate it
//! 3. primary transport, skipped when unsupported
//! 4. on any primary failure: validate again, fallback exactly once
//! 5. `afterSend` on success, `onError` when both attempts failed
//!
//! Nothing here panics or returns an error to the caller; the outcome is a
//! `DeliveryReport`.

pub mod transport;
#[cfg(feature = "http")]
pub mod http;

pub use transport::{pixel_url, Transport};
#[cfg(feature = "http")]
pub use http::{BeaconTransport, PixelTransport, SyncPostTransport};

pub use crate::config::Strategy;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SenderConfig;
use crate::constants::hook_names::sender as hooks;
use crate::event::{DeliveryState, OutgoingMessage};
use crate::hooks::HookRegistry;
use crate::scheduler::Scheduler;
use crate::telemetry::{Stage, TelemetryRecorder};
use crate::types::TransportError;
use crate::utils::{is_valid_url, panic_message};

/// Argument of the `onError` hook.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    pub message: OutgoingMessage,
    pub url: String,
    /// One entry per attempt (or skipped attempt), in order.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub state: DeliveryState,
    /// Transport that delivered the message.
    pub transport: Option<&'static str>,
    /// Transport attempts started (0..=2); one rejected by URL validation still counts.
    pub attempts: u32,
    pub error: Option<String>,
}

pub struct Sender {
    config: SenderConfig,
    primary: Option<Box<dyn Transport>>,
    fallback: Option<Box<dyn Transport>>,
    hooks: HookRegistry<OutgoingMessage>,
    error_hooks: HookRegistry<DeliveryFailure>,
    recorder: TelemetryRecorder,
}

impl Sender {
    pub fn with_transports(
        config: SenderConfig,
        primary: Option<Box<dyn Transport>>,
        fallback: Option<Box<dyn Transport>>,
        scheduler: Arc<dyn Scheduler>,
        recorder: TelemetryRecorder,
    ) -> Self {
        Self {
            config,
            primary,
            fallback,
            hooks: HookRegistry::new("sender", hooks::MESSAGE_HOOKS, Arc::clone(&scheduler)),
            error_hooks: HookRegistry::new("sender", hooks::ERROR_HOOKS, scheduler),
            recorder,
        }
    }

    /// Transports chosen from `config.strategy`, with a blocking POST fallback.
    #[cfg(feature = "http")]
    pub fn from_config(config: SenderConfig, scheduler: Arc<dyn Scheduler>, recorder: TelemetryRecorder) -> Self {
        let timeout = std::time::Duration::from_millis(config.timeout_ms);

        let primary: Result<Box<dyn Transport>, TransportError> = match config.strategy {
            Strategy::Beacon => BeaconTransport::new(timeout, config.beacon_max_bytes).map(|t| Box::new(t) as Box<dyn Transport>),
            Strategy::Image => PixelTransport::new(timeout, config.pixel_max_chars).map(|t| Box::new(t) as Box<dyn Transport>),
        };
        let primary = primary
            .map_err(|e| warn!(target: "river::sender", strategy = ?config.strategy, error = %e, "primary transport unavailable"))
            .ok();

        let fallback = SyncPostTransport::new(timeout)
            .map(|t| Box::new(t) as Box<dyn Transport>)
            .map_err(|e| warn!(target: "river::sender", error = %e, "fallback transport unavailable"))
            .ok();

        Self::with_transports(config, primary, fallback, scheduler, recorder)
    }

    /// Without the `http` feature there is nothing to send with; every
    /// message ends in `onError`.
    #[cfg(not(feature = "http"))]
    pub fn from_config(config: SenderConfig, scheduler: Arc<dyn Scheduler>, recorder: TelemetryRecorder) -> Self {
        warn!(target: "river::sender", "built without the `http` feature; no transports configured");
        Self::with_transports(config, None, None, scheduler, recorder)
    }

    /// `beforeSend` / `afterSend`.
    pub fn hooks(&self) -> &HookRegistry<OutgoingMessage> {
        &self.hooks
    }

    /// `onError`.
    pub fn error_hooks(&self) -> &HookRegistry<DeliveryFailure> {
        &self.error_hooks
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    pub fn send(&self, mut message: OutgoingMessage) -> DeliveryReport {
        let started = Instant::now();
        let mut state = DeliveryState::Enriched;
        state.advance_logged(DeliveryState::Sending);

        self.hooks.invoke(hooks::BEFORE_SEND, &mut message);

        let url = self.config.endpoint_for(message.kind()).to_string();
        let mut errors = Vec::new();
        let mut attempts = 0u32;

        let delivered_by = match message.to_json() {
            Ok(payload) => self.deliver(&url, &payload, &mut state, &mut attempts, &mut errors),
            Err(e) => {
                errors.push(TransportError::from(e).to_string());
                None
            }
        };

        let report = match delivered_by {
            Some(transport) => {
                state.advance_logged(DeliveryState::Delivered);
                self.recorder.count(|c| c.delivered += 1);
                debug!(target: "river::sender", transport, %url, attempts, "message delivered");
                self.hooks.invoke(hooks::AFTER_SEND, &mut message);
                DeliveryReport { state, transport: Some(transport), attempts, error: None }
            }
            None => {
                state.advance_logged(DeliveryState::DeliveryFailed);
                self.recorder.count(|c| c.delivery_failures += 1);
                let error = errors.join("; ");
                warn!(target: "river::sender", %url, attempts, %error, "delivery failed");
                let mut failure = DeliveryFailure { message, url, errors };
                self.error_hooks.invoke(hooks::ON_ERROR, &mut failure);
                DeliveryReport { state, transport: None, attempts, error: Some(error) }
            }
        };

        self.recorder.stage_time(Stage::Send, started.elapsed());
        report
    }

    /// Primary, then fallback once. Returns the transport that succeeded.
    fn deliver(
        &self,
        url: &str,
        payload: &Value,
        state: &mut DeliveryState,
        attempts: &mut u32,
        errors: &mut Vec<String>,
    ) -> Option<&'static str> {
        match self.primary.as_deref() {
            Some(primary) if primary.is_supported() => {
                *attempts += 1;
                match attempt(primary, url, payload) {
                    Ok(()) => return Some(primary.name()),
                    Err(e) => errors.push(format!("{}: {e}", primary.name())),
                }
            }
            Some(primary) => errors.push(TransportError::Unsupported(primary.name()).to_string()),
            None => errors.push("no primary transport".to_string()),
        }

        let fallback = self.fallback.as_deref()?;
        state.advance_logged(DeliveryState::FallbackSending);
        self.recorder.count(|c| c.fallback_attempts += 1);
        debug!(target: "river::sender", fallback = fallback.name(), reason = errors.last().map(String::as_str).unwrap_or(""), "switching to fallback");

        if !fallback.is_supported() {
            errors.push(TransportError::Unsupported(fallback.name()).to_string());
            return None;
        }

        *attempts += 1;
        match attempt(fallback, url, payload) {
            Ok(()) => Some(fallback.name()),
            Err(e) => {
                errors.push(format!("{}: {e}", fallback.name()));
                None
            }
        }
    }
}

/// URL check plus panic containment around one transport call.
fn attempt(transport: &dyn Transport, url: &str, payload: &Value) -> Result<(), TransportError> {
    if !is_valid_url(url) {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }
    match catch_unwind(AssertUnwindSafe(|| transport.send(url, payload))) {
        Ok(result) => result,
        Err(panic) => {
            warn!(target: "river::sender", transport = transport.name(), reason = %panic_message(panic.as_ref()), "transport panicked");
            Err(TransportError::Panicked(transport.name()))
        }
    }
}

