//! enrich: turns a `RawEvent` into an `OutgoingMessage`.
//!
//! The stage itself adds nothing but the enrichment timestamp; every field
//! (`userId`, `traceId`, `reportTimeStamp`, `userAgent`, ...) comes from
//! `beforeBuild` / `afterBuild` hooks registered by plugins.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{trace, warn};

use crate::constants::hook_names::builder as hooks;
use crate::event::{OutgoingMessage, RawEvent};
use crate::hooks::HookRegistry;
use crate::scheduler::Scheduler;
use crate::telemetry::{Stage, TelemetryRecorder};
use crate::utils::{now_millis, panic_message};

pub struct Enricher {
    hooks: HookRegistry<OutgoingMessage>,
    recorder: TelemetryRecorder,
}

impl Enricher {
    pub fn new(scheduler: Arc<dyn Scheduler>, recorder: TelemetryRecorder) -> Self {
        Self {
            hooks: HookRegistry::new("builder", hooks::ALL, scheduler),
            recorder,
        }
    }

    pub fn hooks(&self) -> &HookRegistry<OutgoingMessage> {
        &self.hooks
    }

    /// `None` means the event was dropped; it is not retried.
    pub fn process(&self, raw: RawEvent) -> Option<OutgoingMessage> {
        let started = Instant::now();
        let (kind, sub_type) = (raw.kind(), raw.sub_type());

        let built = guarded(|| self.build(raw));
        self.recorder.stage_time(Stage::Enrich, started.elapsed());

        match built {
            Ok(message) => {
                self.recorder.count(|c| c.enriched += 1);
                trace!(target: "river::enrich", %kind, sub_type, "message built");
                Some(message)
            }
            Err(reason) => {
                self.recorder.count(|c| c.enrich_failures += 1);
                warn!(target: "river::enrich", %kind, sub_type, %reason, "enrichment failed; event dropped");
                None
            }
        }
    }

    fn build(&self, raw: RawEvent) -> OutgoingMessage {
        let mut message = OutgoingMessage::from_raw(raw, now_millis());
        self.hooks.invoke(hooks::BEFORE_BUILD, &mut message);
        self.hooks.invoke(hooks::AFTER_BUILD, &mut message);
        message
    }
}

/// Outer containment for a whole enrichment pass.
fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| panic_message(panic.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_turns_panic_into_error() {
        let out: Result<(), String> = guarded(|| panic!("builder exploded"));
        assert_eq!(out.unwrap_err(), "builder exploded");
    }

    #[test]
    fn guarded_passes_value_through() {
        assert_eq!(guarded(|| 7), Ok(7));
    }
}
