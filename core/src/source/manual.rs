use std::sync::{Arc, Mutex};

use crate::event::RawEvent;
use crate::source::emitter::{emit_via, EmitterSlot};
use crate::source::{Emitter, EventSource};
use crate::types::SourceError;
use crate::utils::lock;

/// Source fed by the host through a [`ManualHandle`].
pub struct ManualSource {
    name: String,
    slot: EmitterSlot,
}

#[derive(Clone)]
pub struct ManualHandle {
    slot: EmitterSlot,
}

impl ManualSource {
    pub fn new(name: impl Into<String>) -> (Self, ManualHandle) {
        let slot: EmitterSlot = Arc::new(Mutex::new(None));
        (Self { name: name.into(), slot: Arc::clone(&slot) }, ManualHandle { slot })
    }
}

impl EventSource for ManualSource {
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

impl ManualHandle {
    /// False if the source is not running.
    pub fn push(&self, event: RawEvent) -> bool {
        emit_via(&self.slot, event)
    }

    pub fn is_live(&self) -> bool {
        lock(&self.slot).as_ref().is_some_and(Emitter::is_active)
    }
}
