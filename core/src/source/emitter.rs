use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use tracing::trace;

use crate::event::RawEvent;
use crate::utils::lock;

/// Downstream of every source: the aggregator's combined stream.
pub type EventSink = Arc<dyn Fn(RawEvent) + Send + Sync>;

struct EmitterInner {
    source: String,
    active: RwLock<bool>,
    sink: EventSink,
}

/// A source's only way into the pipeline.
///
/// `emit` holds the read side of the `active` lock while forwarding, so once
/// `deactivate` returns no emit is in progress and none will succeed.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<EmitterInner>,
}

impl Emitter {
    pub fn new(source: impl Into<String>, sink: EventSink) -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                source: source.into(),
                active: RwLock::new(true),
                sink,
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// Forward `event` downstream. Returns false once deactivated.
    pub fn emit(&self, event: RawEvent) -> bool {
        let active = self.inner.active.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !*active {
            trace!(target: "river::source", source = %self.inner.source, "emit after stop dropped");
            return false;
        }
        (self.inner.sink)(event);
        true
    }

    pub fn is_active(&self) -> bool {
        *self.inner.active.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn deactivate(&self) {
        *self.inner.active.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = false;
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("source", &self.inner.source)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Emitter shared between a source and the handle the host keeps.
pub(crate) type EmitterSlot = Arc<Mutex<Option<Emitter>>>;

/// Emit through whatever emitter is currently installed in `slot`.
pub(crate) fn emit_via(slot: &EmitterSlot, event: RawEvent) -> bool {
    let emitter = lock(slot).clone();
    match emitter {
        Some(emitter) => emitter.emit(event),
        None => false,
    }
}
