//! aggregator: fan-in of every configured source into one stream.
//!
//! - Entries are instantiated once at construction; disabled entries and
//!   failing factories are skipped with a log line.
//! - `start` hands each source an `Emitter` bound to the subscribed sink.
//! - `stop` deactivates those emitters first, so nothing reaches the sink
//!   after it returns, then stops the sources and releases the sink.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::constants::hook_names::monitor as hooks;
use crate::hooks::HookRegistry;
use crate::scheduler::Scheduler;
use crate::source::{Emitter, EventSink, EventSource};
use crate::types::SourceError;
use crate::utils::{lock, panic_message};

pub type SourceFactory = Box<dyn FnOnce(&SourceConfig) -> Result<Box<dyn EventSource>, SourceError> + Send>;

pub struct SourceEntry {
    pub name: String,
    pub config: SourceConfig,
    pub factory: SourceFactory,
}

impl SourceEntry {
    pub fn new<F>(name: impl Into<String>, config: SourceConfig, factory: F) -> Self
    where
        F: FnOnce(&SourceConfig) -> Result<Box<dyn EventSource>, SourceError> + Send + 'static,
    {
        Self { name: name.into(), config, factory: Box::new(factory) }
    }
}

struct Running {
    source: Box<dyn EventSource>,
    emitter: Option<Emitter>,
}

#[derive(Default)]
struct AggregatorState {
    sources: Vec<Running>,
    sink: Option<EventSink>,
    started: bool,
}

pub struct Aggregator {
    state: Mutex<AggregatorState>,
    hooks: HookRegistry<()>,
}

impl Aggregator {
    pub fn new(entries: Vec<SourceEntry>, scheduler: Arc<dyn Scheduler>) -> Self {
        let mut sources = Vec::with_capacity(entries.len());

        for SourceEntry { name, config, factory } in entries {
            if !config.enable {
                debug!(target: "river::aggregator", source = %name, "source disabled");
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| factory(&config))) {
                Ok(Ok(source)) => sources.push(Running { source, emitter: None }),
                Ok(Err(e)) => warn!(target: "river::aggregator", source = %name, error = %e, "source skipped"),
                Err(panic) => {
                    warn!(target: "river::aggregator", source = %name, reason = %panic_message(panic.as_ref()), "source factory panicked")
                }
            }
        }

        Self {
            state: Mutex::new(AggregatorState { sources, ..Default::default() }),
            hooks: HookRegistry::new("monitor", hooks::ALL, scheduler),
        }
    }

    pub fn hooks(&self) -> &HookRegistry<()> {
        &self.hooks
    }

    pub fn subscribe(&self, sink: EventSink) {
        lock(&self.state).sink = Some(sink);
    }

    pub fn is_started(&self) -> bool {
        lock(&self.state).started
    }

    pub fn active_sources(&self) -> Vec<String> {
        lock(&self.state).sources.iter().map(|r| r.source.name().to_string()).collect()
    }

    /// Idempotent. Sources that fail to start stay registered but silent.
    pub fn start(&self) {
        {
            let state = lock(&self.state);
            if state.started {
                return;
            }
            if state.sink.is_none() {
                warn!(target: "river::aggregator", "start without a subscriber ignored");
                return;
            }
        }

        self.hooks.invoke(hooks::BEFORE_START, &mut ());

        let mut state = lock(&self.state);
        let Some(sink) = state.sink.clone() else {
            return;
        };

        let mut live = 0usize;
        for running in state.sources.iter_mut() {
            let name = running.source.name().to_string();
            let emitter = Emitter::new(name.clone(), Arc::clone(&sink));

            match catch_unwind(AssertUnwindSafe(|| running.source.start(emitter.clone()))) {
                Ok(Ok(())) => {
                    running.emitter = Some(emitter);
                    live += 1;
                }
                Ok(Err(e)) => {
                    emitter.deactivate();
                    warn!(target: "river::aggregator", source = %name, error = %e, "source failed to start");
                }
                Err(panic) => {
                    emitter.deactivate();
                    warn!(target: "river::aggregator", source = %name, reason = %panic_message(panic.as_ref()), "source panicked on start");
                }
            }
        }

        state.started = true;
        info!(target: "river::aggregator", live, total = state.sources.len(), "aggregator started");
    }

    /// Stop every source. `start` may be called again after `subscribe`.
    pub fn stop(&self) {
        if !self.is_started() {
            return;
        }

        self.hooks.invoke(hooks::BEFORE_STOP, &mut ());

        let mut state = lock(&self.state);
        for running in state.sources.iter_mut() {
            if let Some(emitter) = running.emitter.take() {
                emitter.deactivate();
            }
            let name = running.source.name().to_string();
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| running.source.stop())) {
                warn!(target: "river::aggregator", source = %name, reason = %panic_message(panic.as_ref()), "source panicked on stop");
            }
        }

        state.sink = None;
        state.started = false;
        info!(target: "river::aggregator", "aggregator stopped");
    }
}
