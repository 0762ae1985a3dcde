//! client.rs
//! Pipeline assembly and the integrator-facing lifecycle.
//!
//! ```text
//! Client::new   validate config, create the ingestion queue
//! register_*    sources, plugins, transports (before init)
//! init          resolve config, build PipelineContext, apply plugins, wire
//! start / stop  aggregator + queue draining
//! report        manual events, buffered from the moment the client exists
//! ```
//!
//! The context is an explicit object; stages reach each other only through
//! the closures wired in `init`. The queue's consumer holds a `Weak` to the
//! context, so dropping the client tears everything down.

use std::sync::{Arc, Weak};

use anyhow::anyhow;
use tracing::{info, warn};

use crate::aggregator::{Aggregator, SourceEntry, SourceFactory};
use crate::config::{AgentConfig, ConfigManager, SourceConfig};
use crate::enrich::Enricher;
use crate::event::{DeliveryState, RawEvent};
use crate::plugins::{
    ApplyPlugin, ComponentRef, IdPlugin, LocaltimePlugin, LoggerPlugin, Plugin, PluginTarget, UserAgentPlugin,
};
use crate::queue::IngestionQueue;
use crate::scheduler::Scheduler;
use crate::sender::{Sender, Transport};
use crate::source::{EventSink, EventSource};
use crate::telemetry::{TelemetryRecorder, TelemetrySnapshot};
use crate::types::{AgentError, SourceError};

/// Every live stage of one pipeline.
pub struct PipelineContext {
    config: Arc<ConfigManager>,
    aggregator: Aggregator,
    queue: IngestionQueue<RawEvent>,
    enricher: Enricher,
    sender: Sender,
}

impl PipelineContext {
    /// The component a plugin with `target` is applied to.
    pub fn component(&self, target: PluginTarget) -> ComponentRef<'_> {
        match target {
            PluginTarget::ConfigManager => ComponentRef::ConfigManager(&self.config),
            PluginTarget::Monitor => ComponentRef::Monitor(&self.aggregator),
            PluginTarget::Builder => ComponentRef::Builder(&self.enricher),
            PluginTarget::Sender => ComponentRef::Sender(&self.sender),
        }
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn queue(&self) -> &IngestionQueue<RawEvent> {
        &self.queue
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// Enrich and deliver one event; returns its terminal state.
    pub fn dispatch(&self, raw: RawEvent) -> DeliveryState {
        let mut state = DeliveryState::Created;
        state.advance_logged(DeliveryState::Enriching);

        match self.enricher.process(raw) {
            Some(message) => {
                state.advance_logged(DeliveryState::Enriched);
                self.sender.send(message).state
            }
            None => {
                state.advance_logged(DeliveryState::EnrichFailed);
                state
            }
        }
    }
}

type TransportPair = (Option<Box<dyn Transport>>, Option<Box<dyn Transport>>);

pub struct Client {
    scheduler: Arc<dyn Scheduler>,
    config: Arc<ConfigManager>,
    recorder: TelemetryRecorder,
    queue: IngestionQueue<RawEvent>,
    sources: Vec<(String, SourceFactory)>,
    plugins: Vec<Plugin>,
    transports: Option<TransportPair>,
    context: Option<Arc<PipelineContext>>,
}

impl Client {
    /// Fails only on an invalid config.
    pub fn new(config: AgentConfig, scheduler: Arc<dyn Scheduler>) -> Result<Self, AgentError> {
        let recorder = TelemetryRecorder::new();
        // Created up front so `report` can buffer before `init`; `init`
        // re-applies the resolved queue settings.
        let queue = IngestionQueue::new(&config.queue, Arc::clone(&scheduler), recorder.clone());
        let config = Arc::new(ConfigManager::new(config, Arc::clone(&scheduler))?);

        Ok(Self {
            scheduler,
            config,
            recorder,
            queue,
            sources: Vec::new(),
            plugins: Vec::new(),
            transports: None,
            context: None,
        })
    }

    /// Add a source factory. Its `SourceConfig` comes from
    /// `monitor.sources[name]` at `init`.
    pub fn register_source<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: FnOnce(&SourceConfig) -> Result<Box<dyn EventSource>, SourceError> + Send + 'static,
    {
        let name = name.into();
        if self.context.is_some() {
            warn!(target: "river::client", source = %name, "source registered after init ignored");
        } else {
            self.sources.push((name, Box::new(factory)));
        }
        self
    }

    /// Applied after the built-in plugins, in registration order.
    pub fn use_plugin(&mut self, plugin: Plugin) -> &mut Self {
        if self.context.is_some() {
            warn!(target: "river::client", plugin = plugin.name(), "plugin registered after init ignored");
        } else {
            self.plugins.push(plugin);
        }
        self
    }

    /// Replace the transports `init` would build from `sender.strategy`.
    pub fn set_transports(
        &mut self,
        primary: Option<Box<dyn Transport>>,
        fallback: Option<Box<dyn Transport>>,
    ) -> &mut Self {
        self.transports = Some((primary, fallback));
        self
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<Arc<PipelineContext>> {
        self.context.clone()
    }

    /// Build and wire the pipeline. Idempotent once it has succeeded; after a
    /// failure the registered sources are consumed and the client is unusable.
    pub fn init(&mut self) -> Result<(), AgentError> {
        if self.context.is_some() {
            return Ok(());
        }

        let (early, late): (Vec<Plugin>, Vec<Plugin>) = std::mem::take(&mut self.plugins)
            .into_iter()
            .partition(|p| p.target() == PluginTarget::ConfigManager);

        for plugin in &early {
            apply_plugin(plugin.name(), || plugin.apply(ComponentRef::ConfigManager(&self.config)))?;
        }

        let config = self.config.resolve()?;
        self.queue.configure(&config.queue);

        let entries = std::mem::take(&mut self.sources)
            .into_iter()
            .map(|(name, factory)| SourceEntry { config: config.monitor.source(&name), name, factory })
            .collect();

        let sender = match self.transports.take() {
            Some((primary, fallback)) => Sender::with_transports(
                config.sender.clone(),
                primary,
                fallback,
                Arc::clone(&self.scheduler),
                self.recorder.clone(),
            ),
            None => Sender::from_config(config.sender.clone(), Arc::clone(&self.scheduler), self.recorder.clone()),
        };

        let context = Arc::new(PipelineContext {
            config: Arc::clone(&self.config),
            aggregator: Aggregator::new(entries, Arc::clone(&self.scheduler)),
            queue: self.queue.clone(),
            enricher: Enricher::new(Arc::clone(&self.scheduler), self.recorder.clone()),
            sender,
        });

        let mut builtins: Vec<Box<dyn ApplyPlugin>> = vec![
            Box::new(LocaltimePlugin),
            Box::new(UserAgentPlugin::new(config.builder.device_info)),
            Box::new(IdPlugin::from_config(&config.builder)?),
        ];
        if config.debug {
            builtins.push(Box::new(LoggerPlugin));
        }

        for plugin in &builtins {
            apply_plugin(plugin.name(), || plugin.apply(context.component(plugin.target())))?;
        }
        for plugin in &late {
            apply_plugin(plugin.name(), || plugin.apply(context.component(plugin.target())))?;
        }

        wire(&context);

        info!(
            target: "river::client",
            sources = ?context.aggregator.active_sources(),
            plugins = builtins.len() + early.len() + late.len(),
            pending = self.queue.len(),
            "pipeline initialized"
        );
        self.context = Some(context);
        Ok(())
    }

    /// Start sources and draining. Idempotent, and valid again after `stop`.
    pub fn start(&self) -> Result<(), AgentError> {
        let context = self.context.as_ref().ok_or(AgentError::NotInitialized)?;
        // `Aggregator::stop` releases its sink; a restart needs it back.
        if !context.aggregator.is_started() {
            subscribe_queue(context);
        }
        context.aggregator.start();
        self.queue.start();
        Ok(())
    }

    /// Stop sources and draining; pending events are discarded.
    pub fn stop(&self) {
        if let Some(context) = &self.context {
            context.aggregator.stop();
        }
        self.queue.stop();
    }

    /// Manual reporting. Always accepted; delivered once started.
    pub fn report(&self, event: RawEvent) {
        self.queue.enqueue(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.recorder.snapshot(self.queue.len())
    }
}

fn apply_plugin(name: &str, apply: impl FnOnce() -> anyhow::Result<()>) -> Result<(), AgentError> {
    apply().map_err(|e| AgentError::Plugin { name: name.to_string(), reason: format!("{e:#}") })
}

/// aggregator -> queue
fn subscribe_queue(context: &PipelineContext) {
    let queue = context.queue.clone();
    let sink: EventSink = Arc::new(move |raw: RawEvent| queue.enqueue(raw));
    context.aggregator.subscribe(sink);
}

/// queue -> enricher -> sender. The aggregator side is attached by `start`.
fn wire(context: &Arc<PipelineContext>) {
    let weak: Weak<PipelineContext> = Arc::downgrade(context);
    context.queue.connect(Arc::new(move |raw: RawEvent| {
        let context = weak.upgrade().ok_or_else(|| anyhow!("pipeline context is gone"))?;
        context.dispatch(raw);
        Ok(())
    }));
}
