//! config/manager.rs
//! Owns the agent config and the one-shot ready transition.
//!
//! Lifecycle:
//! 1. `new` validates the integrator's config.
//! 2. `resolve` runs `init` then `beforeReady` on a working copy (plugins may
//!    adjust it), validates again, stores it, flips to ready, fires `ready`
//!    and releases every queued `on_ready` callback.
//! 3. Later `resolve` calls return the stored config unchanged.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::{AgentConfig, BuilderConfig, MonitorConfig, QueueConfig, SenderConfig};
use crate::constants::hook_names::config as hooks;
use crate::hooks::HookRegistry;
use crate::scheduler::Scheduler;
use crate::types::ConfigError;
use crate::utils::{lock, panic_message};

type ReadyCallback = Box<dyn FnOnce(&AgentConfig) + Send>;

#[derive(Default)]
struct ReadyState {
    ready: bool,
    pending: Vec<ReadyCallback>,
}

pub struct ConfigManager {
    config: Mutex<AgentConfig>,
    state: Mutex<ReadyState>,
    hooks: HookRegistry<AgentConfig>,
}

impl ConfigManager {
    pub fn new(config: AgentConfig, scheduler: Arc<dyn Scheduler>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Mutex::new(config),
            state: Mutex::new(ReadyState::default()),
            hooks: HookRegistry::new("configManager", hooks::ALL, scheduler),
        })
    }

    pub fn hooks(&self) -> &HookRegistry<AgentConfig> {
        &self.hooks
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.state).ready
    }

    pub fn resolve(&self) -> Result<AgentConfig, ConfigError> {
        if self.is_ready() {
            return Ok(self.config());
        }

        let mut working = self.config();
        self.hooks.invoke(hooks::INIT, &mut working);
        self.hooks.invoke(hooks::BEFORE_READY, &mut working);
        working.validate()?;

        *lock(&self.config) = working.clone();

        let pending = {
            let mut state = lock(&self.state);
            state.ready = true;
            std::mem::take(&mut state.pending)
        };
        info!(target: "river::config", url = %working.sender.url, "config ready");

        // `ready` observes; changes made there are not kept.
        self.hooks.invoke(hooks::READY, &mut working.clone());

        for callback in pending {
            run_ready_callback(callback, &working);
        }

        Ok(working)
    }

    /// Run `callback` with the resolved config: now if ready, otherwise when
    /// `resolve` completes.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce(&AgentConfig) + Send + 'static,
    {
        {
            let mut state = lock(&self.state);
            if !state.ready {
                state.pending.push(Box::new(callback));
                debug!(target: "river::config", queued = state.pending.len(), "on_ready queued");
                return;
            }
        }
        run_ready_callback(Box::new(callback), &self.config());
    }

    pub fn config(&self) -> AgentConfig {
        lock(&self.config).clone()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        lock(&self.config).monitor.clone()
    }

    pub fn builder_config(&self) -> BuilderConfig {
        lock(&self.config).builder.clone()
    }

    pub fn sender_config(&self) -> SenderConfig {
        lock(&self.config).sender.clone()
    }

    pub fn queue_config(&self) -> QueueConfig {
        lock(&self.config).queue.clone()
    }
}

fn run_ready_callback(callback: ReadyCallback, config: &AgentConfig) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(config))) {
        warn!(target: "river::config", reason = %panic_message(panic.as_ref()), "on_ready callback panicked");
    }
}
