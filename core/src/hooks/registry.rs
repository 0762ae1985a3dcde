//! hooks/registry.rs
//! Hook registry: fixed names, ordered callbacks, per-callback isolation.
//!
//! - `Sync` callbacks run in registration order before `invoke` returns.
//!   A callback that returns `Err` or panics is logged, its partial changes to
//!   the argument are rolled back, and the next callback still runs.
//! - `Deferred` callbacks get an owned clone of the argument and are handed
//!   to the scheduler's `defer`; their outcome is only logged.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::hooks::{HookFn, HookMode, InvokeReport};
use crate::scheduler::Scheduler;
use crate::types::HookError;
use crate::utils::{lock, panic_message};

struct Callback<T> {
    mode: HookMode,
    f: HookFn<T>,
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self { mode: self.mode, f: Arc::clone(&self.f) }
    }
}

struct HookSlot<T> {
    name: &'static str,
    callbacks: Vec<Callback<T>>,
}

pub struct HookRegistry<T> {
    owner: &'static str,
    slots: Mutex<Vec<HookSlot<T>>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<T> HookRegistry<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(owner: &'static str, names: &[&'static str], scheduler: Arc<dyn Scheduler>) -> Self {
        let slots = names
            .iter()
            .map(|&name| HookSlot { name, callbacks: Vec::new() })
            .collect();

        Self { owner, slots: Mutex::new(slots), scheduler }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.slots).iter().map(|slot| slot.name).collect()
    }

    /// Number of callbacks registered on `name` (0 for unknown names).
    pub fn registered(&self, name: &str) -> usize {
        lock(&self.slots)
            .iter()
            .find(|slot| slot.name == name)
            .map_or(0, |slot| slot.callbacks.len())
    }

    pub fn register<F>(&self, name: &str, mode: HookMode, f: F) -> Result<(), HookError>
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut slots = lock(&self.slots);
        let known = slots.iter().map(|slot| slot.name).collect::<Vec<_>>().join(", ");

        let slot = slots
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| HookError::UnknownHook {
                owner: self.owner,
                name: name.to_string(),
                known,
            })?;

        slot.callbacks.push(Callback { mode, f: Arc::new(f) });
        debug!(target: "river::hooks", owner = self.owner, hook = name, %mode, "callback registered");
        Ok(())
    }

    pub fn tap_sync<F>(&self, name: &str, f: F) -> Result<(), HookError>
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(name, HookMode::Sync, f)
    }

    pub fn tap_deferred<F>(&self, name: &str, f: F) -> Result<(), HookError>
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(name, HookMode::Deferred, f)
    }

    /// Fire `name`. Never fails; see [`InvokeReport`].
    pub fn invoke(&self, name: &str, arg: &mut T) -> InvokeReport {
        // Snapshot so callbacks may register further hooks without deadlocking.
        let callbacks = {
            let slots = lock(&self.slots);
            match slots.iter().find(|slot| slot.name == name) {
                Some(slot) => slot.callbacks.clone(),
                None => {
                    warn!(target: "river::hooks", owner = self.owner, hook = name, "invoke on undeclared hook ignored");
                    return InvokeReport::default();
                }
            }
        };

        let mut report = InvokeReport::default();

        for (index, callback) in callbacks.into_iter().enumerate() {
            match callback.mode {
                HookMode::Sync => {
                    report.ran += 1;
                    let before = arg.clone();
                    let outcome = catch_unwind(AssertUnwindSafe(|| (callback.f)(arg)));

                    let reason = match outcome {
                        Ok(Ok(())) => continue,
                        Ok(Err(e)) => format!("{e:#}"),
                        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
                    };

                    *arg = before;
                    report.failed += 1;
                    warn!(target: "river::hooks", owner = self.owner, hook = name, index, %reason, "hook callback failed; changes rolled back");
                }
                HookMode::Deferred => {
                    report.deferred += 1;
                    let mut owned = arg.clone();
                    let owner = self.owner;
                    let hook = name.to_string();

                    self.scheduler.defer(Box::new(move || {
                        let outcome = catch_unwind(AssertUnwindSafe(|| (callback.f)(&mut owned)));
                        match outcome {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                warn!(target: "river::hooks", owner, hook = %hook, index, reason = %format!("{e:#}"), "deferred hook failed")
                            }
                            Err(panic) => {
                                warn!(target: "river::hooks", owner, hook = %hook, index, reason = %panic_message(panic.as_ref()), "deferred hook panicked")
                            }
                        }
                    }));
                }
            }
        }

        report
    }
}
