//! queue/ingestion.rs
//! FIFO buffer + idle-scheduled drain cycle.
//!
//! Invariants:
//! - `scheduled` is true from the moment a cycle is requested until a cycle
//!   finds the buffer empty; it is only read and written under the same lock
//!   as the buffer, so an `enqueue` racing the end of a cycle either lands
//!   before the emptiness check (and is drained) or sees `scheduled == false`
//!   (and requests a new cycle).
//! - `generation` changes on `stop`; a cycle requested under an older
//!   generation does nothing.
//! - The lock is never held while forwarding, so the consumer may enqueue.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::config::QueueConfig;
use crate::queue::QueueStats;
use crate::scheduler::{DrainPolicy, IdleDeadline, Scheduler};
use crate::telemetry::{Stage, TelemetryRecorder};
use crate::utils::{lock, panic_message};

/// Downstream consumer. `Err` and panics are both contained per item.
pub type Forward<T> = Arc<dyn Fn(T) -> anyhow::Result<()> + Send + Sync>;

struct QueueState<T> {
    buffer: VecDeque<T>,
    scheduled: bool,
    started: bool,
    generation: u64,
}

#[derive(Default)]
struct CycleStats {
    cycles: u64,
    forwarded: u64,
    forward_failures: u64,
    in_flight: u32,
    max_in_flight: u32,
}

#[derive(Clone, Copy)]
struct Tuning {
    policy: DrainPolicy,
    timeout: Duration,
}

impl Tuning {
    fn from_config(config: &QueueConfig) -> Self {
        Self { policy: DrainPolicy::from_config(config), timeout: Duration::from_millis(config.timeout_ms) }
    }
}

struct Inner<T> {
    state: Mutex<QueueState<T>>,
    forward: Mutex<Option<Forward<T>>>,
    stats: Mutex<CycleStats>,
    tuning: Mutex<Tuning>,
    scheduler: Arc<dyn Scheduler>,
    recorder: TelemetryRecorder,
}

pub struct IngestionQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for IngestionQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Send + 'static> IngestionQueue<T> {
    pub fn new(config: &QueueConfig, scheduler: Arc<dyn Scheduler>, recorder: TelemetryRecorder) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    buffer: VecDeque::new(),
                    scheduled: false,
                    started: false,
                    generation: 0,
                }),
                forward: Mutex::new(None),
                stats: Mutex::new(CycleStats::default()),
                tuning: Mutex::new(Tuning::from_config(config)),
                scheduler,
                recorder,
            }),
        }
    }

    /// Install the consumer. Replaces any previous one.
    pub fn connect(&self, forward: Forward<T>) {
        *lock(&self.inner.forward) = Some(forward);
    }

    pub fn enqueue(&self, item: T) {
        let schedule = {
            let mut state = lock(&self.inner.state);
            state.buffer.push_back(item);
            if state.started && !state.scheduled {
                state.scheduled = true;
                Some(state.generation)
            } else {
                None
            }
        };

        self.inner.recorder.count(|c| c.enqueued += 1);
        if let Some(generation) = schedule {
            Inner::request_cycle(&self.inner, generation);
        }
    }

    /// Begin draining. Idempotent.
    pub fn start(&self) {
        let schedule = {
            let mut state = lock(&self.inner.state);
            if state.started {
                return;
            }
            state.started = true;
            if !state.buffer.is_empty() && !state.scheduled {
                state.scheduled = true;
                Some(state.generation)
            } else {
                None
            }
        };

        if lock(&self.inner.forward).is_none() {
            warn!(target: "river::queue", "queue started without a consumer");
        }
        debug!(target: "river::queue", pending = self.len(), "queue started");

        if let Some(generation) = schedule {
            Inner::request_cycle(&self.inner, generation);
        }
    }

    /// Stop draining and discard pending items. A cycle that is mid-item
    /// finishes that item and then finds nothing left.
    pub fn stop(&self) {
        let dropped = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            state.scheduled = false;
            state.started = false;
            let dropped = state.buffer.len();
            state.buffer.clear();
            dropped
        };

        info!(target: "river::queue", dropped, "queue stopped");
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_started(&self) -> bool {
        lock(&self.inner.state).started
    }

    /// A drain cycle is requested or running.
    pub fn is_scheduled(&self) -> bool {
        lock(&self.inner.state).scheduled
    }

    pub fn policy(&self) -> DrainPolicy {
        lock(&self.inner.tuning).policy
    }

    /// Replace the drain budget and idle timeout. Takes effect from the next
    /// cycle; one already requested keeps its timeout.
    pub fn configure(&self, config: &QueueConfig) {
        let tuning = Tuning::from_config(config);
        *lock(&self.inner.tuning) = tuning;
        debug!(target: "river::queue", max_batch = tuning.policy.max_batch, timeout = ?tuning.timeout, "queue reconfigured");
    }

    pub fn stats(&self) -> QueueStats {
        let pending = self.len();
        let stats = lock(&self.inner.stats);
        QueueStats {
            pending,
            cycles: stats.cycles,
            forwarded: stats.forwarded,
            forward_failures: stats.forward_failures,
            max_in_flight: stats.max_in_flight,
        }
    }
}

impl<T: Send + 'static> Inner<T> {
    fn request_cycle(this: &Arc<Self>, generation: u64) {
        // Weak: a pending idle task must not keep a dropped queue alive.
        let weak: Weak<Self> = Arc::downgrade(this);
        let timeout = lock(&this.tuning).timeout;
        this.scheduler.request_idle(
            timeout,
            Box::new(move |deadline: &dyn IdleDeadline| {
                if let Some(inner) = weak.upgrade() {
                    Inner::drain(&inner, generation, deadline);
                }
            }),
        );
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.state).generation == generation
    }

    fn drain(this: &Arc<Self>, generation: u64, deadline: &dyn IdleDeadline) {
        if !this.is_current(generation) {
            trace!(target: "river::queue", generation, "stale drain cycle skipped");
            return;
        }

        let Some(forward) = lock(&this.forward).clone() else {
            lock(&this.state).scheduled = false;
            warn!(target: "river::queue", "no consumer connected; items stay buffered");
            return;
        };

        {
            let mut stats = lock(&this.stats);
            stats.in_flight += 1;
            stats.max_in_flight = stats.max_in_flight.max(stats.in_flight);
        }

        let policy = lock(&this.tuning).policy;
        let started = Instant::now();
        let mut processed = 0usize;
        let mut failed = 0u64;

        while policy.should_continue(processed, started.elapsed(), deadline) {
            let next = {
                let mut state = lock(&this.state);
                if state.generation != generation {
                    break;
                }
                state.buffer.pop_front()
            };
            let Some(item) = next else { break };
            processed += 1;

            let outcome = catch_unwind(AssertUnwindSafe(|| forward(item)));
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
            };
            failed += 1;
            warn!(target: "river::queue", %reason, "forwarding failed; item dropped");
        }

        let elapsed = started.elapsed();
        let reschedule = {
            let mut state = lock(&this.state);
            if state.generation != generation {
                false
            } else if state.buffer.is_empty() {
                state.scheduled = false;
                false
            } else {
                true
            }
        };

        {
            let mut stats = lock(&this.stats);
            stats.in_flight -= 1;
            stats.cycles += 1;
            stats.forwarded += processed as u64 - failed;
            stats.forward_failures += failed;
        }
        this.recorder.count(|c| c.add_cycle(processed as u64, failed));
        this.recorder.stage_time(Stage::Drain, elapsed);

        debug!(target: "river::queue", processed, failed, ?elapsed, reschedule, "drain cycle done");

        if reschedule {
            Inner::request_cycle(this, generation);
        }
    }
}
