//! scheduler/manual.rs
//! Host-driven scheduler.
//!
//! Nothing runs until the host calls one of the `run_*` methods, so the host's
//! own event loop decides when the agent gets time. Tasks scheduled while a
//! task is running are queued, never run reentrantly.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::Duration;

use tracing::error;

use crate::constants::IDLE_PERIOD;
use crate::scheduler::{DeferredTask, FixedDeadline, IdleDeadline, IdleTask, Scheduler, SliceDeadline};
use crate::utils::{lock, panic_message};

struct PendingIdle {
    timeout: Duration,
    task: IdleTask,
}

#[derive(Default)]
struct ManualState {
    idle: VecDeque<PendingIdle>,
    deferred: VecDeque<DeferredTask>,
    idle_requests: u64,
}

pub struct ManualScheduler {
    state: Mutex<ManualState>,
    period: Duration,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::with_period(IDLE_PERIOD)
    }

    /// Each idle slice lasts `period` of wall-clock time.
    pub fn with_period(period: Duration) -> Self {
        Self { state: Mutex::new(ManualState::default()), period }
    }

    pub fn pending_idle(&self) -> usize {
        lock(&self.state).idle.len()
    }

    pub fn pending_deferred(&self) -> usize {
        lock(&self.state).deferred.len()
    }

    /// Total `request_idle` calls seen so far.
    pub fn idle_requests(&self) -> u64 {
        lock(&self.state).idle_requests
    }

    /// Timeout attached to the oldest pending idle request.
    pub fn next_idle_timeout(&self) -> Option<Duration> {
        lock(&self.state).idle.front().map(|p| p.timeout)
    }

    /// Run deferred tasks until none are left (including ones queued meanwhile).
    pub fn run_deferred(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = lock(&self.state).deferred.pop_front();
            let Some(task) = next else { break };
            guarded("deferred", || task());
            ran += 1;
        }
        ran
    }

    /// Run the oldest idle task with a fresh wall-clock slice.
    pub fn run_next_idle(&self) -> bool {
        let deadline = SliceDeadline::new(self.period, false);
        self.run_next_idle_with(&deadline)
    }

    /// Run the oldest idle task as if its timeout had expired.
    pub fn expire_next_idle(&self) -> bool {
        self.run_next_idle_with(&FixedDeadline::forced())
    }

    /// Run the oldest idle task against a caller-supplied deadline.
    pub fn run_next_idle_with(&self, deadline: &dyn IdleDeadline) -> bool {
        let next = lock(&self.state).idle.pop_front();
        match next {
            Some(pending) => {
                guarded("idle", || (pending.task)(deadline));
                true
            }
            None => false,
        }
    }

    /// Alternate deferred and idle work until both queues are empty.
    /// Returns the number of idle tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut cycles = 0;
        loop {
            self.run_deferred();
            if !self.run_next_idle() {
                break;
            }
            cycles += 1;
        }
        self.run_deferred();
        cycles
    }
}

impl Scheduler for ManualScheduler {
    fn request_idle(&self, timeout: Duration, task: IdleTask) {
        let mut state = lock(&self.state);
        state.idle_requests += 1;
        state.idle.push_back(PendingIdle { timeout, task });
    }

    fn defer(&self, task: DeferredTask) {
        lock(&self.state).deferred.push_back(task);
    }
}

fn guarded<F: FnOnce()>(kind: &'static str, f: F) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        error!(target: "river::scheduler", kind, reason = %panic_message(panic.as_ref()), "scheduled task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn tasks_wait_for_host() {
        let sched = ManualScheduler::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let h = hits.clone();
        sched.request_idle(Duration::from_millis(10), Box::new(move |_| lock(&h).push("idle")));
        let h = hits.clone();
        sched.defer(Box::new(move || lock(&h).push("deferred")));

        assert!(lock(&hits).is_empty());
        assert_eq!(sched.run_until_idle(), 1);
        assert_eq!(*lock(&hits), vec!["deferred", "idle"]);
    }

    #[test]
    fn panicking_task_does_not_escape() {
        let sched = ManualScheduler::new();
        sched.defer(Box::new(|| panic!("boom")));
        assert_eq!(sched.run_deferred(), 1);
    }
}
