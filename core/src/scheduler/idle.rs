//! scheduler/idle.rs
//! Scheduler trait and the deadlines handed to idle tasks.

use std::time::{Duration, Instant};

/// What an idle task can ask about its slice.
pub trait IdleDeadline {
    /// Time left before control must go back to the host.
    fn time_remaining(&self) -> Duration;
    /// True when the slice was granted because the request's timeout expired.
    fn did_timeout(&self) -> bool;
}

pub type IdleTask = Box<dyn FnOnce(&dyn IdleDeadline) + Send>;
pub type DeferredTask = Box<dyn FnOnce() + Send>;

/// Host scheduling primitive.
pub trait Scheduler: Send + Sync {
    /// Run `task` at the next idle opportunity, or after `timeout` at the latest.
    fn request_idle(&self, timeout: Duration, task: IdleTask);

    /// Run `task` after the current execution turn.
    fn defer(&self, task: DeferredTask);
}

/// Wall-clock deadline: `period` from the moment it is created.
#[derive(Debug, Clone, Copy)]
pub struct SliceDeadline {
    end: Instant,
    timed_out: bool,
}

impl SliceDeadline {
    pub fn new(period: Duration, timed_out: bool) -> Self {
        Self {
            end: Instant::now() + period,
            timed_out,
        }
    }
}

impl IdleDeadline for SliceDeadline {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }

    fn did_timeout(&self) -> bool {
        self.timed_out
    }
}

/// Deadline that never moves. Handy for simulating a host in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeadline {
    pub remaining: Duration,
    pub timed_out: bool,
}

impl FixedDeadline {
    pub fn generous() -> Self {
        Self { remaining: Duration::from_secs(60), timed_out: false }
    }

    pub fn exhausted() -> Self {
        Self { remaining: Duration::ZERO, timed_out: false }
    }

    pub fn forced() -> Self {
        Self { remaining: Duration::ZERO, timed_out: true }
    }
}

impl IdleDeadline for FixedDeadline {
    fn time_remaining(&self) -> Duration {
        self.remaining
    }

    fn did_timeout(&self) -> bool {
        self.timed_out
    }
}
