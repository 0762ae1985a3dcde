//! scheduler/policy.rs
//! Drain-cycle budget: item count, wall-clock slice, host-reported time.

use std::time::Duration;

use crate::config::QueueConfig;
use crate::constants::MIN_IDLE_REMAINING;
use crate::scheduler::IdleDeadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    pub max_batch: usize,
    pub time_slice: Duration,
    pub min_remaining: Duration,
}

impl DrainPolicy {
    pub fn new(max_batch: usize, time_slice: Duration) -> Self {
        Self { max_batch, time_slice, min_remaining: MIN_IDLE_REMAINING }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.max_batch, Duration::from_millis(config.time_slice_ms))
    }

    /// Whether the host still grants us time. A forced (timed-out) slice
    /// always counts as granted.
    pub fn host_allows(&self, deadline: &dyn IdleDeadline) -> bool {
        deadline.did_timeout() || deadline.time_remaining() > self.min_remaining
    }

    /// Whichever bound is hit first ends the cycle.
    pub fn should_continue(&self, processed: usize, elapsed: Duration, deadline: &dyn IdleDeadline) -> bool {
        processed < self.max_batch && elapsed < self.time_slice && self.host_allows(deadline)
    }
}
