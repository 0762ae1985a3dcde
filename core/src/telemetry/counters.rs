//! telemetry/counters.rs
//! Event counts collected while the pipeline runs.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounters {
    pub enqueued: u64,
    /// Items the consumer accepted; rejected ones count in `forward_failures`.
    pub forwarded: u64,
    pub forward_failures: u64,
    pub drain_cycles: u64,
    pub enriched: u64,
    pub enrich_failures: u64,
    pub delivered: u64,
    pub fallback_attempts: u64,
    pub delivery_failures: u64,
}

impl PipelineCounters {
    /// One drain cycle that took `processed` items off the buffer, `failed`
    /// of which the consumer rejected.
    pub fn add_cycle(&mut self, processed: u64, failed: u64) {
        self.drain_cycles += 1;
        self.forwarded += processed - failed;
        self.forward_failures += failed;
    }

    /// Messages that reached a terminal delivery state.
    pub fn settled(&self) -> u64 {
        self.delivered + self.delivery_failures
    }

    pub fn merge(&mut self, other: &PipelineCounters) {
        *self += other.clone();
    }
}

impl AddAssign for PipelineCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.enqueued          += rhs.enqueued;
        self.forwarded         += rhs.forwarded;
        self.forward_failures  += rhs.forward_failures;
        self.drain_cycles      += rhs.drain_cycles;

        self.enriched          += rhs.enriched;
        self.enrich_failures   += rhs.enrich_failures;

        self.delivered         += rhs.delivered;
        self.fallback_attempts += rhs.fallback_attempts;
        self.delivery_failures += rhs.delivery_failures;
    }
}
