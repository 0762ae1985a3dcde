//! telemetry/snapshot.rs
//! Point-in-time view of the pipeline counters and stage timings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::PipelineCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: PipelineCounters,
    /// Items still buffered in the ingestion queue when the snapshot was taken.
    pub pending: usize,
    /// delivered / settled, 0.0 if nothing settled yet.
    pub delivery_rate: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &PipelineCounters, timer: &TelemetryTimer, pending: usize) -> Self {
        let settled = counters.settled();
        let delivery_rate = if settled > 0 {
            counters.delivered as f64 / settled as f64
        } else {
            0.0
        };

        Self {
            counters: counters.clone(),
            pending,
            delivery_rate,
            elapsed: timer.elapsed(),
            stage_times: timer.stage_times().clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    /// Internal consistency:
    /// - every item taken off the queue was enqueued first
    /// - nothing settles that was not enriched (`dispatch` enriches without
    ///   the queue, so enrichment is not bounded by `forwarded`)
    /// - no single stage took longer than the wall time
    pub fn sanity_check(&self) -> bool {
        let c = &self.counters;
        c.forwarded + c.forward_failures <= c.enqueued
            && c.settled() <= c.enriched
            && self.stage_times.iter().all(|(_, d)| d <= self.elapsed)
    }
}
