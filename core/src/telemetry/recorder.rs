//! telemetry/recorder.rs
//! Shared handle the pipeline stages record into.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::telemetry::{PipelineCounters, Stage, TelemetrySnapshot, TelemetryTimer};
use crate::utils::lock;

#[derive(Debug, Default)]
struct RecorderState {
    counters: PipelineCounters,
    timer: TelemetryTimer,
}

/// Cheap to clone; all clones record into the same counters.
#[derive(Clone, Debug, Default)]
pub struct TelemetryRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the live counters.
    pub fn count(&self, f: impl FnOnce(&mut PipelineCounters)) {
        f(&mut lock(&self.state).counters);
    }

    pub fn stage_time(&self, stage: Stage, dur: Duration) {
        lock(&self.state).timer.add_stage_time(stage, dur);
    }

    pub fn counters(&self) -> PipelineCounters {
        lock(&self.state).counters.clone()
    }

    pub fn snapshot(&self, pending: usize) -> TelemetrySnapshot {
        let state = lock(&self.state);
        TelemetrySnapshot::from(&state.counters, &state.timer, pending)
    }
}
