//! telemetry/timers.rs
//! Wall time spent in each pipeline stage.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// A whole drain cycle, including the enrich and send work it triggers.
    Drain,
    Enrich,
    Send,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimes(HashMap<Stage, Duration>);

impl StageTimes {
    pub fn get(&self, stage: Stage) -> Duration {
        self.0.get(&stage).copied().unwrap_or_default()
    }

    pub fn get_ms(&self, stage: Stage) -> f64 {
        self.get(stage).as_secs_f64() * 1_000.0
    }

    pub fn total(&self) -> Duration {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, Duration)> + '_ {
        self.0.iter().map(|(stage, d)| (*stage, *d))
    }
}

/// Started with the recorder; stage times only ever grow.
#[derive(Clone, Debug)]
pub struct TelemetryTimer {
    started: Instant,
    stage_times: StageTimes,
}

impl TelemetryTimer {
    pub fn new() -> Self {
        Self { started: Instant::now(), stage_times: StageTimes::default() }
    }

    pub fn add_stage_time(&mut self, stage: Stage, dur: Duration) {
        *self.stage_times.0.entry(stage).or_default() += dur;
    }

    pub fn stage_times(&self) -> &StageTimes {
        &self.stage_times
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for TelemetryTimer {
    fn default() -> Self {
        Self::new()
    }
}
