//! source/shift.rs
//! Layout-shift accumulation for the `cls` paint metric.
//!
//! Shifts are grouped into session windows: a window closes when the next
//! shift comes 1s or more after the previous one, or 5s or more after the
//! window opened.
//!
//! - `Cumulative`: every shift reports the running page total.
//! - `Windowed`: each closed window reports its own sum once, then resets.

use std::mem;

use crate::config::{ReportingPolicy, SourceConfig};
use crate::event::{LayoutShift, Paint, PaintMetric};

const WINDOW_GAP_MS: f64 = 1_000.0;
const WINDOW_SPAN_MS: f64 = 5_000.0;

#[derive(Debug, Clone, Default)]
pub struct ShiftAccumulator {
    policy: ReportingPolicy,
    total: f64,
    window: Vec<LayoutShift>,
}

impl ShiftAccumulator {
    pub fn new(policy: ReportingPolicy) -> Self {
        Self { policy, total: 0.0, window: Vec::new() }
    }

    /// Policy taken from the source's config (`monitor.reporting` unless overridden).
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.reporting())
    }

    pub fn policy(&self) -> ReportingPolicy {
        self.policy
    }

    /// Page total so far, under either policy.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn record(&mut self, shift: LayoutShift) -> Option<Paint> {
        self.total += shift.value;

        match self.policy {
            ReportingPolicy::Cumulative => Some(cls(self.total, vec![shift])),
            ReportingPolicy::Windowed => {
                let closes = match (self.window.first(), self.window.last()) {
                    (Some(first), Some(last)) => {
                        shift.timestamp - last.timestamp >= WINDOW_GAP_MS
                            || shift.timestamp - first.timestamp >= WINDOW_SPAN_MS
                    }
                    _ => false,
                };

                let closed = if closes { self.take_window() } else { None };
                self.window.push(shift);
                closed
            }
        }
    }

    /// Report the open window, if any (page hide / shutdown).
    pub fn flush(&mut self) -> Option<Paint> {
        match self.policy {
            ReportingPolicy::Cumulative => None,
            ReportingPolicy::Windowed => self.take_window(),
        }
    }

    fn take_window(&mut self) -> Option<Paint> {
        if self.window.is_empty() {
            return None;
        }
        let shifts = mem::take(&mut self.window);
        let value = shifts.iter().map(|s| s.value).sum();
        Some(cls(value, shifts))
    }
}

fn cls(value: f64, shifts: Vec<LayoutShift>) -> Paint {
    Paint {
        extra_desc: PaintMetric::Cls,
        value,
        element: None,
        size: None,
        url: None,
        individual_shifts: Some(shifts),
    }
}
