//! Progress reporting for long-running pipeline stages
//!
//! The pipeline only knows about the `ProgressSink` capability; display
//! concerns live in whatever implements it.

use std::fmt;

/// Pipeline stage that is reporting progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Comment pages being fetched
    Fetch,
    /// Model batches being classified
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// Observer invoked after each page or batch completes
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, stage: Stage, done: usize, total: usize);
}

/// Discards all progress observations
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _stage: Stage, _done: usize, _total: usize) {}
}

/// Emits progress as `info` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, stage: Stage, done: usize, total: usize) {
        let pct = if total == 0 {
            100.0
        } else {
            (done as f64 / total as f64 * 100.0).min(100.0)
        };
        tracing::info!("[{}] {}/{} ({:.0}%)", stage, done, total, pct);
    }
}
