//! Batch-level bookkeeping of per-record outcomes.

use std::fmt;
use tracing::{info, warn};

/// What happened to a single record of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record was fully processed
    Success,
    /// The record was left out because an optional input was absent
    Skipped(String),
    /// Processing failed; the batch continued without the record
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Skipped(reason) => write!(f, "skipped ({reason})"),
            Outcome::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Outcomes of one pipeline stage, keyed by record (usually a structure id).
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Name of the stage, used in log lines
    pub stage: String,
    /// Outcomes in the order they were recorded
    pub entries: Vec<(String, Outcome)>,
}

impl BatchReport {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, key: impl Into<String>, outcome: Outcome) {
        self.entries.push((key.into(), outcome));
    }

    pub fn success(&mut self, key: impl Into<String>) {
        self.record(key, Outcome::Success);
    }

    pub fn skip(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.record(key, Outcome::Skipped(reason.into()));
    }

    pub fn fail(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.record(key, Outcome::Failed(reason.into()));
    }

    /// Append the entries of another report.
    pub fn merge(&mut self, other: BatchReport) {
        self.entries.extend(other.entries);
    }

    /// Counts of (success, skipped, failed).
    pub fn counts(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(s, k, f), (_, outcome)| match outcome {
                Outcome::Success => (s + 1, k, f),
                Outcome::Skipped(_) => (s, k + 1, f),
                Outcome::Failed(_) => (s, k, f + 1),
            })
    }

    /// Log every non-successful record and a one-line summary.
    pub fn log_summary(&self) {
        for (key, outcome) in &self.entries {
            if *outcome != Outcome::Success {
                warn!("[{}] {key}: {outcome}", self.stage);
            }
        }
        let (success, skipped, failed) = self.counts();
        info!(
            "[{}] {success} succeeded, {skipped} skipped, {failed} failed",
            self.stage
        );
    }
}
