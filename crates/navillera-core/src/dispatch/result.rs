//! Per-invocation results and the aggregated run summary.

use std::time::Duration;

use super::progress::{ItemCounts, RunProgress};

/// Outcome of one tool process.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub batch_index: usize,
    /// URLs passed to this invocation, so failures can be traced back.
    pub urls: Vec<String>,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    /// Exit code was 0 and the process was not terminated by a cancel.
    pub succeeded: bool,
    /// The process was terminated because the run was cancelled.
    pub terminated: bool,
    /// Items classified from the output while the batch ran.
    pub counts: ItemCounts,
    pub elapsed: Duration,
}

/// Results of a run, in the order invocations completed.
#[derive(Debug, Clone, Default)]
pub struct BatchRunSummary {
    pub results: Vec<InvocationResult>,
    /// Number of batches the URL list was partitioned into.
    pub total_batches: usize,
    /// Cancellation was requested before every batch had run.
    pub cancelled: bool,
    pub progress: RunProgress,
}

impl BatchRunSummary {
    /// Aggregate success: the run completed and every invocation succeeded.
    pub fn succeeded(&self) -> bool {
        self.completed() && self.results.iter().all(|r| r.succeeded)
    }

    /// Every batch ran to completion and none was cancelled.
    pub fn completed(&self) -> bool {
        !self.cancelled && self.results.len() == self.total_batches
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &InvocationResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    /// URLs of every failed batch, in result order.
    pub fn failed_urls(&self) -> Vec<&str> {
        self.failed_batches()
            .flat_map(|r| r.urls.iter().map(String::as_str))
            .collect()
    }
}
