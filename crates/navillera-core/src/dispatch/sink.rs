//! Log sink port: where batch-tagged tool output and run events go.
//!
//! Implementations must be thread-safe. Output readers for stdout and stderr
//! (and, in concurrent mode, several batches) call into the sink at the same
//! time; each call carries one complete line and must be written atomically.

use std::sync::Mutex;

use super::progress::RunProgress;
use super::result::{BatchRunSummary, InvocationResult};
use crate::batch::UrlBatch;

/// Which pipe of the tool a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

pub trait LogSink: Send + Sync {
    /// A batch is about to be spawned.
    fn batch_started(&self, _batch: &UrlBatch, _total_batches: usize) {}

    /// One line of tool output (without the trailing newline).
    fn line(&self, batch_index: usize, stream: OutputStream, line: &str);

    /// Non-fatal problem, optionally attributed to a batch.
    fn warning(&self, batch_index: Option<usize>, message: &str);

    /// A batch process exited (or was terminated).
    fn batch_finished(&self, _result: &InvocationResult, _progress: &RunProgress) {}

    /// The run is over; called exactly once per successful dispatch.
    fn summary(&self, _summary: &BatchRunSummary) {}
}

/// Sink that forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn batch_started(&self, batch: &UrlBatch, total_batches: usize) {
        tracing::info!(
            batch = batch.index + 1,
            total = total_batches,
            urls = batch.len(),
            "batch started"
        );
    }

    fn line(&self, batch_index: usize, stream: OutputStream, line: &str) {
        tracing::info!(batch = batch_index + 1, stream = stream.as_str(), "{}", line);
    }

    fn warning(&self, batch_index: Option<usize>, message: &str) {
        match batch_index {
            Some(i) => tracing::warn!(batch = i + 1, "{}", message),
            None => tracing::warn!("{}", message),
        }
    }

    fn batch_finished(&self, result: &InvocationResult, _progress: &RunProgress) {
        tracing::info!(
            batch = result.batch_index + 1,
            exit_code = ?result.exit_code,
            succeeded = result.succeeded,
            "batch finished"
        );
    }
}

/// Event recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Started { batch_index: usize, urls: usize },
    Line { batch_index: usize, stream: OutputStream, line: String },
    Warning { batch_index: Option<usize>, message: String },
    Finished { batch_index: usize, succeeded: bool },
    Summary { results: usize, succeeded: bool, cancelled: bool },
}

/// Sink that keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// Output lines of one batch, in the order they were received.
    pub fn lines_for(&self, batch_index: usize) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Line {
                    batch_index: i,
                    line,
                    ..
                } if *i == batch_index => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<SinkEvent> {
        self.lock()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Warning { .. }))
            .cloned()
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemorySink {
    fn batch_started(&self, batch: &UrlBatch, _total_batches: usize) {
        self.push(SinkEvent::Started {
            batch_index: batch.index,
            urls: batch.len(),
        });
    }

    fn line(&self, batch_index: usize, stream: OutputStream, line: &str) {
        self.push(SinkEvent::Line {
            batch_index,
            stream,
            line: line.to_string(),
        });
    }

    fn warning(&self, batch_index: Option<usize>, message: &str) {
        self.push(SinkEvent::Warning {
            batch_index,
            message: message.to_string(),
        });
    }

    fn batch_finished(&self, result: &InvocationResult, _progress: &RunProgress) {
        self.push(SinkEvent::Finished {
            batch_index: result.batch_index,
            succeeded: result.succeeded,
        });
    }

    fn summary(&self, summary: &BatchRunSummary) {
        self.push(SinkEvent::Summary {
            results: summary.results.len(),
            succeeded: summary.succeeded(),
            cancelled: summary.cancelled,
        });
    }
}
