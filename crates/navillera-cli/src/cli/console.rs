//! Terminal log sink: batch-tagged tool output on stdout/stderr and a short
//! line per finished batch. Every event is also mirrored to the log file.

use navillera_core::batch::UrlBatch;
use navillera_core::dispatch::{
    BatchRunSummary, InvocationResult, LogSink, OutputStream, RunProgress, TracingSink,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes each event with one locked write so concurrent batches never
/// interleave inside a line.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    total_batches: AtomicUsize,
    log: TracingSink,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn tag(&self, batch_index: usize) -> String {
        match self.total_batches.load(Ordering::Relaxed) {
            0 => format!("[batch {}]", batch_index + 1),
            total => format!("[batch {}/{}]", batch_index + 1, total),
        }
    }

    fn out(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", text);
    }

    fn err(&self, text: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", text);
    }
}

impl LogSink for ConsoleSink {
    fn batch_started(&self, batch: &UrlBatch, total_batches: usize) {
        self.log.batch_started(batch, total_batches);
        self.total_batches.store(total_batches, Ordering::Relaxed);
        let plural = if batch.len() == 1 { "" } else { "s" };
        self.out(&format!(
            "{} starting ({} URL{})",
            self.tag(batch.index),
            batch.len(),
            plural
        ));
    }

    fn line(&self, batch_index: usize, stream: OutputStream, line: &str) {
        self.log.line(batch_index, stream, line);
        let text = format!("{} {}", self.tag(batch_index), line);
        match stream {
            OutputStream::Stdout => self.out(&text),
            OutputStream::Stderr => self.err(&text),
        }
    }

    fn warning(&self, batch_index: Option<usize>, message: &str) {
        self.log.warning(batch_index, message);
        match batch_index {
            Some(i) => self.err(&format!("{} warning: {}", self.tag(i), message)),
            None => self.err(&format!("warning: {}", message)),
        }
    }

    fn batch_finished(&self, result: &InvocationResult, progress: &RunProgress) {
        self.log.batch_finished(result, progress);
        self.out(&format!(
            "{} {}  {}",
            self.tag(result.batch_index),
            describe_exit(result),
            format_progress(progress)
        ));
    }

    fn summary(&self, summary: &BatchRunSummary) {
        self.log.summary(summary);
        self.out(&format_summary(summary));
    }
}

fn describe_exit(result: &InvocationResult) -> String {
    if result.terminated {
        return "terminated".to_string();
    }
    match result.exit_code {
        Some(0) => format!("done in {:.1}s", result.elapsed.as_secs_f64()),
        Some(code) => format!("failed (exit {})", code),
        None => "killed by signal".to_string(),
    }
}

/// `3/10 URLs (30%) | 12 downloaded, 4 skipped, 1 failed`
pub fn format_progress(p: &RunProgress) -> String {
    format!(
        "{}/{} URLs ({:.0}%) | {} downloaded, {} skipped, {} failed",
        p.urls_done,
        p.urls_total,
        p.fraction() * 100.0,
        p.items.downloaded,
        p.items.skipped,
        p.items.failed
    )
}

pub fn format_summary(summary: &BatchRunSummary) -> String {
    let failed = summary.failed_batches().count();
    let headline = if summary.cancelled {
        format!(
            "Cancelled after {} of {} batch(es).",
            summary.results.len(),
            summary.total_batches
        )
    } else if failed > 0 {
        format!(
            "Finished with {} failed batch(es) of {}.",
            failed, summary.total_batches
        )
    } else {
        format!("All {} batch(es) finished.", summary.total_batches)
    };
    format!("{} {}", headline, format_progress(&summary.progress))
}
