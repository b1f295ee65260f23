//! Batch dispatcher: partitions a URL list under the command-length ceiling
//! and runs one tool process per batch.
//!
//! Pipeline: options → fixed prefix → partition → invoke each batch
//! (sequentially, or up to `jobs` at once) → summary. A batch that exits
//! non-zero is recorded and the run goes on; a spawn failure aborts the run.
//! Failed batches are never retried here; the tool's own `--retries` covers
//! per-URL network retries.

mod error;
mod invoke;
mod parallel;
mod progress;
mod result;
mod run;
mod sink;

pub use error::DispatchError;
pub use progress::{ItemCounts, LineClass, OutputClassifier, RunProgress};
pub use result::{BatchRunSummary, InvocationResult};
pub use sink::{LogSink, MemorySink, OutputStream, SinkEvent, TracingSink};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::batch::{self, UrlBatch, DEFAULT_MAX_COMMAND_LEN};
use crate::control::RunControl;
use crate::options::DownloadOptions;

use invoke::InvokeContext;

/// Tunables of a run, usually taken from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Ceiling for the serialized command line of one invocation.
    pub max_command_len: usize,
    /// Maximum batches in flight; 1 runs them strictly in order.
    pub jobs: usize,
    /// Time between the terminate signal and the force-kill on cancel.
    pub kill_grace: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
            jobs: 1,
            kill_grace: Duration::from_millis(1500),
        }
    }
}

/// Invocations computed for a run, before anything is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub prefix: Vec<String>,
    pub batches: Vec<UrlBatch>,
    pub url_count: usize,
}

impl DispatchPlan {
    pub fn oversize(&self) -> impl Iterator<Item = &UrlBatch> {
        self.batches.iter().filter(|b| b.oversize)
    }
}

pub struct Dispatcher {
    program: PathBuf,
    settings: DispatchSettings,
    sink: Arc<dyn LogSink>,
    control: Arc<RunControl>,
}

impl Dispatcher {
    pub fn new(program: impl Into<PathBuf>, settings: DispatchSettings, sink: Arc<dyn LogSink>) -> Self {
        Self {
            program: program.into(),
            settings,
            sink,
            control: Arc::new(RunControl::new()),
        }
    }

    /// Shares an existing control (e.g. one wired to Ctrl-C or a control socket).
    pub fn with_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> Arc<RunControl> {
        Arc::clone(&self.control)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Validates the options and partitions `urls`. Touches nothing on disk.
    pub fn plan(&self, options: &DownloadOptions, urls: &[String]) -> Result<DispatchPlan, DispatchError> {
        options.validate()?;
        let prefix = options.prefix_args();
        let prefix_len = batch::command_len(&self.program, &prefix);
        let batches = batch::partition(urls, prefix_len, self.settings.max_command_len)?;
        Ok(DispatchPlan {
            prefix,
            batches,
            url_count: urls.len(),
        })
    }

    /// Plans and runs every batch, returning the combined outcome.
    pub async fn run(
        &self,
        options: &DownloadOptions,
        urls: &[String],
    ) -> Result<BatchRunSummary, DispatchError> {
        let plan = self.plan(options, urls)?;
        options.ensure_output_directory()?;
        self.run_plan(plan).await
    }

    /// Runs a plan produced by [`Dispatcher::plan`].
    pub async fn run_plan(&self, plan: DispatchPlan) -> Result<BatchRunSummary, DispatchError> {
        self.ensure_program()?;

        let total = plan.batches.len();
        tracing::info!(
            urls = plan.url_count,
            batches = total,
            jobs = self.settings.jobs,
            "queued {} URL(s) in {} batch(es)",
            plan.url_count,
            total
        );
        for b in plan.oversize() {
            let msg = format!(
                "URL is too long for one command line ({} > {} characters); dispatching it alone",
                b.command_len, self.settings.max_command_len
            );
            tracing::warn!(batch = b.index + 1, "{}", msg);
            self.sink.warning(Some(b.index), &msg);
        }

        let ctx = InvokeContext {
            program: Arc::from(self.program.as_path()),
            prefix: Arc::from(plan.prefix),
            sink: Arc::clone(&self.sink),
            control: Arc::clone(&self.control),
            kill_grace: self.settings.kill_grace,
        };

        let mut summary = BatchRunSummary {
            total_batches: total,
            progress: RunProgress::new(plan.url_count, total),
            ..Default::default()
        };

        if self.settings.jobs > 1 {
            parallel::run_parallel(&ctx, &plan.batches, self.settings.jobs, &mut summary).await?;
        } else {
            run::run_sequential(&ctx, &plan.batches, &mut summary).await?;
        }

        summary.cancelled = summary.results.len() < total || summary.results.iter().any(|r| r.terminated);
        if summary.cancelled {
            tracing::info!(
                ran = summary.results.len(),
                total,
                "run cancelled"
            );
        }
        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed_batches().count(),
            "run finished"
        );
        self.sink.summary(&summary);
        Ok(summary)
    }

    /// Fails fast when an explicit tool path does not exist.
    fn ensure_program(&self) -> Result<(), DispatchError> {
        let has_dir = self
            .program
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if has_dir && !self.program.is_file() {
            return Err(DispatchError::Spawn {
                program: self.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "executable not found"),
            });
        }
        Ok(())
    }
}
