//! Integration test: the dispatcher against a fake tool script.
//!
//! Covers streaming and attribution of output, failed batches, cancellation,
//! oversize URLs, spawn failures and concurrent batches.
#![cfg(unix)]

mod common;

use navillera_core::batch::{self, UrlBatch};
use navillera_core::control::RunControl;
use navillera_core::dispatch::{
    BatchRunSummary, DispatchError, DispatchSettings, Dispatcher, InvocationResult, LogSink,
    MemorySink, OutputStream, RunProgress, SinkEvent,
};
use navillera_core::options::DownloadOptions;
use navillera_core::tool;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn urls(v: &[&str]) -> Vec<String> {
    v.iter().map(|u| u.to_string()).collect()
}

/// Ceiling that fits exactly one URL of length `url_len` per invocation.
fn one_url_per_batch(program: &Path, options: &DownloadOptions, url_len: usize) -> usize {
    batch::command_len(program, &options.prefix_args()) + 1 + url_len
}

fn settings(max_command_len: usize, jobs: usize) -> DispatchSettings {
    DispatchSettings {
        max_command_len,
        jobs,
        kill_grace: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn single_batch_streams_output_to_sink() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path().join("downloads"));
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(tool, DispatchSettings::default(), sink.clone());

    let list = urls(&[
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/a",
    ]);
    let summary = dispatcher.run(&options, &list).await.unwrap();

    assert!(out.path().join("downloads").is_dir());
    assert_eq!(summary.total_batches, 1);
    assert!(summary.succeeded());
    assert!(summary.completed());
    let result = &summary.results[0];
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.urls, list);
    assert_eq!(
        result.stdout_lines,
        vec![
            "fetched https://example.com/a",
            "fetched https://example.com/b",
            "fetched https://example.com/a"
        ]
    );
    assert_eq!(result.stderr_lines.len(), 3);
    assert_eq!(summary.progress.urls_done, 3);

    let events = sink.events();
    assert!(matches!(events.first(), Some(SinkEvent::Started { batch_index: 0, urls: 3 })));
    assert!(matches!(
        events.last(),
        Some(SinkEvent::Summary { results: 1, succeeded: true, cancelled: false })
    ));
    let stderr_lines = events
        .iter()
        .filter(|e| matches!(e, SinkEvent::Line { stream: OutputStream::Stderr, .. }))
        .count();
    assert_eq!(stderr_lines, 3);
    assert_eq!(sink.lines_for(0).len(), 6);
}

#[tokio::test]
async fn failed_batch_does_not_stop_the_run() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let list = urls(&[
        "https://example.com/ok01",
        "https://example.com/fail",
        "https://example.com/ok02",
    ]);
    let ceiling = one_url_per_batch(tool, &options, list[0].len());
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(tool, settings(ceiling, 1), sink.clone());

    let summary = dispatcher.run(&options, &list).await.unwrap();

    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.results.len(), 3);
    assert!(summary.completed());
    assert!(!summary.succeeded());
    let order: Vec<usize> = summary.results.iter().map(|r| r.batch_index).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(summary.results[1].exit_code, Some(3));
    assert!(summary.results[0].succeeded && summary.results[2].succeeded);
    assert_eq!(summary.failed_urls(), vec!["https://example.com/fail"]);
    assert_eq!(summary.progress.items.failed, 1);
    assert!(sink.warnings().iter().any(|w| matches!(
        w,
        SinkEvent::Warning { batch_index: Some(1), message } if message.contains("exit code 3")
    )));
    let last = sink.lines_for(2);
    assert_eq!(last.len(), 2);
    assert!(last.contains(&"fetched https://example.com/ok02".to_string()));
}

#[tokio::test]
async fn cancel_terminates_running_batch_and_skips_the_rest() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let list = urls(&[
        "https://example.com/slow",
        "https://example.com/next",
        "https://example.com/last",
    ]);
    let ceiling = one_url_per_batch(tool, &options, list[0].len());
    let sink = Arc::new(MemorySink::new());
    let control = Arc::new(RunControl::new());
    let dispatcher =
        Dispatcher::new(tool, settings(ceiling, 1), sink.clone()).with_control(Arc::clone(&control));

    let canceller = tokio::spawn({
        let control = Arc::clone(&control);
        async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            control.cancel();
        }
    });
    let started = Instant::now();
    let summary = dispatcher.run(&options, &list).await.unwrap();
    canceller.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.results.len(), 1);
    assert!(summary.results[0].terminated);
    assert!(!summary.results[0].succeeded);
    assert!(summary.cancelled);
    assert!(!summary.completed());
    let spawned = sink
        .events()
        .iter()
        .filter(|e| matches!(e, SinkEvent::Started { .. }))
        .count();
    assert_eq!(spawned, 1);
}

#[tokio::test]
async fn cancel_stops_descendants_that_hold_the_pipes() {
    let tool = common::fake_tool::wrapper_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let sink = Arc::new(MemorySink::new());
    let control = Arc::new(RunControl::new());
    let dispatcher = Dispatcher::new(tool, settings(32_000, 1), sink.clone())
        .with_control(Arc::clone(&control));

    let canceller = tokio::spawn({
        let control = Arc::clone(&control);
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            control.cancel();
        }
    });
    let started = Instant::now();
    let summary = dispatcher
        .run(&options, &urls(&["https://example.com/a"]))
        .await
        .unwrap();
    canceller.await.unwrap();

    // The script's `sleep 8` would hold stdout open for the full 8 s.
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(summary.results.len(), 1);
    assert!(summary.results[0].terminated);
    assert!(summary.cancelled);
    assert!(!summary.succeeded());
    assert!(!sink.lines_for(0).contains(&"done".to_string()));
}

/// Cancels the run as soon as the first batch has been recorded.
struct CancelAfterFirstBatch {
    inner: MemorySink,
    control: Arc<RunControl>,
}

impl LogSink for CancelAfterFirstBatch {
    fn batch_started(&self, batch: &UrlBatch, total_batches: usize) {
        self.inner.batch_started(batch, total_batches);
    }

    fn line(&self, batch_index: usize, stream: OutputStream, line: &str) {
        self.inner.line(batch_index, stream, line);
    }

    fn warning(&self, batch_index: Option<usize>, message: &str) {
        self.inner.warning(batch_index, message);
    }

    fn batch_finished(&self, result: &InvocationResult, progress: &RunProgress) {
        self.inner.batch_finished(result, progress);
        self.control.cancel();
    }

    fn summary(&self, summary: &BatchRunSummary) {
        self.inner.summary(summary);
    }
}

#[tokio::test]
async fn cancel_between_batches_is_not_a_success() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let list = urls(&[
        "https://example.com/one",
        "https://example.com/two",
        "https://example.com/six",
    ]);
    let ceiling = one_url_per_batch(tool, &options, list[0].len());
    let control = Arc::new(RunControl::new());
    let sink = Arc::new(CancelAfterFirstBatch {
        inner: MemorySink::new(),
        control: Arc::clone(&control),
    });
    let dispatcher =
        Dispatcher::new(tool, settings(ceiling, 1), sink.clone()).with_control(Arc::clone(&control));

    let summary = dispatcher.run(&options, &list).await.unwrap();

    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.results.len(), 1);
    assert!(summary.results[0].succeeded);
    assert!(summary.cancelled);
    assert!(!summary.completed());
    assert!(!summary.succeeded());
    let spawned = sink
        .inner
        .events()
        .iter()
        .filter(|e| matches!(e, SinkEvent::Started { .. }))
        .count();
    assert_eq!(spawned, 1);
    assert!(matches!(
        sink.inner.events().last(),
        Some(SinkEvent::Summary { results: 1, succeeded: false, cancelled: true })
    ));
}

#[tokio::test]
async fn cancel_before_start_spawns_nothing() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(tool, DispatchSettings::default(), sink.clone());
    dispatcher.control().cancel();

    let summary = dispatcher
        .run(&options, &urls(&["https://example.com/a"]))
        .await
        .unwrap();

    assert!(summary.results.is_empty());
    assert!(summary.cancelled);
    assert!(!sink.events().iter().any(|e| matches!(e, SinkEvent::Started { .. })));
}

#[tokio::test]
async fn oversize_url_is_dispatched_alone_with_warning() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let long = format!("https://example.com/{}", "x".repeat(200));
    let list = vec!["https://example.com/a".to_string(), long.clone()];
    let ceiling = batch::command_len(tool, &options.prefix_args()) + 40;
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(tool, settings(ceiling, 1), sink.clone());

    let plan = dispatcher.plan(&options, &list).unwrap();
    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.oversize().count(), 1);

    let summary = dispatcher.run(&options, &list).await.unwrap();
    assert!(summary.succeeded());
    assert_eq!(summary.results[1].urls, vec![long.clone()]);
    assert_eq!(summary.results[1].stdout_lines, vec![format!("fetched {long}")]);
    assert!(sink.warnings().iter().any(|w| matches!(
        w,
        SinkEvent::Warning { batch_index: Some(1), message } if message.contains("too long")
    )));
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let dir = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(dir.path().join("out"));
    let dispatcher = Dispatcher::new(
        dir.path().join("no-such-tool"),
        DispatchSettings::default(),
        Arc::new(MemorySink::new()),
    );

    let err = dispatcher
        .run(&options, &urls(&["https://example.com/a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Spawn { .. }));
    assert!(err.to_string().contains("navillera fetch"));
}

#[tokio::test]
async fn invalid_input_fails_before_spawning() {
    let dir = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(dir.path().join("out"));
    let dispatcher = Dispatcher::new(
        dir.path().join("no-such-tool"),
        settings(10, 1),
        Arc::new(MemorySink::new()),
    );

    let err = dispatcher
        .run(&options, &urls(&["https://example.com/a"]))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    let dispatcher = Dispatcher::new(
        dir.path().join("no-such-tool"),
        DispatchSettings::default(),
        Arc::new(MemorySink::new()),
    );
    let err = dispatcher.run(&options, &[]).await.unwrap_err();
    assert!(err.is_configuration());
    let err = dispatcher
        .run(&options, &urls(&["https://example.com/a", "  "]))
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn parallel_batches_each_get_their_own_output() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let list: Vec<String> = (0..6).map(|i| format!("https://example.com/p{i}")).collect();
    let ceiling = one_url_per_batch(tool, &options, list[0].len());
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(tool, settings(ceiling, 3), sink.clone());

    let summary = dispatcher.run(&options, &list).await.unwrap();

    assert_eq!(summary.total_batches, 6);
    assert_eq!(summary.results.len(), 6);
    assert!(summary.succeeded());
    assert!(summary.completed());
    for result in &summary.results {
        assert_eq!(result.urls.len(), 1);
        assert_eq!(result.stdout_lines, vec![format!("fetched {}", result.urls[0])]);
        let tagged = sink.lines_for(result.batch_index);
        assert!(tagged.contains(&format!("note {}", result.urls[0])));
    }
    assert_eq!(summary.progress.urls_done, 6);
}

#[tokio::test]
async fn printed_media_paths_are_counted() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());
    let dispatcher = Dispatcher::new(tool, DispatchSettings::default(), Arc::new(MemorySink::new()));

    let summary = dispatcher
        .run(&options, &urls(&["https://example.com/media1", "https://example.com/media2"]))
        .await
        .unwrap();

    assert_eq!(summary.results[0].counts.downloaded, 2);
    assert_eq!(summary.progress.items.downloaded, 2);
    assert_eq!(summary.progress.items.failed, 0);
}

#[tokio::test]
async fn dry_run_captures_stdout_then_stderr() {
    let tool = common::fake_tool::echo_tool();
    let out = tempdir().unwrap();
    let options = DownloadOptions::with_output_directory(out.path());

    let dry = tool::resolve_media_urls(
        tool,
        &options.prefix_args(),
        "https://example.com/g/1",
        Duration::from_secs(10),
    )
    .await
    .unwrap();

    assert_eq!(dry.exit_code, Some(0));
    assert_eq!(
        dry.lines,
        vec!["fetched https://example.com/g/1", "note https://example.com/g/1"]
    );
}
