//! One tool invocation: spawn, stream both pipes line by line into the sink,
//! wait for exit or cancellation.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::error::DispatchError;
use super::progress::OutputClassifier;
use super::result::InvocationResult;
use super::sink::{LogSink, OutputStream};
use crate::batch::UrlBatch;
use crate::control::RunControl;

/// Everything an invocation needs besides its batch; cheap to clone into tasks.
#[derive(Clone)]
pub(super) struct InvokeContext {
    pub(super) program: Arc<Path>,
    pub(super) prefix: Arc<[String]>,
    pub(super) sink: Arc<dyn LogSink>,
    pub(super) control: Arc<RunControl>,
    pub(super) kill_grace: Duration,
}

/// Runs one batch to completion (or termination on cancel).
pub(super) async fn run_batch(
    ctx: &InvokeContext,
    batch: &UrlBatch,
) -> Result<InvocationResult, DispatchError> {
    let started = Instant::now();
    let classifier = Arc::new(Mutex::new(OutputClassifier::new(SystemTime::now())));

    let mut cmd = Command::new(&*ctx.program);
    cmd.args(ctx.prefix.iter())
        .args(&batch.urls)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so a cancel also reaches post-processors the tool starts.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| DispatchError::Spawn {
        program: ctx.program.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        batch = batch.index + 1,
        pid = ?child.id(),
        urls = batch.len(),
        "spawned tool"
    );

    let stdout = child.stdout.take().map(|pipe| {
        spawn_reader(pipe, batch.index, OutputStream::Stdout, ctx, &classifier)
    });
    let stderr = child.stderr.take().map(|pipe| {
        spawn_reader(pipe, batch.index, OutputStream::Stderr, ctx, &classifier)
    });

    let mut terminated = false;
    let waited = tokio::select! {
        status = child.wait() => status,
        _ = ctx.control.cancelled() => {
            terminated = true;
            ctx.sink.warning(Some(batch.index), "cancel requested, stopping tool");
            terminate(&mut child, ctx.kill_grace).await
        }
    };
    let status = waited
        .map_err(|e| DispatchError::io(format!("waiting for batch {}", batch.index + 1), e))?;

    // A terminated batch may leave descendants holding the pipes; don't wait on them.
    let drain_limit = terminated.then_some(ctx.kill_grace);
    let stdout_lines = collect(stdout, drain_limit).await;
    let stderr_lines = collect(stderr, drain_limit).await;

    let exit_code = status.code();
    let succeeded = exit_code == Some(0) && !terminated;
    if !succeeded && !terminated {
        ctx.sink.warning(
            Some(batch.index),
            &match exit_code {
                Some(code) => format!("batch failed (exit code {code})"),
                None => "batch failed (killed by signal)".to_string(),
            },
        );
    }

    let counts = classifier
        .lock()
        .map(|c| c.counts())
        .unwrap_or_default();

    Ok(InvocationResult {
        batch_index: batch.index,
        urls: batch.urls.clone(),
        exit_code,
        stdout_lines,
        stderr_lines,
        succeeded,
        terminated,
        counts,
        elapsed: started.elapsed(),
    })
}

fn spawn_reader<R>(
    pipe: R,
    batch_index: usize,
    stream: OutputStream,
    ctx: &InvokeContext,
    classifier: &Arc<Mutex<OutputClassifier>>,
) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let sink = Arc::clone(&ctx.sink);
    let classifier = Arc::clone(classifier);
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    if let Ok(mut c) = classifier.lock() {
                        c.observe(&line);
                    }
                    sink.line(batch_index, stream, &line);
                    lines.push(line);
                }
                Err(e) => {
                    tracing::debug!(batch = batch_index + 1, stream = stream.as_str(), "read: {}", e);
                    break;
                }
            }
        }
        lines
    })
}

/// Lossy UTF-8 with the line terminator (`\n` or `\r\n`) removed.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && buf[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

async fn collect(handle: Option<JoinHandle<Vec<String>>>, limit: Option<Duration>) -> Vec<String> {
    let Some(mut handle) = handle else {
        return Vec::new();
    };
    let Some(limit) = limit else {
        return handle.await.unwrap_or_default();
    };
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(lines) => lines.unwrap_or_default(),
        Err(_) => {
            tracing::debug!("output pipe still open after terminate, dropping reader");
            handle.abort();
            Vec::new()
        }
    }
}

/// Asks the tool's process group to exit, then kills the group if the tool
/// is still alive after `grace`. Leftover group members are killed either way.
async fn terminate(child: &mut Child, grace: Duration) -> std::io::Result<std::process::ExitStatus> {
    let group = child.id();
    if signal_group(group, GroupSignal::Terminate) {
        if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
            signal_group(group, GroupSignal::Kill);
            return status;
        }
        tracing::debug!("tool ignored terminate signal, killing");
    }
    signal_group(group, GroupSignal::Kill);
    child.kill().await?;
    child.wait().await
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(group: Option<u32>, signal: GroupSignal) -> bool {
    let Some(pgid) = group else {
        return false;
    };
    let signo = match signal {
        GroupSignal::Terminate => libc::SIGTERM,
        GroupSignal::Kill => libc::SIGKILL,
    };
    // SAFETY: the child was spawned with process_group(0), so its pid is the
    // id of a group that only holds the tool and its descendants.
    unsafe { libc::killpg(pgid as libc::pid_t, signo) == 0 }
}

#[cfg(not(unix))]
fn signal_group(_group: Option<u32>, _signal: GroupSignal) -> bool {
    false
}
