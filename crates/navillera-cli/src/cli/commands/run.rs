//! `navillera run` – partition the URL list and run gallery-dl once per batch.

use anyhow::{bail, Result};
use navillera_core::config::{self, FormDefaults, NavilleraConfig};
use navillera_core::control::RunControl;
use navillera_core::dispatch::{BatchRunSummary, Dispatcher};
use navillera_core::tool::{self, UpdateState, RELEASES_API_URL};
use std::sync::Arc;

use crate::cli::console::ConsoleSink;
use crate::cli::inputs::{self, StdSources};
use crate::cli::RunArgs;

/// Exit code when some batches failed.
pub const EXIT_FAILED_BATCHES: i32 = 2;
/// Exit code after Ctrl-C or `navillera stop` (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

pub async fn run_dispatch(mut cfg: NavilleraConfig, args: RunArgs) -> Result<i32> {
    let collected =
        inputs::collect_urls(&args.urls, &args.files, args.keep_duplicates, &StdSources)?;
    if collected.skipped > 0 {
        println!("Skipped {} non-URL line(s).", collected.skipped);
    }
    if collected.duplicates > 0 {
        println!("Removed {} duplicate URL(s).", collected.duplicates);
    }
    if collected.urls.is_empty() {
        bail!("no URLs to download (pass URLs, --file <PATH>, or - for stdin)");
    }

    let options = args.options.apply(&cfg.defaults);
    let mut settings = cfg.dispatch_settings();
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs.max(1);
    }
    if let Some(max) = args.max_command_len {
        settings.max_command_len = max;
    }
    let tool_path = cfg.tool_path()?;

    let update_check = (!args.no_update_check).then(|| {
        let tool_path = tool_path.clone();
        let interval = cfg.update_check_interval_secs;
        tokio::spawn(async move { throttled_update_check(&tool_path, interval).await })
    });

    let control = Arc::new(RunControl::new());
    let ctrl_c = spawn_ctrl_c_handler(Arc::clone(&control));
    let listener = start_control_socket(&control);

    let dispatcher = Dispatcher::new(&tool_path, settings, Arc::new(ConsoleSink::new()))
        .with_control(Arc::clone(&control));
    let outcome = dispatcher.run(&options, &collected.urls).await;

    ctrl_c.abort();
    stop_control_socket(listener);
    if let Some(handle) = update_check {
        handle.abort();
    }

    let summary = outcome?;
    if args.save {
        cfg.defaults = FormDefaults::from_options(&options);
        config::save(&cfg)?;
        println!("Saved these options as defaults.");
    }
    print_failed_urls(&summary);
    Ok(exit_code(&summary))
}

pub fn exit_code(summary: &BatchRunSummary) -> i32 {
    if summary.cancelled {
        EXIT_CANCELLED
    } else if !summary.succeeded() {
        EXIT_FAILED_BATCHES
    } else {
        0
    }
}

fn print_failed_urls(summary: &BatchRunSummary) {
    let failed = summary.failed_urls();
    if failed.is_empty() {
        return;
    }
    println!("URLs in failed batches:");
    for url in failed {
        println!("  {}", url);
    }
}

fn spawn_ctrl_c_handler(control: Arc<RunControl>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !control.is_cancelled() {
                eprintln!("Cancelling: terminating running batches...");
            }
            control.cancel();
        }
    })
}

#[cfg(unix)]
type ControlListener = Option<(std::path::PathBuf, tokio::task::JoinHandle<()>)>;
#[cfg(not(unix))]
type ControlListener = ();

#[cfg(unix)]
fn start_control_socket(control: &Arc<RunControl>) -> ControlListener {
    use crate::cli::control_socket;

    let path = navillera_core::control::default_control_socket_path().ok()?;
    match control_socket::spawn_control_listener(Arc::clone(control), &path) {
        Ok(handle) => {
            tracing::debug!(path = %path.display(), "control socket listening");
            Some((path, handle))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "control socket bind: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn start_control_socket(_control: &Arc<RunControl>) -> ControlListener {}

#[cfg(unix)]
fn stop_control_socket(listener: ControlListener) {
    if let Some((path, handle)) = listener {
        handle.abort();
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(not(unix))]
fn stop_control_socket(_listener: ControlListener) {}

/// Checks for a newer gallery-dl at most once per `interval_secs`.
async fn throttled_update_check(tool_path: &std::path::Path, interval_secs: u64) {
    let Ok(state_path) = UpdateState::default_path() else {
        return;
    };
    let mut state = match UpdateState::load_from_path(&state_path) {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => {
            tracing::debug!("ignoring unreadable update state: {:#}", e);
            UpdateState::default()
        }
    };
    let now = tool::unix_now();
    if !state.is_due(now, interval_secs) {
        return;
    }

    let status = tool::version_status(tool_path, RELEASES_API_URL).await;
    if status.latest.is_some() {
        state.mark_checked(now);
        if let Err(e) = state.save_to_path(&state_path) {
            tracing::warn!("could not save update state: {:#}", e);
        }
    }
    if status.update_available() {
        let local = status.local.unwrap_or_default();
        let latest = status.latest.unwrap_or_default();
        tracing::info!(%local, %latest, "gallery-dl update available");
        eprintln!(
            "gallery-dl {} is available (installed {}); run `navillera fetch` to update.",
            latest, local
        );
    }
}
