//! Diagnostic log setup.
//!
//! Events go to `navillera.log` under the XDG state dir. When that file
//! cannot be opened they go to stderr instead, with a quieter filter: the
//! console already prints every tool line, and the tracing mirror of those
//! lines would double them. `RUST_LOG` overrides either filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILE_FILTER: &str = "info,navillera=debug,navillera_core=debug";
const STDERR_FILTER: &str = "warn";

/// Where diagnostics ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    /// Filter used when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        match self {
            LogTarget::File(_) => FILE_FILTER,
            LogTarget::Stderr => STDERR_FILTER,
        }
    }
}

fn build_filter(target: &LogTarget) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(target.default_filter()))
}

/// Path of the diagnostic log: `~/.local/state/navillera/navillera.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("navillera")?;
    Ok(xdg_dirs.get_state_home().join("navillera").join("navillera.log"))
}

/// Opens `path` for appending, creating parent directories.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Installs the global subscriber. Never fails: an unusable log file
/// falls back to stderr, and the reason is logged there.
pub fn init() -> LogTarget {
    let opened = log_file_path().and_then(|path| open_log_file(&path).map(|file| (path, file)));
    match opened {
        Ok((path, file)) => {
            let target = LogTarget::File(path.clone());
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(&target))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
            tracing::info!("navillera logging initialized at {}", path.display());
            target
        }
        Err(err) => {
            let target = LogTarget::Stderr;
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(&target))
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
            tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
            target
        }
    }
}
