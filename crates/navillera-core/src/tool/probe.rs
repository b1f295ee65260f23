//! Dry run: ask the tool to resolve a URL's media URLs (`-g`) without
//! saving anything.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Output of a dry run, stdout lines first, then stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    pub lines: Vec<String>,
    pub exit_code: Option<i32>,
}

impl ProbeOutput {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Runs `<tool> <prefix> -g <url>` and captures its output.
pub async fn resolve_media_urls(
    program: &Path,
    prefix: &[String],
    url: &str,
    timeout: Duration,
) -> Result<ProbeOutput> {
    let output = tokio::process::Command::new(program)
        .args(prefix)
        .arg("-g")
        .arg(url)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();
    let out = tokio::time::timeout(timeout, output)
        .await
        .with_context(|| format!("dry run timed out after {}s", timeout.as_secs()))?
        .with_context(|| format!("could not start {}", program.display()))?;

    let lines = String::from_utf8_lossy(&out.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&out.stderr).lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ProbeOutput {
        lines,
        exit_code: out.status.code(),
    })
}
