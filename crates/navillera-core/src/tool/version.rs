//! Version strings: extraction from tool output and ordering.

use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+\.\d+(?:\.\d+)*)\b").expect("version regex is valid"))
}

/// First dotted version number in `text` (e.g. "1.27.1" from "gallery-dl 1.27.1").
pub fn parse_version(text: &str) -> Option<String> {
    version_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn numeric_parts(version: &str) -> Vec<u64> {
    let main = version.split('-').next().unwrap_or("");
    main.split('.')
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|p| p.parse().ok())
        .collect()
}

/// True when `remote` is strictly newer than `local`. Suffixes after `-`
/// are ignored; non-numeric components are skipped.
pub fn is_newer(local: &str, remote: &str) -> bool {
    numeric_parts(remote) > numeric_parts(local)
}

/// Runs `<tool> --version` and extracts the version. `None` when the tool is
/// missing, fails, times out or prints nothing recognisable.
pub async fn local_version(tool: &Path, timeout: Duration) -> Option<String> {
    if !tool.is_file() {
        return None;
    }
    let output = tokio::process::Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();
    match tokio::time::timeout(timeout, output).await {
        Ok(Ok(out)) => {
            let text = String::from_utf8_lossy(&out.stdout);
            let version = parse_version(&text)
                .or_else(|| parse_version(&String::from_utf8_lossy(&out.stderr)));
            if version.is_none() {
                tracing::debug!(tool = %tool.display(), "no version in --version output");
            }
            version
        }
        Ok(Err(e)) => {
            tracing::debug!(tool = %tool.display(), "--version failed: {}", e);
            None
        }
        Err(_) => {
            tracing::debug!(tool = %tool.display(), "--version timed out");
            None
        }
    }
}
