//! Binary download: GET to a temp file, optional SHA-256 check, atomic rename.
//!
//! Blocking (curl easy interface); call from `spawn_blocking` in async code.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{APP_USER_AGENT, DOWNLOAD_TIMEOUT};
use crate::checksum;

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "download".into());
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Downloads `url` to `dest`, replacing it only once the whole body (and the
/// checksum, when given) is good. The temp file is removed on any failure.
pub fn download_file(
    url: &str,
    dest: &Path,
    expected_sha256: Option<&str>,
    timeout: Duration,
) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let tmp = tmp_path(dest);

    let staged = get_to_file(url, &tmp, timeout).and_then(|()| match expected_sha256 {
        Some(expected) => checksum::verify_sha256(&tmp, expected),
        None => Ok(()),
    });
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, dest)
        .with_context(|| format!("move {} to {}", tmp.display(), dest.display()))?;
    Ok(())
}

fn get_to_file(url: &str, path: &Path, timeout: Duration) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.useragent(APP_USER_AGENT)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(timeout)?;

    let mut write_error: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                write_error = Some(e);
                // Short write makes curl abort the transfer.
                Ok(0)
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_error {
        return Err(e).with_context(|| format!("write {}", path.display()));
    }
    performed.with_context(|| format!("GET {} failed", url))?;

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }

    file.sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}

/// Adds execute permission for user, group and others. No-op off Unix.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms)
            .with_context(|| format!("chmod {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Tries each asset URL in order and installs the first that downloads.
/// Returns the URL that worked; the error lists every failed attempt.
pub fn install_from(asset_urls: &[String], dest: &Path) -> Result<String> {
    let mut failures = Vec::new();
    for url in asset_urls {
        tracing::info!(%url, "trying asset");
        match download_file(url, dest, None, DOWNLOAD_TIMEOUT).and_then(|()| make_executable(dest)) {
            Ok(()) => {
                tracing::info!(path = %dest.display(), "saved tool");
                return Ok(url.clone());
            }
            Err(e) => {
                tracing::warn!(%url, "download failed: {:#}", e);
                failures.push(format!("{}: {:#}", url, e));
            }
        }
    }
    if failures.is_empty() {
        anyhow::bail!("no release assets to try");
    }
    anyhow::bail!("could not fetch gallery-dl:\n  {}", failures.join("\n  "))
}
