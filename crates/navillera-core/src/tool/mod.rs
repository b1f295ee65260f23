//! Management of the external gallery-dl executable: where it lives, which
//! release assets to fetch, version checks and the dry-run probe.
//!
//! Network calls use the curl crate (blocking); the async wrappers here move
//! them onto the blocking pool.

mod fetch;
mod probe;
mod release;
mod update_state;
mod version;

pub use fetch::{download_file, install_from, make_executable};
pub use probe::{resolve_media_urls, ProbeOutput};
pub use release::{fetch_latest_tag, latest_version, parse_release_tag};
pub use update_state::{unix_now, UpdateState};
pub use version::{is_newer, local_version, parse_version};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// GitHub API endpoint describing the latest upstream release.
pub const RELEASES_API_URL: &str = "https://api.github.com/repos/mikf/gallery-dl/releases/latest";

/// User-Agent for our own HTTP requests (not the one passed to the tool).
pub const APP_USER_AGENT: &str = concat!("Navillera/", env!("CARGO_PKG_VERSION"));

/// Timeout for a single asset download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for `--version` and similar short tool calls.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(8);

/// Prebuilt release assets for an OS (`std::env::consts::OS` naming), in the
/// order they should be tried.
pub fn asset_urls_for(os: &str) -> &'static [&'static str] {
    match os {
        "windows" => &[
            "https://github.com/mikf/gallery-dl/releases/latest/download/gallery-dl.exe",
            "https://github.com/gdl-org/builds/releases/latest/download/gallery-dl_windows_x64.exe",
        ],
        "macos" => &[
            "https://github.com/gdl-org/builds/releases/latest/download/gallery-dl_macos_universal",
            "https://github.com/mikf/gallery-dl/releases/latest/download/gallery-dl.bin",
        ],
        _ => &[
            "https://github.com/gdl-org/builds/releases/latest/download/gallery-dl_linux",
            "https://github.com/mikf/gallery-dl/releases/latest/download/gallery-dl.bin",
        ],
    }
}

pub fn tool_file_name_for(os: &str) -> &'static str {
    if os == "windows" {
        "gallery-dl.exe"
    } else {
        "gallery-dl"
    }
}

/// `~/.local/share/navillera/bin`.
pub fn default_bin_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("navillera")?;
    Ok(xdg_dirs.get_data_home().join("navillera").join("bin"))
}

/// Installed tool location when the config does not override it.
pub fn default_tool_path() -> Result<PathBuf> {
    Ok(default_bin_dir()?.join(tool_file_name_for(std::env::consts::OS)))
}

/// Installed and upstream versions; either may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionStatus {
    pub local: Option<String>,
    pub latest: Option<String>,
}

impl VersionStatus {
    pub fn update_available(&self) -> bool {
        match (&self.local, &self.latest) {
            (Some(local), Some(latest)) => is_newer(local, latest),
            _ => false,
        }
    }

    /// Both versions are known and the installed one is not older.
    pub fn is_current(&self) -> bool {
        matches!((&self.local, &self.latest), (Some(_), Some(_))) && !self.update_available()
    }
}

/// Queries the installed version and the latest release.
pub async fn version_status(tool_path: &Path, api_url: &str) -> VersionStatus {
    let local = local_version(tool_path, VERSION_TIMEOUT).await;
    let api_url = api_url.to_string();
    let latest = tokio::task::spawn_blocking(move || latest_version(&api_url))
        .await
        .unwrap_or(None);
    VersionStatus { local, latest }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Installed version already matches the latest release; nothing downloaded.
    AlreadyCurrent { version: String },
    Installed {
        path: PathBuf,
        source_url: String,
        version: Option<String>,
    },
}

/// Downloads the tool from the first working asset URL unless the installed
/// copy is already the latest release (`force` skips that check).
pub async fn fetch_or_update(
    tool_path: &Path,
    asset_urls: &[String],
    api_url: &str,
    force: bool,
) -> Result<FetchOutcome> {
    if !force && tool_path.is_file() {
        let status = version_status(tool_path, api_url).await;
        if status.is_current() {
            let version = status.local.unwrap_or_default();
            tracing::info!(%version, "tool already up to date, skipping download");
            return Ok(FetchOutcome::AlreadyCurrent { version });
        }
    }

    let dest = tool_path.to_path_buf();
    let urls = asset_urls.to_vec();
    let source_url = tokio::task::spawn_blocking(move || install_from(&urls, &dest))
        .await
        .context("fetch task")??;

    let version = local_version(tool_path, VERSION_TIMEOUT).await;
    Ok(FetchOutcome::Installed {
        path: tool_path.to_path_buf(),
        source_url,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_urls_per_platform() {
        assert!(asset_urls_for("windows")[0].ends_with("gallery-dl.exe"));
        assert!(asset_urls_for("macos")[0].ends_with("gallery-dl_macos_universal"));
        assert!(asset_urls_for("linux")[0].ends_with("gallery-dl_linux"));
        assert_eq!(asset_urls_for("freebsd"), asset_urls_for("linux"));
        for os in ["windows", "macos", "linux"] {
            assert_eq!(asset_urls_for(os).len(), 2);
        }
    }

    #[test]
    fn tool_file_name() {
        assert_eq!(tool_file_name_for("windows"), "gallery-dl.exe");
        assert_eq!(tool_file_name_for("linux"), "gallery-dl");
    }

    #[test]
    fn version_status_decisions() {
        let s = VersionStatus {
            local: Some("1.26.0".into()),
            latest: Some("1.27.1".into()),
        };
        assert!(s.update_available());
        assert!(!s.is_current());

        let s = VersionStatus {
            local: Some("1.27.1".into()),
            latest: Some("1.27.1".into()),
        };
        assert!(!s.update_available());
        assert!(s.is_current());

        let s = VersionStatus {
            local: None,
            latest: Some("1.27.1".into()),
        };
        assert!(!s.update_available());
        assert!(!s.is_current());
    }
}
