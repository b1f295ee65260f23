//! Download options: the immutable snapshot of user choices for one run.
//!
//! The options are turned into the fixed argument prefix shared by every
//! batch of the run (see [`DownloadOptions::prefix_args`]).

mod args;
mod validate;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use args::{IMAGES_FILTER, VIDEOS_FILTER};

/// User-Agent sent by the tool: the tool's `browser` token or a literal string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserAgent {
    #[default]
    Browser,
    Custom(String),
}

impl UserAgent {
    /// Parses a stored/CLI value. `browser` (any case) or a blank value means
    /// the browser token; anything else is used verbatim.
    pub fn from_setting(value: &str) -> Self {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("browser") {
            UserAgent::Browser
        } else {
            UserAgent::Custom(v.to_string())
        }
    }

    /// Value passed after `--user-agent`.
    pub fn as_arg(&self) -> &str {
        match self {
            UserAgent::Browser => "browser",
            UserAgent::Custom(s) => s,
        }
    }
}

impl From<String> for UserAgent {
    fn from(value: String) -> Self {
        UserAgent::from_setting(&value)
    }
}

impl From<UserAgent> for String {
    fn from(value: UserAgent) -> Self {
        value.as_arg().to_string()
    }
}

/// Which media the tool should keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    Images,
    Videos,
    #[default]
    Both,
}

impl FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(MediaFilter::Images),
            "videos" | "video" => Ok(MediaFilter::Videos),
            "both" | "all" => Ok(MediaFilter::Both),
            other => Err(format!(
                "unknown media filter '{other}' (expected images, videos or both)"
            )),
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaFilter::Images => "images",
            MediaFilter::Videos => "videos",
            MediaFilter::Both => "both",
        };
        f.write_str(s)
    }
}

/// Options shared by every invocation in a run. Never mutated by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub user_agent: UserAgent,
    /// Netscape or JSON cookies file passed with `--cookies`.
    pub cookies_path: Option<PathBuf>,
    pub media_filter: MediaFilter,
    /// Per-URL network retries inside the tool (`--retries`).
    pub retries: u32,
    /// Must be > 0.
    pub http_timeout_secs: f64,
    /// Delay between HTTP requests (`--sleep-request`), >= 0.
    pub sleep_secs: f64,
    /// Created before the run if absent.
    pub output_directory: PathBuf,
}

impl DownloadOptions {
    /// Options with the form's defaults and the given destination.
    pub fn with_output_directory(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            user_agent: UserAgent::Browser,
            cookies_path: None,
            media_filter: MediaFilter::Both,
            retries: 3,
            http_timeout_secs: 30.0,
            sleep_secs: 1.0,
            output_directory: output_directory.into(),
        }
    }
}

/// Default destination: `~/Downloads/gallery-dl`, or `~/gallery-dl` when the
/// user has no download directory.
pub fn default_output_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gallery-dl")
}
