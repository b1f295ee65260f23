//! Download-option flags shared by `run` and `test`. Unset flags fall back to
//! the `[defaults]` table of the config file.

use clap::Args;
use navillera_core::config::FormDefaults;
use navillera_core::options::{DownloadOptions, MediaFilter, UserAgent};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Args)]
pub struct OptionArgs {
    /// User-Agent for the tool: `browser` or a literal string.
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Cookies file (Netscape or JSON).
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// Keep only images, only videos, or both.
    #[arg(long, value_name = "KIND")]
    pub filter: Option<MediaFilter>,

    /// Network retries per URL.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub http_timeout: Option<f64>,

    /// Delay between requests in seconds.
    #[arg(long, value_name = "SECS")]
    pub sleep: Option<f64>,

    /// Destination directory (created if missing).
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl OptionArgs {
    /// Effective options: flags win over the persisted defaults.
    pub fn apply(&self, defaults: &FormDefaults) -> DownloadOptions {
        let mut opts = defaults.to_options();
        if let Some(ua) = &self.user_agent {
            opts.user_agent = UserAgent::from_setting(ua);
        }
        if let Some(cookies) = &self.cookies {
            opts.cookies_path = Some(cookies.clone());
        }
        if let Some(filter) = self.filter {
            opts.media_filter = filter;
        }
        if let Some(retries) = self.retries {
            opts.retries = retries;
        }
        if let Some(timeout) = self.http_timeout {
            opts.http_timeout_secs = timeout;
        }
        if let Some(sleep) = self.sleep {
            opts.sleep_secs = sleep;
        }
        if let Some(dir) = &self.output_dir {
            opts.output_directory = dir.clone();
        }
        opts
    }
}
