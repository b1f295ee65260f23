//! Mapping from options to the tool's command-line flags.

use super::{DownloadOptions, MediaFilter};

/// `--filter` expression keeping still images.
pub const IMAGES_FILTER: &str = "extension in ('jpg','jpeg','png')";
/// `--filter` expression keeping videos.
pub const VIDEOS_FILTER: &str = "extension in ('mp4','webm')";

impl MediaFilter {
    /// Filter expression, or `None` when no `--filter` flag is passed.
    pub fn expression(&self) -> Option<&'static str> {
        match self {
            MediaFilter::Images => Some(IMAGES_FILTER),
            MediaFilter::Videos => Some(VIDEOS_FILTER),
            MediaFilter::Both => None,
        }
    }
}

impl DownloadOptions {
    /// Fixed flags that precede the URLs in every invocation of a run.
    ///
    /// Order: user agent, cookies, destination, filter, retries, timeout, sleep.
    pub fn prefix_args(&self) -> Vec<String> {
        let mut args = vec!["--user-agent".to_string(), self.user_agent.as_arg().to_string()];

        if let Some(cookies) = &self.cookies_path {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args.push("-d".to_string());
        args.push(self.output_directory.to_string_lossy().into_owned());

        if let Some(expr) = self.media_filter.expression() {
            args.push("--filter".to_string());
            args.push(expr.to_string());
        }

        args.push("--retries".to_string());
        args.push(self.retries.to_string());
        args.push("--http-timeout".to_string());
        args.push(format_secs(self.http_timeout_secs));
        args.push("--sleep-request".to_string());
        args.push(format_secs(self.sleep_secs));

        args
    }
}

/// `30.0` -> "30", `1.5` -> "1.5".
fn format_secs(secs: f64) -> String {
    format!("{}", secs)
}
