//! Pre-run validation: every check here happens before any process is spawned.

use std::fs;
use std::path::Path;

use super::{DownloadOptions, UserAgent};
use crate::dispatch::DispatchError;

const WRITE_TEST_NAME: &str = ".navillera-write-test";

impl DownloadOptions {
    /// Checks option values and the cookies file without touching the output directory.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if let UserAgent::Custom(ua) = &self.user_agent {
            if ua.trim().is_empty() {
                return Err(DispatchError::config("custom user agent is empty"));
            }
        }

        if let Some(cookies) = &self.cookies_path {
            if !cookies.is_file() {
                return Err(DispatchError::config(format!(
                    "cookies file not found: {}",
                    cookies.display()
                )));
            }
        }

        if !self.http_timeout_secs.is_finite() || self.http_timeout_secs <= 0.0 {
            return Err(DispatchError::config(format!(
                "HTTP timeout must be greater than 0 (got {})",
                self.http_timeout_secs
            )));
        }

        if !self.sleep_secs.is_finite() || self.sleep_secs < 0.0 {
            return Err(DispatchError::config(format!(
                "sleep must be 0 or more seconds (got {})",
                self.sleep_secs
            )));
        }

        if self.output_directory.as_os_str().is_empty() {
            return Err(DispatchError::config("output directory is empty"));
        }

        Ok(())
    }

    /// Creates the output directory if needed and checks it accepts new files.
    pub fn ensure_output_directory(&self) -> Result<(), DispatchError> {
        ensure_writable_dir(&self.output_directory)
    }
}

fn ensure_writable_dir(dir: &Path) -> Result<(), DispatchError> {
    if dir.exists() && !dir.is_dir() {
        return Err(DispatchError::config(format!(
            "output path is not a directory: {}",
            dir.display()
        )));
    }
    fs::create_dir_all(dir).map_err(|e| {
        DispatchError::config(format!(
            "cannot create output directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let marker = dir.join(WRITE_TEST_NAME);
    fs::write(&marker, b"").map_err(|e| {
        DispatchError::config(format!(
            "output directory is not writable: {}: {}",
            dir.display(),
            e
        ))
    })?;
    let _ = fs::remove_file(&marker);
    Ok(())
}
