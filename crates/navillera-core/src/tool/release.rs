//! Latest upstream release from the GitHub releases API.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use super::APP_USER_AGENT;

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: Option<String>,
}

/// Extracts the version from a release JSON body (`tag_name`, leading `v` removed).
pub fn parse_release_tag(body: &[u8]) -> Option<String> {
    let release: Release = serde_json::from_slice(body).ok()?;
    let tag = release.tag_name?;
    let tag = tag.trim();
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    (!tag.is_empty()).then(|| tag.to_string())
}

/// Fetches the latest release tag. Blocking.
pub fn fetch_latest_tag(api_url: &str, timeout: Duration) -> Result<String> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(api_url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.useragent(APP_USER_AGENT)?;
    easy.connect_timeout(Duration::from_secs(10))?;
    easy.timeout(timeout)?;

    let mut headers = curl::easy::List::new();
    headers.append("Accept: application/vnd.github+json")?;
    easy.http_headers(headers)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("release query failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("release query returned HTTP {}", code);
    }

    parse_release_tag(&body).context("release response has no tag_name")
}

/// Latest upstream version, or `None` when offline or rate-limited.
pub fn latest_version(api_url: &str) -> Option<String> {
    match fetch_latest_tag(api_url, Duration::from_secs(10)) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::info!(
                "update check: could not reach the release feed ({:#}); will try again later",
                e
            );
            None
        }
    }
}
