//! Cleaning of pasted or loaded URL lists.
//!
//! One URL per line; blank lines are skipped, a surrounding `<...>` pair is
//! stripped, and only `http`/`https` URLs with a host are kept. The
//! dispatcher itself never filters or dedups; that happens here, upstream.

use std::collections::HashSet;
use url::Url;

/// URLs kept from a block of text plus the number of non-URL lines dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedUrls {
    pub urls: Vec<String>,
    pub skipped: usize,
}

/// Returns the URL on `line` if it is a usable http(s) URL.
pub fn clean_line(line: &str) -> Option<String> {
    let mut s = line.trim();
    if s.is_empty() {
        return None;
    }
    if s.len() >= 2 && s.starts_with('<') && s.ends_with('>') {
        s = s[1..s.len() - 1].trim();
    }
    let parsed = Url::parse(s).ok()?;
    let web = matches!(parsed.scheme(), "http" | "https");
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    (web && has_host).then(|| s.to_string())
}

/// Cleans a multi-line block. Blank lines are not counted as skipped.
pub fn clean_urls(text: &str) -> CleanedUrls {
    let mut out = CleanedUrls::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match clean_line(line) {
            Some(url) => out.urls.push(url),
            None => out.skipped += 1,
        }
    }
    out
}

/// Removes repeated URLs keeping the first occurrence. Returns how many were removed.
pub fn dedup_preserving_order(urls: &mut Vec<String>) -> usize {
    let before = urls.len();
    let mut seen = HashSet::with_capacity(urls.len());
    urls.retain(|u| seen.insert(u.clone()));
    before - urls.len()
}

/// Appends the lines of `added` not already present in `existing`.
/// Returns how many were appended.
pub fn merge_url_lists(existing: &mut Vec<String>, added: impl IntoIterator<Item = String>) -> usize {
    let mut seen: HashSet<String> = existing.iter().cloned().collect();
    let before = existing.len();
    for line in added {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if seen.insert(line.clone()) {
            existing.push(line);
        }
    }
    existing.len() - before
}
