//! Live classification of tool output and run-level progress.
//!
//! Error-looking lines count as failed items; printed media paths count as
//! downloaded or skipped depending on whether the file predates the batch.
//! Progress itself is URL based: a batch's URLs are done when it exits.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Files modified less than this after the batch started still count as pre-existing.
const MTIME_SLACK: Duration = Duration::from_millis(500);

const ERROR_MARKERS: [&str; 4] = ["error:", "http error", "forbidden", "not found"];

fn media_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:[A-Za-z]:\\[^:*?"<>|\r\n]+|/[^:*?"<>|\r\n]+)\.(?:jpe?g|png|gif|webp|mp4|webm|mkv|mov|avi)\b"#,
        )
        .expect("media path regex is valid")
    })
}

/// Item tallies for one batch or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub downloaded: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl ItemCounts {
    pub fn add(&mut self, other: &ItemCounts) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Error,
    Downloaded(String),
    Skipped(String),
    Other,
}

/// Per-batch classifier; remembers paths it has already counted.
#[derive(Debug)]
pub struct OutputClassifier {
    started_at: SystemTime,
    seen_paths: HashSet<String>,
    counts: ItemCounts,
}

impl OutputClassifier {
    pub fn new(started_at: SystemTime) -> Self {
        Self {
            started_at,
            seen_paths: HashSet::new(),
            counts: ItemCounts::default(),
        }
    }

    /// Classifies one output line and updates the tallies.
    pub fn observe(&mut self, line: &str) -> LineClass {
        let line = line.trim();
        let low = line.to_lowercase();
        if ERROR_MARKERS.iter().any(|m| low.contains(m)) {
            self.counts.failed += 1;
            return LineClass::Error;
        }

        let Some(m) = media_path_re().find(line) else {
            return LineClass::Other;
        };
        let path = m.as_str().to_string();
        if !self.seen_paths.insert(path.clone()) {
            return LineClass::Other;
        }

        if self.predates_batch(Path::new(&path)) {
            self.counts.skipped += 1;
            LineClass::Skipped(path)
        } else {
            self.counts.downloaded += 1;
            LineClass::Downloaded(path)
        }
    }

    fn predates_batch(&self, path: &Path) -> bool {
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime < self.started_at + MTIME_SLACK,
            // Not on disk (yet): assume the tool just wrote it.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(_) => true,
        }
    }

    pub fn counts(&self) -> ItemCounts {
        self.counts
    }
}

/// Snapshot of run progress (CLI-friendly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub urls_done: usize,
    pub urls_total: usize,
    pub batches_done: usize,
    pub batches_total: usize,
    pub items: ItemCounts,
}

impl RunProgress {
    pub fn new(urls_total: usize, batches_total: usize) -> Self {
        Self {
            urls_total,
            batches_total,
            ..Default::default()
        }
    }

    /// Records a finished batch. A non-zero exit adds one failure on top of
    /// the failures seen in its output.
    pub fn record_batch(&mut self, urls: usize, counts: &ItemCounts, succeeded: bool) {
        self.urls_done += urls;
        self.batches_done += 1;
        self.items.add(counts);
        if !succeeded {
            self.items.failed += 1;
        }
    }

    /// Fraction of URLs handled, in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.urls_total == 0 {
            return 1.0;
        }
        (self.urls_done as f64 / self.urls_total as f64).min(1.0)
    }
}
