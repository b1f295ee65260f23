//! Gathering the URL list for `navillera run` from arguments, files and stdin.

use anyhow::{Context, Result};
use navillera_core::url_list::{self, CleanedUrls};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where URL text can come from.
pub trait TextSource {
    fn read_file(&self, path: &Path) -> Result<String>;
    fn read_stdin(&self) -> Result<String>;
}

/// Real filesystem and process stdin.
pub struct StdSources;

impl TextSource for StdSources {
    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("read URL list {}", path.display()))
    }

    fn read_stdin(&self) -> Result<String> {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read URL list from stdin")?;
        Ok(text)
    }
}

/// URL list after cleaning, with what was dropped along the way.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectedUrls {
    pub urls: Vec<String>,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Positional URLs first, then each file in order. Lines from files are merged
/// (already present URLs are not appended again) unless `keep_duplicates`.
pub fn collect_urls(
    positional: &[String],
    files: &[PathBuf],
    keep_duplicates: bool,
    src: &dyn TextSource,
) -> Result<CollectedUrls> {
    let mut stdin_read = false;
    let mut read_stdin = |out: &mut Vec<CleanedUrls>| -> Result<()> {
        if !stdin_read {
            stdin_read = true;
            out.push(url_list::clean_urls(&src.read_stdin()?));
        }
        Ok(())
    };

    let mut blocks = Vec::new();
    let mut inline = String::new();
    for arg in positional {
        if arg == "-" {
            read_stdin(&mut blocks)?;
        } else {
            inline.push_str(arg);
            inline.push('\n');
        }
    }
    blocks.insert(0, url_list::clean_urls(&inline));
    for path in files {
        if path.as_os_str() == "-" {
            read_stdin(&mut blocks)?;
        } else {
            blocks.push(url_list::clean_urls(&src.read_file(path)?));
        }
    }

    let mut out = CollectedUrls::default();
    let mut blocks = blocks.into_iter();
    if let Some(first) = blocks.next() {
        out.skipped += first.skipped;
        out.urls = first.urls;
    }
    for block in blocks {
        out.skipped += block.skipped;
        if keep_duplicates {
            out.urls.extend(block.urls);
        } else {
            let offered = block.urls.len();
            let added = url_list::merge_url_lists(&mut out.urls, block.urls);
            out.duplicates += offered - added;
        }
    }
    if !keep_duplicates {
        out.duplicates += url_list::dedup_preserving_order(&mut out.urls);
    }
    Ok(out)
}
