//! Partitioning of a URL list into invocations that fit under a command-line
//! length ceiling.
//!
//! Greedy and order-preserving: URLs are appended to the current batch until
//! the next one would push `program + prefix + urls` over the ceiling. A URL
//! that cannot fit even alone becomes its own oversize batch instead of being
//! dropped; the dispatcher reports it as a warning.

mod cmdline;

pub use cmdline::{arg_len, command_len};

use crate::dispatch::DispatchError;

/// Conservative default ceiling (Windows allows 32 767 UTF-16 units).
pub const DEFAULT_MAX_COMMAND_LEN: usize = 30_000;

/// URLs assigned to one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBatch {
    /// Zero-based position of the batch in the run.
    pub index: usize,
    pub urls: Vec<String>,
    /// Serialized length of the full invocation (program, prefix and URLs).
    pub command_len: usize,
    /// True when a single URL exceeds the ceiling on its own.
    pub oversize: bool,
}

impl UrlBatch {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Splits `urls` into batches whose command length stays within `ceiling`.
///
/// `prefix_len` is the serialized length of the program and fixed arguments;
/// each URL adds one separator plus its own length.
pub fn partition(
    urls: &[String],
    prefix_len: usize,
    ceiling: usize,
) -> Result<Vec<UrlBatch>, DispatchError> {
    if urls.is_empty() {
        return Err(DispatchError::config("no URLs to download"));
    }
    if let Some(pos) = urls.iter().position(|u| u.trim().is_empty()) {
        return Err(DispatchError::config(format!("blank URL at position {}", pos + 1)));
    }
    if prefix_len >= ceiling {
        return Err(DispatchError::config(format!(
            "fixed arguments are {} characters long, which leaves no room under the {}-character command limit",
            prefix_len, ceiling
        )));
    }

    let mut batches: Vec<UrlBatch> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = prefix_len;

    for url in urls {
        let cost = 1 + arg_len(url);

        if prefix_len + cost > ceiling {
            if !current.is_empty() {
                close(&mut batches, std::mem::take(&mut current), current_len, false);
                current_len = prefix_len;
            }
            close(&mut batches, vec![url.clone()], prefix_len + cost, true);
            continue;
        }

        if !current.is_empty() && current_len + cost > ceiling {
            close(&mut batches, std::mem::take(&mut current), current_len, false);
            current_len = prefix_len;
        }
        current.push(url.clone());
        current_len += cost;
    }

    if !current.is_empty() {
        close(&mut batches, current, current_len, false);
    }

    Ok(batches)
}

fn close(batches: &mut Vec<UrlBatch>, urls: Vec<String>, command_len: usize, oversize: bool) {
    batches.push(UrlBatch {
        index: batches.len(),
        urls,
        command_len,
        oversize,
    });
}
