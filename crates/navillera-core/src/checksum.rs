//! SHA-256 of fetched tool binaries.
//!
//! Release assets are hashed after the download completes, never inline with
//! the transfer.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 1024 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Checks `path` against an expected hex digest (case-insensitive).
/// On mismatch the error carries the first 12 hex chars of the actual digest.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let got = sha256_path(path)?;
    if !got.eq_ignore_ascii_case(expected.trim()) {
        anyhow::bail!("checksum mismatch (got {}...)", &got[..12]);
    }
    Ok(())
}
