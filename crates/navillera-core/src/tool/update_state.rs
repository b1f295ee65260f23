//! Persist the last update-check time (JSON under XDG state dir) so the
//! check is throttled across runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateState {
    /// Unix seconds of the last check against the release feed (0 = never).
    #[serde(default)]
    pub last_check_unix: u64,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl UpdateState {
    /// Default path: `~/.local/state/navillera/update_state.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("navillera")?;
        Ok(xdg_dirs
            .get_state_home()
            .join("navillera")
            .join("update_state.json"))
    }

    /// A check is due when at least `interval_secs` passed since the last one.
    pub fn is_due(&self, now_unix: u64, interval_secs: u64) -> bool {
        now_unix.saturating_sub(self.last_check_unix) >= interval_secs
    }

    pub fn mark_checked(&mut self, now_unix: u64) {
        self.last_check_unix = now_unix;
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize update state")?;
        std::fs::write(path, json)
            .with_context(|| format!("write update state: {}", path.display()))?;
        Ok(())
    }

    /// Missing file means "never checked"; a corrupt file is an error.
    pub fn load_from_path(path: &Path) -> Result<Option<UpdateState>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read update state: {}", path.display()))
            }
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse update state: {}", path.display()))?;
        Ok(Some(state))
    }
}
