//! `navillera fetch` – install or update the gallery-dl executable.

use anyhow::Result;
use navillera_core::config::NavilleraConfig;
use navillera_core::tool::{self, FetchOutcome, UpdateState, RELEASES_API_URL};

pub async fn run_fetch(cfg: &NavilleraConfig, force: bool, from: Vec<String>) -> Result<()> {
    let tool_path = cfg.tool_path()?;
    let asset_urls = if from.is_empty() {
        tool::asset_urls_for(std::env::consts::OS)
            .iter()
            .map(|u| u.to_string())
            .collect()
    } else {
        from
    };

    let outcome = tool::fetch_or_update(&tool_path, &asset_urls, RELEASES_API_URL, force).await?;
    match outcome {
        FetchOutcome::AlreadyCurrent { version } => {
            println!("gallery-dl {} is already the latest release.", version);
        }
        FetchOutcome::Installed {
            path,
            source_url,
            version,
        } => {
            tracing::info!(path = %path.display(), %source_url, "tool installed");
            let version = version.unwrap_or_else(|| "(unknown version)".to_string());
            println!("Installed gallery-dl {} to {}", version, path.display());
            if cfg!(target_os = "macos") {
                println!(
                    "If macOS blocks it, run: xattr -d com.apple.quarantine {}",
                    path.display()
                );
            }
        }
    }

    record_update_check();
    Ok(())
}

/// A successful fetch counts as an update check for the throttle.
fn record_update_check() {
    let Ok(path) = UpdateState::default_path() else {
        return;
    };
    let mut state = UpdateState::load_from_path(&path)
        .ok()
        .flatten()
        .unwrap_or_default();
    state.mark_checked(tool::unix_now());
    if state.save_to_path(&path).is_err() {
        tracing::warn!("could not save update state to {}", path.display());
    }
}
