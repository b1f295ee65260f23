//! `navillera version` – installed vs latest gallery-dl.

use anyhow::Result;
use navillera_core::config::NavilleraConfig;
use navillera_core::tool::{self, RELEASES_API_URL};

pub async fn run_version(cfg: &NavilleraConfig) -> Result<()> {
    let tool_path = cfg.tool_path()?;
    let status = tool::version_status(&tool_path, RELEASES_API_URL).await;

    println!("navillera {}", env!("CARGO_PKG_VERSION"));
    match &status.local {
        Some(v) => println!("gallery-dl {} ({})", v, tool_path.display()),
        None if tool_path.is_file() => {
            println!("gallery-dl: unknown version ({})", tool_path.display())
        }
        None => println!("gallery-dl: not installed (run `navillera fetch`)"),
    }
    match &status.latest {
        Some(v) => println!("latest release: {}", v),
        None => println!("latest release: unknown (offline?)"),
    }
    if status.update_available() {
        println!("An update is available: run `navillera fetch`.");
    }
    Ok(())
}
