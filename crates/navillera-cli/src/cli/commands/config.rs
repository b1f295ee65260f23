//! `navillera config` – show the config, tool and log locations and what the config says.

use anyhow::Result;
use navillera_core::config::{self, NavilleraConfig};
use navillera_core::logging;

pub fn run_config(cfg: &NavilleraConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", config::to_toml_string(cfg)?);
    println!("# tool: {}", cfg.tool_path()?.display());
    println!("# log: {}", logging::log_file_path()?.display());
    Ok(())
}
