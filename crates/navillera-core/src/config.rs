use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::DEFAULT_MAX_COMMAND_LEN;
use crate::dispatch::DispatchSettings;
use crate::options::{default_output_directory, DownloadOptions, MediaFilter, UserAgent};

/// Persisted defaults for the download form (the `[defaults]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefaults {
    /// `browser` or a literal User-Agent string.
    #[serde(default)]
    pub user_agent: UserAgent,
    #[serde(default)]
    pub cookies: Option<PathBuf>,
    #[serde(default)]
    pub filter: MediaFilter,
    pub retries: u32,
    pub http_timeout_secs: f64,
    pub sleep_secs: f64,
    /// None = `~/Downloads/gallery-dl`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            user_agent: UserAgent::Browser,
            cookies: None,
            filter: MediaFilter::Both,
            retries: 3,
            http_timeout_secs: 30.0,
            sleep_secs: 1.0,
            output_dir: None,
        }
    }
}

impl FormDefaults {
    pub fn to_options(&self) -> DownloadOptions {
        DownloadOptions {
            user_agent: self.user_agent.clone(),
            cookies_path: self.cookies.clone(),
            media_filter: self.filter,
            retries: self.retries,
            http_timeout_secs: self.http_timeout_secs,
            sleep_secs: self.sleep_secs,
            output_directory: self
                .output_dir
                .clone()
                .unwrap_or_else(default_output_directory),
        }
    }

    /// Inverse of `to_options`, used to remember the last run's choices.
    pub fn from_options(opts: &DownloadOptions) -> Self {
        Self {
            user_agent: opts.user_agent.clone(),
            cookies: opts.cookies_path.clone(),
            filter: opts.media_filter,
            retries: opts.retries,
            http_timeout_secs: opts.http_timeout_secs,
            sleep_secs: opts.sleep_secs,
            output_dir: Some(opts.output_directory.clone()),
        }
    }
}

/// Global configuration loaded from `~/.config/navillera/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavilleraConfig {
    /// Command-line length ceiling used to split URL lists into batches.
    pub max_command_len: usize,
    /// Batches run at once; 1 = strictly sequential.
    pub jobs: usize,
    /// Grace period between terminate and kill when a run is cancelled.
    pub kill_grace_ms: u64,
    /// Minimum time between automatic update checks.
    pub update_check_interval_secs: u64,
    /// Tool executable; if missing, the managed copy under the XDG data dir is used.
    #[serde(default)]
    pub tool_path: Option<PathBuf>,
    #[serde(default)]
    pub defaults: FormDefaults,
}

impl Default for NavilleraConfig {
    fn default() -> Self {
        Self {
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
            jobs: 1,
            kill_grace_ms: 1500,
            update_check_interval_secs: 6 * 3600,
            tool_path: None,
            defaults: FormDefaults::default(),
        }
    }
}

impl NavilleraConfig {
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            max_command_len: self.max_command_len,
            jobs: self.jobs.max(1),
            kill_grace: Duration::from_millis(self.kill_grace_ms),
        }
    }

    pub fn tool_path(&self) -> Result<PathBuf> {
        match &self.tool_path {
            Some(p) => Ok(p.clone()),
            None => crate::tool::default_tool_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("navillera")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<NavilleraConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<NavilleraConfig> {
    if !path.exists() {
        let default_cfg = NavilleraConfig::default();
        save_at(&default_cfg, path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: NavilleraConfig = toml::from_str(&data)?;
    Ok(cfg)
}

pub fn to_toml_string(cfg: &NavilleraConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

pub fn save(cfg: &NavilleraConfig) -> Result<()> {
    save_at(cfg, &config_path()?)
}

pub fn save_at(cfg: &NavilleraConfig, path: &Path) -> Result<()> {
    let toml = to_toml_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = NavilleraConfig::default();
        assert_eq!(cfg.max_command_len, 30_000);
        assert_eq!(cfg.jobs, 1);
        assert_eq!(cfg.kill_grace_ms, 1500);
        assert_eq!(cfg.update_check_interval_secs, 21_600);
        assert_eq!(cfg.defaults.retries, 3);
        assert_eq!(cfg.defaults.user_agent, UserAgent::Browser);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = NavilleraConfig::default();
        cfg.defaults.user_agent = UserAgent::Custom("Mozilla/5.0 (X11; Linux)".into());
        cfg.defaults.filter = MediaFilter::Videos;
        cfg.tool_path = Some(PathBuf::from("/opt/gallery-dl"));
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: NavilleraConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_command_len = 8000
            jobs = 3
            kill_grace_ms = 250
            update_check_interval_secs = 60

            [defaults]
            user_agent = "browser"
            cookies = "/home/me/cookies.txt"
            filter = "images"
            retries = 0
            http_timeout_secs = 12.5
            sleep_secs = 0
        "#;
        let cfg: NavilleraConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_command_len, 8000);
        assert_eq!(cfg.jobs, 3);
        assert!(cfg.tool_path.is_none());
        let opts = cfg.defaults.to_options();
        assert_eq!(opts.media_filter, MediaFilter::Images);
        assert_eq!(opts.cookies_path, Some(PathBuf::from("/home/me/cookies.txt")));
        assert_eq!(opts.retries, 0);
        assert!((opts.http_timeout_secs - 12.5).abs() < 1e-9);
        assert!(opts.output_directory.ends_with("gallery-dl"));

        let settings = cfg.dispatch_settings();
        assert_eq!(settings.max_command_len, 8000);
        assert_eq!(settings.kill_grace, Duration::from_millis(250));
    }

    #[test]
    fn defaults_table_is_optional() {
        let toml = r#"
            max_command_len = 30000
            jobs = 0
            kill_grace_ms = 1500
            update_check_interval_secs = 21600
        "#;
        let cfg: NavilleraConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.defaults, FormDefaults::default());
        assert_eq!(cfg.dispatch_settings().jobs, 1);
    }

    #[test]
    fn load_or_init_creates_file_then_reads_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navillera").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        let mut changed = created.clone();
        changed.jobs = 4;
        save_at(&changed, &path).unwrap();
        assert_eq!(load_or_init_at(&path).unwrap().jobs, 4);
    }

    #[test]
    fn options_roundtrip_through_defaults() {
        let mut opts = DownloadOptions::with_output_directory("/srv/media");
        opts.user_agent = UserAgent::Custom("ua".into());
        opts.sleep_secs = 2.5;
        let back = FormDefaults::from_options(&opts).to_options();
        assert_eq!(back, opts);
    }
}
