/// `load_config` module: loads the optional YAML settings file, applies environment overrides
/// and produces the typed configuration the CLI hands to the core pipeline.
///
/// This is the only place untrusted YAML is parsed.
///
/// # Sources, lowest precedence first
/// 1. Built-in defaults (`https://api.pagedrop.dev`, 4 transfers, 1s poll interval, 60s timeout)
/// 2. The YAML file: `--config <path>` when given, else `<config_dir>/pagedrop/config.yaml`
/// 3. `PAGEDROP_API_URL` / `PAGEDROP_TOKEN` in the environment (a `.env` file is loaded first)
///
/// A missing default file is fine; a missing explicit `--config` file is an error.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Context, Result};
use pagedrop_core::config::PublishConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_API_URL: &str = "https://api.pagedrop.dev";
pub const API_URL_ENV: &str = "PAGEDROP_API_URL";
pub const TOKEN_ENV: &str = "PAGEDROP_TOKEN";

/// YAML-side shape of the settings file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub upload_concurrency: Option<usize>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the remote API, without a trailing slash.
    pub api_url: String,
    pub token: Option<String>,
    pub publish: PublishConfig,
}

/// `<config_dir>/pagedrop/config.yaml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pagedrop").join("config.yaml"))
}

/// Load settings from `explicit` (must exist) or the default location (may be absent), then
/// apply environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let file = match explicit {
        Some(path) => read_config_file(path)?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read_config_file(&path)?,
            _ => {
                info!("No config file found, using defaults");
                FileConfig::default()
            }
        },
    };
    let config = resolve(file, |key| std::env::var(key).ok())?;
    config.publish.trace_loaded();
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {}: {e}", path.display())
    })?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            e
        })
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Merge file settings with environment lookups. `env` returns the value of a variable.
pub fn resolve<F>(file: FileConfig, env: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let api_url = non_empty(env(API_URL_ENV))
        .or(non_empty(file.api_url))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = api_url.trim().trim_end_matches('/').to_string();
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        bail!("api_url must be an http(s) URL, got {api_url:?}");
    }

    let token = non_empty(env(TOKEN_ENV)).or(non_empty(file.token));

    let defaults = PublishConfig::default();
    let upload_concurrency = file
        .upload_concurrency
        .unwrap_or(defaults.upload_concurrency);
    if upload_concurrency == 0 {
        bail!("upload_concurrency must be at least 1");
    }
    if file.poll_interval_secs == Some(0) {
        bail!("poll_interval_secs must be at least 1");
    }
    let poll_interval = file
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(defaults.poll_interval);
    let poll_timeout = file
        .poll_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(defaults.poll_timeout);

    Ok(AppConfig {
        api_url,
        token,
        publish: PublishConfig {
            upload_concurrency,
            poll_interval,
            poll_timeout,
        },
    })
}
