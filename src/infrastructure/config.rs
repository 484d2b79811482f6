use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_CONFIG_PATH: &str = "config/dashboard";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sites_path")]
    pub sites_path: String,
    #[serde(default = "default_tanks_path")]
    pub tanks_path: String,
    #[serde(default = "default_tanks_by_site_path")]
    pub tanks_by_site_path: String,
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// Optional change-detection endpoint; unset disables it.
    #[serde(default = "default_status_path")]
    pub status_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub use_status_endpoint: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistorySettings {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/api".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_sites_path() -> String {
    "/sites".to_string()
}
fn default_tanks_path() -> String {
    "/tanks".to_string()
}
fn default_tanks_by_site_path() -> String {
    "/tanks?site=${site}".to_string()
}
fn default_history_path() -> String {
    "/history?tankId=${tank}&limit=${limit}".to_string()
}
fn default_status_path() -> Option<String> {
    Some("/status".to_string())
}
fn default_interval_secs() -> u64 {
    30
}
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_history_limit() -> usize {
    20
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            sites_path: default_sites_path(),
            tanks_path: default_tanks_path(),
            tanks_by_site_path: default_tanks_by_site_path(),
            history_path: default_history_path(),
            status_path: default_status_path(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            use_status_endpoint: false,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = &self.backend.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            bail!("backend.base_url must be an http(s) URL, got '{}'", base);
        }
        if self.backend.timeout_secs == 0 {
            bail!("backend.timeout_secs must be greater than zero");
        }
        if !(5..=3600).contains(&self.refresh.interval_secs) {
            bail!(
                "refresh.interval_secs must be between 5 and 3600, got {}",
                self.refresh.interval_secs
            );
        }
        if self.history.limit == 0 {
            bail!("history.limit must be greater than zero");
        }
        Ok(())
    }
}

/// Load `config/dashboard.{toml,yaml,json}` if present, then `TANKS_*` env
/// overrides (`TANKS_REFRESH__INTERVAL_SECS=15`).
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let path = std::env::var("TANKS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_dashboard_config_from(&path)
}

pub fn load_dashboard_config_from(path: &str) -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("TANKS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path))?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Replace `${name}` placeholders in an endpoint path template
pub fn prepare_path(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
