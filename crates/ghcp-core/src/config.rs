//! Configuration resolution for ghcp.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/ghcp-demo/settings.json`)
//! 3. Project config (`.ghcp-demo/settings.json`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binaries, highest priority)
//!
//! Files may be partial: each layer is deep-merged into the one below it,
//! so a project file that only sets `upstream.default_model` keeps every
//! other value from the global file and the defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Model used when neither the request nor the config names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Default OpenAI-compatible inference endpoint.
pub const DEFAULT_BASE_URL: &str = "https://models.github.ai/inference";

/// Complete ghcp configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: "info".to_string(),
        }
    }
}

/// Chat-completion upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Bearer token. Never written back out.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub default_model: String,
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            default_model: DEFAULT_MODEL.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        layers.push(load_config_file(&global_path)?);
    }

    if let Some(dir) = project_dir {
        let project_path = project_config_path(dir);
        if project_path.exists() {
            layers.push(load_config_file(&project_path)?);
        }
    }

    let mut config = resolve_layers(layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ghcp-demo").join("settings.json"))
}

/// Project-local config file path under `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".ghcp-demo").join("settings.json")
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Merge JSON layers (lowest priority first) over the defaults.
fn resolve_layers(layers: Vec<Value>) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for layer in layers {
        merge_value(&mut merged, layer);
    }
    serde_json::from_value(merged).map_err(|e| Error::Config(format!("Invalid config: {e}")))
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// `GHCP_API_TOKEN` wins over `GITHUB_TOKEN`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = lookup("COPILOT_MODEL").filter(|v| !v.is_empty()) {
        config.upstream.default_model = model;
    }
    if let Some(url) = lookup("GHCP_BASE_URL").filter(|v| !v.is_empty()) {
        config.upstream.base_url = url;
    }
    if let Some(token) = lookup("GHCP_API_TOKEN")
        .or_else(|| lookup("GITHUB_TOKEN"))
        .filter(|v| !v.is_empty())
    {
        config.upstream.token = Some(token);
    }
    if let Some(addr) = lookup("GHCP_ADDR").and_then(|v| v.parse().ok()) {
        config.server.addr = addr;
    }
    if let Some(level) = lookup("GHCP_LOG_LEVEL") {
        config.server.log_level = level;
    }
}
