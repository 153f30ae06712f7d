//! Configuration data model.
//!
//! `FileConfig` mirrors the TOML file with every key optional; the loader
//! layers it over the embedded template and resolves it into [`Config`].

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Effective runtime configuration. Immutable after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    /// `api_url` exactly as configured, for display.
    pub api_url: String,
    /// System message prepended to every request.
    pub system_prompt: Option<String>,
    pub request_timeout_secs: u64,
    pub max_tool_rounds: usize,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Resolved API connection settings used by the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// API root without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
}

/// Effective config plus the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// On-disk TOML shape. Integer temperatures deserialize as floats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_tool_rounds: Option<usize>,
}

impl FileConfig {
    /// Keys set in `self` win; unset keys come from `defaults`.
    pub fn or(self, defaults: FileConfig) -> FileConfig {
        FileConfig {
            api_url: self.api_url.or(defaults.api_url),
            api_key: self.api_key.or(defaults.api_key),
            model: self.model.or(defaults.model),
            temperature: self.temperature.or(defaults.temperature),
            system_prompt: self.system_prompt.or(defaults.system_prompt),
            request_timeout_secs: self.request_timeout_secs.or(defaults.request_timeout_secs),
            max_tool_rounds: self.max_tool_rounds.or(defaults.max_tool_rounds),
        }
    }
}
