//! Configuration loading from TOML files and environment variables.
//!
//! Values are resolved in this order of precedence (highest wins):
//! 1. Environment variables (`CHAT_CLI_API_URL`, `CHAT_CLI_API_KEY`,
//!    `CHAT_CLI_MODEL`).
//! 2. The config file: `--config <path>`, else
//!    `$XDG_CONFIG_HOME/chat-cli/config.toml` (or `~/.config/chat-cli/`),
//!    else `./.chat-cli/config.toml`. A missing file is created from the
//!    embedded template.
//! 3. The embedded template's values.

use crate::agent::transport::DEFAULT_MAX_TOOL_ROUNDS;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

mod defaults;
mod env;
mod init;
mod types;

use defaults::{COMPLETIONS_PATH, DEFAULT_CONFIG_TEMPLATE, DEFAULT_REQUEST_TIMEOUT_SECS};
use init::config_root_dir;
use types::FileConfig;
pub use types::{ApiConfig, Config, LoadedConfig};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Locate (or create) the config file, then load it with env overrides.
pub fn load_config(path_override: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&Path>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let path = init::locate_config_file(path_override, config_root)?;
    let text = read_file(&path).map_err(|e| {
        ConfigError::Invalid(format!("failed to read config file {}: {e}", path.display()))
    })?;
    let config = parse_config(&text, &env_lookup)?;
    tracing::debug!(path = %path.display(), model = %config.api.model, "loaded config");
    Ok(LoadedConfig { config, path })
}

/// Parse config text layered over the template, then apply env overrides.
pub fn parse_config<FEnv>(text: &str, env_lookup: &FEnv) -> Result<Config, ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let parsed: FileConfig = toml::from_str(text)?;
    let template: FileConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
    let mut merged = parsed.or(template);
    env::apply_env_overrides(&mut merged, env_lookup);
    resolve_config(merged)
}

fn resolve_config(file: FileConfig) -> Result<Config, ConfigError> {
    let api_url = required(file.api_url, "api_url")?;
    let model = required(file.model, "model")?;
    let temperature = file.temperature.unwrap_or_default();
    if !temperature.is_finite() {
        return Err(ConfigError::Invalid("temperature must be a number".into()));
    }
    let request_timeout_secs = file
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if request_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "request_timeout_secs must be at least 1".into(),
        ));
    }

    Ok(Config {
        api: ApiConfig {
            base_url: compute_base_url(&api_url)?,
            api_key: file.api_key.unwrap_or_default().trim().to_string(),
            model,
            temperature,
        },
        api_url,
        system_prompt: file.system_prompt.filter(|p| !p.trim().is_empty()),
        request_timeout_secs,
        max_tool_rounds: file.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
    })
}

fn required(value: Option<String>, key: &str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Invalid(format!("{key} must not be empty")))
}

/// Derive the API root from a configured URL.
///
/// The URL must carry a scheme and a host. A trailing `/chat/completions`
/// (and any trailing slash) is removed; query and fragment are dropped.
pub fn compute_base_url(api_url: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::Invalid("api_url must include scheme and host".into());
    let url = reqwest::Url::parse(api_url.trim()).map_err(|_| invalid())?;
    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;

    let mut base = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        base.push_str(&format!(":{port}"));
    }
    let path = url.path().trim_end_matches('/');
    base.push_str(path.strip_suffix(COMPLETIONS_PATH).unwrap_or(path));
    Ok(base)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
