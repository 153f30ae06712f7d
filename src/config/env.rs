//! Environment variable overrides.

use super::types::FileConfig;

pub(super) const ENV_API_URL: &str = "CHAT_CLI_API_URL";
pub(super) const ENV_API_KEY: &str = "CHAT_CLI_API_KEY";
pub(super) const ENV_MODEL: &str = "CHAT_CLI_MODEL";

/// Overwrite file values with non-blank `CHAT_CLI_*` variables.
pub(super) fn apply_env_overrides<FEnv>(file: &mut FileConfig, env_lookup: &FEnv)
where
    FEnv: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env_lookup(name).filter(|value| !value.trim().is_empty());
    if let Some(url) = lookup(ENV_API_URL) {
        file.api_url = Some(url);
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        file.api_key = Some(key);
    }
    if let Some(model) = lookup(ENV_MODEL) {
        file.model = Some(model);
    }
}
