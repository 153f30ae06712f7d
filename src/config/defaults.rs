//! Default configuration constants.

/// Embedded default `config.toml` written when no config file exists.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");
/// Directory under the config root holding `config.toml`.
pub(super) const CONFIG_DIR_NAME: &str = "chat-cli";
pub(super) const CONFIG_FILE_NAME: &str = "config.toml";
/// Working-directory fallback used when the global location is unusable.
pub(super) const LOCAL_FALLBACK_DIR: &str = ".chat-cli";
/// Default timeout for model API requests.
pub(super) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Suffix stripped from `api_url` to form the API base URL.
pub(super) const COMPLETIONS_PATH: &str = "/chat/completions";
