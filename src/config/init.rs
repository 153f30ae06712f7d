//! Config-path discovery and default config creation.
//!
//! Writes use race-safe create semantics so a concurrent first launch never
//! clobbers a file another process just wrote.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE, LOCAL_FALLBACK_DIR,
};

/// Per-user config path (`<root>/chat-cli/config.toml`).
fn global_config_path(root: Option<PathBuf>) -> Option<PathBuf> {
    root.map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Working-directory fallback (`./.chat-cli/config.toml`).
fn local_fallback_config_path() -> PathBuf {
    Path::new(LOCAL_FALLBACK_DIR).join(CONFIG_FILE_NAME)
}

/// Pick the config file to use, creating it from the template if missing.
///
/// An explicit path is the only candidate. Otherwise the global path is tried
/// first and the working-directory fallback second.
pub(super) fn locate_config_file<FRoot>(
    path_override: Option<&Path>,
    config_root: FRoot,
) -> Result<PathBuf, ConfigError>
where
    FRoot: Fn() -> Option<PathBuf>,
{
    let candidates: Vec<PathBuf> = match path_override {
        Some(path) => vec![path.to_path_buf()],
        None => global_config_path(config_root())
            .into_iter()
            .chain(std::iter::once(local_fallback_config_path()))
            .collect(),
    };

    let mut last_error = None;
    for candidate in &candidates {
        match ensure_config_file(candidate) {
            Ok(()) => return Ok(candidate.clone()),
            Err(e) => {
                tracing::debug!(path = %candidate.display(), error = %e, "config location unusable");
                last_error = Some(e);
            }
        }
    }

    let target = candidates
        .first()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    Err(ConfigError::Invalid(match last_error {
        Some(e) => format!("failed to create config file at {target}: {e}"),
        None => "failed to locate or create configuration file".to_string(),
    }))
}

/// Ensure `path` exists, writing the default template when it does not.
pub(super) fn ensure_config_file(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    // create_new avoids clobbering an existing file if another process won the race.
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
            tracing::debug!(path = %path.display(), "wrote default config");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

/// Resolve the base config directory from env/home conventions.
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}
