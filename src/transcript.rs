//! Debug transcript dump written when the chat ends.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ExportError;
use crate::message::Message;
use crate::types::ApiMessage;

/// Default artifact name, relative to the working directory.
pub const TRANSCRIPT_FILE: &str = "last_log.json";

#[derive(Serialize)]
struct Transcript {
    saved_at: String,
    messages: Vec<ApiMessage>,
}

/// Serialize `messages` to `path`, replacing any previous transcript.
pub fn export(path: &Path, messages: &[Message]) -> Result<(), ExportError> {
    let transcript = Transcript {
        saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        messages: messages.iter().map(Message::to_api).collect(),
    };
    let json = serde_json::to_string_pretty(&transcript)?;
    fs::write(path, json)?;
    Ok(())
}

/// [`export`], with failures logged at debug level and otherwise ignored.
pub fn export_best_effort(path: &Path, messages: &[Message]) {
    match export(path, messages) {
        Ok(()) => tracing::debug!(path = %path.display(), count = messages.len(), "transcript saved"),
        Err(e) => tracing::debug!(path = %path.display(), error = %e, "transcript not saved"),
    }
}
