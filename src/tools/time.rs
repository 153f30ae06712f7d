//! Clock tool.
//!
//! Reports the current time as ISO-8601 text in a requested IANA timezone, so
//! the model can answer "what time is it in Tokyo" without guessing.

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;

use super::{optional_string_argument, parse_object_arguments, Tool};
use crate::error::ToolError;
use crate::types::{FunctionDefinition, ToolDefinition};

/// File in the working directory whose first nonblank line can pin the year.
pub const YEAR_OVERRIDE_FILE: &str = "get_current_time.year";

/// Tool returning the current time for an optional timezone.
pub struct CurrentTimeTool {
    year_override_path: PathBuf,
}

impl CurrentTimeTool {
    /// Read the year override from `path` instead of the working directory.
    pub fn with_year_override_path(path: impl Into<PathBuf>) -> Self {
        Self {
            year_override_path: path.into(),
        }
    }

    fn year_override(&self) -> Result<Option<String>, ToolError> {
        let text = match std::fs::read_to_string(&self.year_override_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ToolError::ExecutionFailed(format!(
                    "failed to read {}: {e}",
                    self.year_override_path.display()
                )))
            }
        };
        Ok(parse_year_override(&text))
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::with_year_override_path(YEAR_OVERRIDE_FILE)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct TimeReport {
    current_time: String,
    timezone: String,
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &'static str {
        "get_current_time"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".into(),
            function: FunctionDefinition {
                name: self.name().into(),
                description: "Get the current date and time. Optionally pass an IANA timezone name such as 'Europe/Paris' or 'UTC'; the local timezone is used otherwise."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "timezone": {
                            "type": "string",
                            "description": "IANA timezone name, e.g. 'America/New_York'."
                        }
                    },
                    "additionalProperties": false
                }),
            },
        }
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args = parse_object_arguments(arguments)?;
        let timezone = optional_string_argument(&args, "timezone")?;

        let now = Utc::now();
        let mut report = match timezone.as_deref().map(str::trim) {
            None | Some("") => report_at(now.with_timezone(&Local)),
            Some(name) if name.eq_ignore_ascii_case("utc") => TimeReport {
                current_time: now.to_rfc3339_opts(SecondsFormat::Micros, false),
                timezone: "UTC".into(),
            },
            Some(name) => {
                let tz: Tz = name
                    .parse()
                    .map_err(|_| ToolError::ExecutionFailed(format!("Unknown timezone: {name}")))?;
                report_at(now.with_timezone(&tz))
            }
        };

        if let Some(year) = self.year_override()? {
            report.current_time = apply_year(&report.current_time, &year);
        }

        serde_json::to_string(&report)
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to serialize time: {e}")))
    }
}

fn report_at<T>(at: DateTime<T>) -> TimeReport
where
    T: TimeZone,
    T::Offset: Display,
{
    TimeReport {
        current_time: at.to_rfc3339_opts(SecondsFormat::Micros, false),
        timezone: at.format("%Z").to_string(),
    }
}

/// First nonblank line, if it is exactly four ASCII digits.
fn parse_year_override(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    (line.len() == 4 && line.bytes().all(|b| b.is_ascii_digit())).then(|| line.to_string())
}

fn apply_year(iso: &str, year: &str) -> String {
    match iso.get(..4) {
        Some(head) if head.bytes().all(|b| b.is_ascii_digit()) => format!("{year}{}", &iso[4..]),
        _ => iso.to_string(),
    }
}
