//! Pluggable tool system.
//!
//! Tools are async trait objects that the model can invoke during a turn.
//! Each tool provides its own OpenAI function definition and an async execute
//! method. Execution that should land in the conversation history goes through
//! [`ToolRegistry::execute_recorded`], which brackets the call with recorder
//! events.

pub mod farewell;
pub mod time;

use crate::agent::recorder::ToolCallRecorder;
use crate::agent::FarewellSignal;
use crate::error::ToolError;
use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A tool that can be invoked by the AI model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name matching what the model will call.
    fn name(&self) -> &'static str;

    /// OpenAI-format tool definition for inclusion in API requests.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments string.
    /// Returns a JSON result to send back to the model.
    async fn execute(&self, arguments: &str) -> Result<String, ToolError>;
}

// ---------------------------------------------------------------------------
// Tool registry
// ---------------------------------------------------------------------------

/// Registry of available tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The built-in tool set: clock lookup and farewell registration.
    pub fn with_builtins(farewell: FarewellSignal) -> Self {
        let mut registry = Self::new();
        registry.register(time::CurrentTimeTool::default());
        registry.register(farewell::RegisterFarewellTool::new(farewell));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.push(Box::new(tool));
    }

    /// Get tool definitions for the API request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Find a tool by name and execute it.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }

    /// Execute a tool, recording the call before and the result after.
    ///
    /// A failing tool still records an `{"error": ...}` result so the call is
    /// never left dangling in the recorder; the error is then returned.
    pub async fn execute_recorded(
        &self,
        recorder: &ToolCallRecorder,
        name: &str,
        arguments: &str,
    ) -> Result<String, ToolError> {
        let call = recorder.record_call(name, arguments);
        match self.execute(name, arguments).await {
            Ok(result) => {
                recorder.record_result(Some(&call), name, &result);
                Ok(result)
            }
            Err(err) => {
                let payload = serde_json::json!({ "error": err.to_string() }).to_string();
                recorder.record_result(Some(&call), name, &payload);
                Err(err)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a tool arguments string into a JSON object.
///
/// Blank input counts as `{}`; models send it for parameterless calls.
pub(crate) fn parse_object_arguments(arguments: &str) -> Result<Map<String, Value>, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value = serde_json::from_str(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    match parsed {
        Value::Object(map) => Ok(map),
        _ => Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".into(),
        )),
    }
}

/// Read an optional string argument, rejecting non-string values.
pub(crate) fn optional_string_argument(
    arguments: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ToolError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a string if provided"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::recorder::ToolEventKind;
    use crate::types::FunctionDefinition;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                tool_type: "function".into(),
                function: FunctionDefinition {
                    name: "echo".into(),
                    description: "echoes arguments back".into(),
                    parameters: serde_json::json!({}),
                },
            }
        }
        async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
            Ok(arguments.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "fail"
        }
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                tool_type: "function".into(),
                function: FunctionDefinition {
                    name: "fail".into(),
                    description: "always fails".into(),
                    parameters: serde_json::json!({}),
                },
            }
        }
        async fn execute(&self, _arguments: &str) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("boom".into()))
        }
    }

    #[test]
    fn builtins_publish_both_tools() {
        let registry = ToolRegistry::with_builtins(FarewellSignal::new());
        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["get_current_time", "register_farewell"]);
    }

    #[tokio::test]
    async fn execute_unknown_tool_returns_error() {
        let r = ToolRegistry::new();
        let err = r.execute("nonexistent", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "nonexistent"));
    }

    #[tokio::test]
    async fn execute_recorded_brackets_call_and_result() {
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        let recorder = ToolCallRecorder::new();
        let out = r
            .execute_recorded(&recorder, "echo", r#"{"x":1}"#)
            .await
            .unwrap();
        assert_eq!(out, r#"{"x":1}"#);

        let events = recorder.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ToolEventKind::Call);
        assert_eq!(events[0].payload, r#"{"x":1}"#);
        assert_eq!(events[1].kind, ToolEventKind::Result);
        assert_eq!(events[0].correlation_id, events[1].correlation_id);
    }

    #[tokio::test]
    async fn execute_recorded_failure_records_error_result() {
        let mut r = ToolRegistry::new();
        r.register(FailingTool);
        let recorder = ToolCallRecorder::new();
        let err = r.execute_recorded(&recorder, "fail", "{}").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        let events = recorder.drain();
        assert_eq!(events.len(), 2);
        assert!(events[1].payload.contains("boom"));
    }

    #[test]
    fn parse_object_arguments_accepts_blank_and_rejects_arrays() {
        assert!(parse_object_arguments("  ").unwrap().is_empty());
        assert!(parse_object_arguments("[1]").is_err());
        assert!(parse_object_arguments("{bad").is_err());
    }

    #[test]
    fn optional_string_argument_rejects_numbers() {
        let args = parse_object_arguments(r#"{"note": 3}"#).unwrap();
        let err = optional_string_argument(&args, "note").unwrap_err();
        assert!(err.to_string().contains("'note' must be a string"));
    }
}
