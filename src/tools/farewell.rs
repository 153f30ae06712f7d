//! `register_farewell`: lets the model end the chat after its reply.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{optional_string_argument, parse_object_arguments, Tool};
use crate::agent::FarewellSignal;
use crate::error::ToolError;
use crate::types::{FunctionDefinition, ToolDefinition};

/// Raises the shared [`FarewellSignal`]; the chat loop exits once the current
/// turn's reply has been shown.
pub struct RegisterFarewellTool {
    signal: FarewellSignal,
}

impl RegisterFarewellTool {
    pub fn new(signal: FarewellSignal) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl Tool for RegisterFarewellTool {
    fn name(&self) -> &'static str {
        "register_farewell"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".into(),
            function: FunctionDefinition {
                name: self.name().into(),
                description: "Call this when the user says goodbye or clearly wants to end the conversation. The chat closes after your reply."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "note": {
                            "type": "string",
                            "description": "Optional short note about why the chat is ending."
                        }
                    },
                    "additionalProperties": false
                }),
            },
        }
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args = parse_object_arguments(arguments)?;
        let note = optional_string_argument(&args, "note")?.filter(|n| !n.is_empty());

        self.signal.register(note.clone());

        let mut out = Map::new();
        out.insert("farewell_registered".into(), Value::Bool(true));
        if let Some(note) = note {
            out.insert("note".into(), Value::String(note));
        }
        Ok(Value::Object(out).to_string())
    }
}
