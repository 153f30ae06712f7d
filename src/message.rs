//! Conversation messages as the orchestrator sees them.
//!
//! [`Message`] is a closed sum type; the wire shape ([`ApiMessage`]) is only
//! produced at the serialization boundary via [`Message::to_api`].

use crate::types::{ApiMessage, Role, ToolCall};

/// A tool invocation issued by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Correlation id; the matching tool result carries the same value.
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments object, as produced by the model.
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn to_api(&self) -> ToolCall {
        ToolCall::function(&self.id, &self.name, &self.arguments)
    }
}

impl From<ToolCall> for ToolInvocation {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        tool_invocations: Vec<ToolInvocation>,
    },
    ToolResult {
        tool_call_id: String,
        name: String,
        /// JSON-encoded tool output.
        result: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Plain assistant text with no tool invocations.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_invocations: Vec::new(),
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            result: result.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult { .. } => Role::Tool,
        }
    }

    /// Text content; the result payload for tool results.
    pub fn text(&self) -> &str {
        match self {
            Self::System { content } | Self::User { content } => content,
            Self::Assistant { content, .. } => content,
            Self::ToolResult { result, .. } => result,
        }
    }

    /// Invocations carried by an assistant message; empty for other roles.
    pub fn tool_invocations(&self) -> &[ToolInvocation] {
        match self {
            Self::Assistant {
                tool_invocations, ..
            } => tool_invocations,
            Self::System { .. } | Self::User { .. } | Self::ToolResult { .. } => &[],
        }
    }

    /// True for an assistant message that only carries tool invocations.
    ///
    /// Such a message is never committed on its own: its calls already reach
    /// the history through the recorder.
    pub fn is_tool_only(&self) -> bool {
        match self {
            Self::Assistant {
                content,
                tool_invocations,
            } => content.is_empty() && !tool_invocations.is_empty(),
            Self::System { .. } | Self::User { .. } | Self::ToolResult { .. } => false,
        }
    }

    /// Convert into the wire message sent to the model and dumped to disk.
    pub fn to_api(&self) -> ApiMessage {
        match self {
            Self::System { content } => ApiMessage::text(Role::System, content.as_str()),
            Self::User { content } => ApiMessage::text(Role::User, content.as_str()),
            Self::Assistant {
                content,
                tool_invocations,
            } => {
                if tool_invocations.is_empty() {
                    ApiMessage::text(Role::Assistant, content.as_str())
                } else {
                    ApiMessage::assistant_tool_calls(
                        content,
                        tool_invocations.iter().map(ToolInvocation::to_api).collect(),
                    )
                }
            }
            Self::ToolResult {
                tool_call_id,
                name,
                result,
            } => ApiMessage::tool_result(tool_call_id, name, result),
        }
    }
}
