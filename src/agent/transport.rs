//! Model transport seam between the orchestrator and the network.
//!
//! A [`ModelTransport`] runs one whole turn: it reports stream frames and tool
//! activity through a callback and records tool calls into the turn's
//! recorder. The orchestrator never sees requests, rounds or wire ids.

use async_trait::async_trait;

use super::reconcile::{FramingMode, StreamEvent};
use super::recorder::ToolCallRecorder;
use crate::api::ModelClient;
use crate::error::TurnError;
use crate::message::{Message, ToolInvocation};
use crate::tools::ToolRegistry;
use crate::types::{ApiMessage, ChatRequest, Role};

/// Default cap on model rounds that may request tools within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Something observed while a turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Model output for the stream reconciler.
    Frame(StreamEvent),
    /// A tool is about to run.
    ToolCall { name: String, arguments: String },
    /// A tool finished successfully.
    ToolResult { name: String, result: String },
}

/// Produces one model turn from the current history.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// How [`TurnEvent::Frame`] text relates to earlier frames.
    fn framing(&self) -> FramingMode {
        FramingMode::Inferred
    }

    /// Run the turn to completion.
    ///
    /// Tool executions must be recorded in `recorder`; the orchestrator drains
    /// it into the session after a successful turn.
    async fn run(
        &self,
        history: &[Message],
        recorder: &ToolCallRecorder,
        events: &mut (dyn FnMut(TurnEvent) + Send),
    ) -> Result<(), TurnError>;
}

/// HTTP transport: streams chat completions and executes requested tools
/// until the model answers without tool calls.
///
/// Frames carry the turn's cumulative text. Each round ends with a frame
/// holding that round's tool-call list, so the final frame of a successful
/// turn always reports an empty list.
pub struct ToolLoopTransport {
    client: Box<dyn ModelClient>,
    tools: ToolRegistry,
    model: String,
    temperature: f64,
    system_prompt: Option<String>,
    max_tool_rounds: usize,
}

impl ToolLoopTransport {
    pub fn new(
        client: Box<dyn ModelClient>,
        tools: ToolRegistry,
        model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            client,
            tools,
            model: model.into(),
            temperature,
            system_prompt: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Prepend a system message to every request. Not stored in the session.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    fn request(&self, messages: &[ApiMessage]) -> ChatRequest {
        let definitions = self.tools.definitions();
        let has_tools = !definitions.is_empty();
        ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: has_tools.then_some(definitions),
            tool_choice: has_tools.then(|| "auto".to_string()),
            temperature: Some(self.temperature),
            stream: true,
        }
    }
}

#[async_trait]
impl ModelTransport for ToolLoopTransport {
    fn framing(&self) -> FramingMode {
        FramingMode::Cumulative
    }

    async fn run(
        &self,
        history: &[Message],
        recorder: &ToolCallRecorder,
        events: &mut (dyn FnMut(TurnEvent) + Send),
    ) -> Result<(), TurnError> {
        // Request-local wire history; tool round trips here keep the model's
        // own call ids, the session gets the recorder's.
        let mut messages: Vec<ApiMessage> = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ApiMessage::text(Role::System, prompt.as_str()));
        }
        messages.extend(history.iter().map(Message::to_api));

        let mut turn_text = String::new();
        for round in 0..=self.max_tool_rounds {
            let request = self.request(&messages);
            let round_start = turn_text.len();
            let reply = {
                let turn_text = &mut turn_text;
                let events = &mut *events;
                let mut on_text = |fragment: &str| {
                    if turn_text.len() == round_start && round_start > 0 {
                        turn_text.push('\n');
                    }
                    turn_text.push_str(fragment);
                    events(TurnEvent::Frame(StreamEvent::text(turn_text.clone())));
                };
                self.client.stream_chat(&request, &mut on_text).await?
            };

            let invocations: Vec<ToolInvocation> = reply
                .tool_calls
                .iter()
                .cloned()
                .map(ToolInvocation::from)
                .collect();
            events(TurnEvent::Frame(StreamEvent::with_tool_calls(
                turn_text.clone(),
                invocations,
            )));
            if reply.tool_calls.is_empty() {
                tracing::debug!(round, "model turn finished");
                return Ok(());
            }
            if round == self.max_tool_rounds {
                break;
            }

            tracing::debug!(round, calls = reply.tool_calls.len(), "executing tool calls");
            messages.push(ApiMessage::assistant_tool_calls(
                &reply.content,
                reply.tool_calls.clone(),
            ));
            for call in &reply.tool_calls {
                let name = call.function.name.clone();
                let arguments = call.function.arguments.clone();
                events(TurnEvent::ToolCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                });
                let result = self
                    .tools
                    .execute_recorded(recorder, &name, &arguments)
                    .await?;
                events(TurnEvent::ToolResult {
                    name: name.clone(),
                    result: result.clone(),
                });
                messages.push(ApiMessage::tool_result(&call.id, name, result));
            }
        }
        Err(TurnError::MaxToolRounds(self.max_tool_rounds))
    }
}
