//! `/chat/completions` protocol helpers.
//!
//! Sending is split from reading so the client can inspect a rejected
//! request before any output reaches the caller. Reading handles both an SSE
//! stream and a plain JSON body: some providers ignore `stream: true`, and
//! the non-streaming fallback always answers with JSON.

use std::collections::BTreeMap;
use std::time::Duration;

use super::sse::SseDecoder;
use super::AssistantReply;
use crate::error::ApiError;
use crate::types::{ChatChunk, ChatRequest, ChatResponse, ToolCall, ToolCallDelta};

/// Send one `/chat/completions` request and return the successful response.
pub(crate) async fn send(
    http: &reqwest::Client,
    base_url: &str,
    request: &ChatRequest,
    bearer: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Response, ApiError> {
    let url = format!("{base_url}/chat/completions");
    let mut req = http.post(&url).json(request);
    if let Some(token) = bearer.filter(|value| !value.trim().is_empty()) {
        req = req.header("Authorization", format!("Bearer {token}"));
    }

    tracing::debug!(
        %url,
        stream = request.stream,
        messages = request.messages.len(),
        "sending chat request"
    );
    let response = tokio::time::timeout(timeout, req.send())
        .await
        .map_err(|_| ApiError::Timeout(timeout))??;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body));
    }
    Ok(response)
}

/// Read a successful response body, surfacing text through `on_text` as it
/// arrives.
pub(crate) async fn read_reply(
    response: reqwest::Response,
    timeout: Duration,
    on_text: &mut (dyn FnMut(&str) + Send),
) -> Result<AssistantReply, ApiError> {
    let is_event_stream = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/event-stream"));
    if is_event_stream {
        read_stream(response, timeout, on_text).await
    } else {
        let body = tokio::time::timeout(timeout, response.text())
            .await
            .map_err(|_| ApiError::Timeout(timeout))??;
        let reply = parse_json_reply(&body)?;
        if !reply.content.is_empty() {
            on_text(&reply.content);
        }
        Ok(reply)
    }
}

async fn read_stream(
    mut response: reqwest::Response,
    timeout: Duration,
    on_text: &mut (dyn FnMut(&str) + Send),
) -> Result<AssistantReply, ApiError> {
    let mut decoder = SseDecoder::new();
    let mut state = StreamState::default();

    loop {
        let chunk = tokio::time::timeout(timeout, response.chunk())
            .await
            .map_err(|_| ApiError::Timeout(timeout))??;
        let Some(bytes) = chunk else { break };
        for payload in decoder.push(&bytes) {
            if state.apply_payload(&payload, on_text)? == Flow::Done {
                return Ok(state.into_reply());
            }
        }
    }
    for payload in decoder.finish() {
        if state.apply_payload(&payload, on_text)? == Flow::Done {
            break;
        }
    }
    tracing::debug!(
        chars = state.content.len(),
        tool_calls = state.tool_calls.calls.len(),
        "chat stream ended"
    );
    Ok(state.into_reply())
}

/// Parse a non-streaming chat completion body.
pub(crate) fn parse_json_reply(body: &str) -> Result<AssistantReply, ApiError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("invalid JSON response: {e}")))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InvalidResponse("response contained no choices".into()))?;
    Ok(AssistantReply {
        content: choice.message.content.unwrap_or_default(),
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

/// True when the provider refused the request because of `stream: true`.
pub(crate) fn rejects_streaming(err: &ApiError) -> bool {
    let ApiError::Status { body, .. } = err else {
        return false;
    };
    let lowered = body.to_lowercase();
    if !lowered.contains("stream") {
        return false;
    }
    [
        "not supported",
        "unsupported",
        "does not support",
        "unrecognized request argument",
    ]
    .iter()
    .any(|keyword| lowered.contains(keyword))
}

// ---------------------------------------------------------------------------
// Stream state
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Done,
}

#[derive(Debug, Default)]
struct StreamState {
    content: String,
    tool_calls: ToolCallAccumulator,
}

impl StreamState {
    fn apply_payload(
        &mut self,
        payload: &str,
        on_text: &mut (dyn FnMut(&str) + Send),
    ) -> Result<Flow, ApiError> {
        if payload.trim() == "[DONE]" {
            return Ok(Flow::Done);
        }
        if payload.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let chunk: ChatChunk = serde_json::from_str(payload).map_err(|e| {
            ApiError::InvalidResponse(format!("invalid streaming chunk payload: {e}"))
        })?;
        if let Some(error) = chunk.error {
            let message = error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ApiError::InvalidResponse(format!(
                "streaming response failed: {message}"
            )));
        }

        let mut finished = false;
        for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                self.content.push_str(&text);
                on_text(&text);
            }
            for delta in choice.delta.tool_calls.unwrap_or_default() {
                self.tool_calls.merge(delta);
            }
            // A final reason other than tool_calls ends the reply even if the
            // provider never sends [DONE].
            if choice
                .finish_reason
                .as_deref()
                .is_some_and(|reason| reason != "tool_calls")
            {
                finished = true;
            }
        }
        Ok(if finished { Flow::Done } else { Flow::Continue })
    }

    fn into_reply(self) -> AssistantReply {
        AssistantReply {
            content: self.content,
            tool_calls: self.tool_calls.finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool-call accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    call_type: String,
    name: String,
    arguments: String,
}

/// Merges tool-call fragments by index: id, type and name overwrite, argument
/// text appends.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    fn merge(&mut self, delta: ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.filter(|v| !v.is_empty()) {
            entry.id = id;
        }
        if let Some(call_type) = delta.call_type.filter(|v| !v.is_empty()) {
            entry.call_type = call_type;
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name.filter(|v| !v.is_empty()) {
                entry.name = name;
            }
            if let Some(arguments) = function.arguments {
                entry.arguments.push_str(&arguments);
            }
        }
    }

    fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter_map(|(index, partial)| {
                if partial.name.is_empty() {
                    tracing::warn!(index, "dropping streamed tool call without a name");
                    return None;
                }
                let id = if partial.id.is_empty() {
                    format!("call_{index}")
                } else {
                    partial.id
                };
                let mut call = ToolCall::function(id, partial.name, partial.arguments);
                if !partial.call_type.is_empty() {
                    call.call_type = partial.call_type;
                }
                Some(call)
            })
            .collect()
    }
}
