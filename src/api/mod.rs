//! HTTP client for OpenAI-compatible APIs.
//!
//! The API layer is split into cohesive protocol modules:
//! - `completions`: `/chat/completions` send/read helpers
//! - `sse`: incremental server-sent-events decoding
//! - `client`: request dispatch and the non-streaming fallback

use crate::error::ApiError;
use crate::types::{ChatRequest, ToolCall};
use async_trait::async_trait;

mod client;
mod completions;
mod sse;

pub use client::ApiClient;

/// The assistant's side of one model round: its full text plus any tool
/// calls it requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Minimal model API interface used by the tool loop.
///
/// This trait lets tests provide deterministic scripted replies without
/// network calls while the production path uses [`ApiClient`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one request, passing each text fragment to `on_text` as it arrives.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<AssistantReply, ApiError>;
}
