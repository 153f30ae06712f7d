//! API client for OpenAI-compatible chat completion endpoints.
//!
//! The facade owns the HTTP client and the streaming fallback; protocol
//! details live in `completions`. Failed requests are reported as-is.

use super::completions;
use super::{AssistantReply, ModelClient};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::ChatRequest;
use async_trait::async_trait;
use std::time::Duration;

/// Client for OpenAI-compatible model APIs.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            timeout,
        }
    }

    /// Send a chat request, streaming text through `on_text`.
    ///
    /// A provider that rejects `stream: true` is asked again without it, and
    /// the full reply is surfaced as a single piece of text.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<AssistantReply, ApiError> {
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(err) if request.stream && completions::rejects_streaming(&err) => {
                tracing::info!(error = %err, "provider rejected streaming; retrying without it");
                let mut fallback = request.clone();
                fallback.stream = false;
                self.send(&fallback).await?
            }
            Err(err) => return Err(err),
        };
        completions::read_reply(response, self.timeout, on_text).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ApiError> {
        let bearer = (!self.api_key.is_empty()).then_some(self.api_key.as_str());
        completions::send(&self.http, &self.base_url, request, bearer, self.timeout).await
    }
}

#[async_trait]
impl ModelClient for ApiClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<AssistantReply, ApiError> {
        ApiClient::stream_chat(self, request, on_text).await
    }
}
