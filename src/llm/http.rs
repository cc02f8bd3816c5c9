// ABOUTME: OpenAI-compatible HTTP client for the reasoning upstream
// ABOUTME: Single bounded chat-completions call with readable error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # HTTP Reasoning Provider
//!
//! Generic client for any OpenAI-compatible chat-completions endpoint
//! (OpenAI, Groq, Ollama, vLLM, ...). The engine sends one user message per
//! analysis and reads back the first choice's content; streaming and tool
//! calling are out of scope.
//!
//! ## Configuration
//!
//! - `FEEDBACK_REASONING_BASE_URL`: API base URL (default: `https://api.openai.com/v1`)
//! - `FEEDBACK_REASONING_MODEL`: model name (default: `gpt-4o-mini`)
//! - `FEEDBACK_REASONING_API_KEY`: bearer token (optional for local servers)
//! - `FEEDBACK_REASONING_TIMEOUT_SECS`: request timeout (default: 30)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use super::ReasoningProvider;
use crate::constants::reasoning;
use crate::errors::{AppError, AppResult};

const BASE_URL_ENV: &str = "FEEDBACK_REASONING_BASE_URL";
const MODEL_ENV: &str = "FEEDBACK_REASONING_MODEL";
const API_KEY_ENV: &str = "FEEDBACK_REASONING_API_KEY";
const TIMEOUT_ENV: &str = "FEEDBACK_REASONING_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorResponse {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the HTTP reasoning provider
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// API base URL (without trailing slash)
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer token, None for unauthenticated local servers
    pub api_key: Option<String>,
    /// Bounded timeout for the whole request
    pub timeout: Duration,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(reasoning::REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ReasoningConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults with a warning on unparseable values
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        let api_key = env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());

        let timeout_secs = env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|raw| match raw.parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!(value = %raw, "Invalid {TIMEOUT_ENV}, using default");
                    None
                }
            })
            .unwrap_or(reasoning::REQUEST_TIMEOUT_SECS);

        Self {
            base_url,
            model,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Reasoning provider backed by an OpenAI-compatible HTTP endpoint
pub struct HttpReasoningProvider {
    client: Client,
    config: ReasoningConfig,
}

impl HttpReasoningProvider {
    /// Create a provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ReasoningConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a provider from environment configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_env() -> AppResult<Self> {
        Self::new(ReasoningConfig::from_env())
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Map a non-2xx upstream response to a readable error
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<UpstreamErrorResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| body.chars().take(200).collect::<String>(), |e| e.message);

        if status.is_server_error() {
            AppError::external_unavailable(
                reasoning::UPSTREAM_NAME,
                format!("upstream returned {status}: {detail}"),
            )
        } else {
            AppError::external_service(
                reasoning::UPSTREAM_NAME,
                format!("upstream returned {status}: {detail}"),
            )
        }
    }
}

#[async_trait]
impl ReasoningProvider for HttpReasoningProvider {
    fn name(&self) -> &str {
        reasoning::UPSTREAM_NAME
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatCompletionMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        debug!(prompt_chars = prompt.len(), "Sending reasoning request");

        let mut builder = self.client.post(self.api_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::external_unavailable(reasoning::UPSTREAM_NAME, "request timed out")
            } else {
                AppError::external_unavailable(
                    reasoning::UPSTREAM_NAME,
                    format!("transport error: {e}"),
                )
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_unavailable(
                reasoning::UPSTREAM_NAME,
                format!("failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            error!(status = %status, "Reasoning upstream returned an error");
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Unexpected reasoning response envelope");
            AppError::external_service(
                reasoning::UPSTREAM_NAME,
                format!("unexpected response envelope: {e}"),
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AppError::external_service(reasoning::UPSTREAM_NAME, "response had no content")
            })?;

        debug!(response_chars = content.len(), "Reasoning response received");
        Ok(content)
    }
}
