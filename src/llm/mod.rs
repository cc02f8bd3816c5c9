// ABOUTME: Reasoning provider abstraction for the single upstream text-completion call
// ABOUTME: Defines the provider trait implemented by the HTTP client and by test mocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Reasoning Provider
//!
//! The engine's one external dependency is a "prompt in, text out" call to
//! a reasoning service. [`ReasoningProvider`] is the seam: production wires
//! in [`HttpReasoningProvider`], tests substitute deterministic mocks. The
//! upstream guarantees nothing about the shape of the returned text; all
//! defensiveness lives in the gateway that consumes it.

/// HTTP-backed provider for OpenAI-compatible endpoints
pub mod http;

pub use http::{HttpReasoningProvider, ReasoningConfig};

use async_trait::async_trait;

use crate::errors::AppResult;

/// A reasoning service capable of completing a single prompt
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Short provider name for logging
    fn name(&self) -> &str;

    /// Identifier of the model answering prompts
    fn model_id(&self) -> &str;

    /// Complete a prompt, returning the raw response text
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a non-2xx
    /// upstream status. Callers treat every error identically: fall back.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}
