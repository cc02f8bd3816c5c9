// ABOUTME: Shared test fixtures: scripted reasoning providers and fixed feedback sources
// ABOUTME: Used by the integration test suite; call counting makes upstream attempts observable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors
#![allow(missing_docs, dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use feedback_intelligence::errors::{AppError, AppResult};
use feedback_intelligence::llm::ReasoningProvider;
use feedback_intelligence::models::{FeedbackItem, FeedbackWindow};
use feedback_intelligence::source::{FeedbackSource, TenantWindowStats};

/// A well-formed upstream payload naming one high-severity issue
pub const VALID_UPSTREAM_JSON: &str = r#"Here is the analysis:
{"key_issues":[{"title":"Slow service","detail":"Waits dominate the complaints","severity":"high","evidence_count":3}],"confidence":"high"}"#;

/// Reasoning provider that counts calls and returns a scripted outcome
pub struct ScriptedProvider {
    calls: AtomicU32,
    /// None means every call fails with an unavailable error
    response: Option<String>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicU32::new(0),
            response: Some(VALID_UPSTREAM_JSON.to_owned()),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            response: None,
        }
    }

    #[must_use]
    pub fn with_response(response: &str) -> Self {
        Self {
            calls: AtomicU32::new(0),
            response: Some(response.to_owned()),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, _prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| AppError::external_unavailable("reasoning", "scripted outage"))
    }
}

/// Feedback source returning a fixed batch for every tenant
pub struct FixedSource {
    pub items: Vec<FeedbackItem>,
    pub stats: Vec<TenantWindowStats>,
}

impl FixedSource {
    #[must_use]
    pub fn with_items(items: Vec<FeedbackItem>) -> Arc<Self> {
        Arc::new(Self {
            items,
            stats: vec![],
        })
    }
}

#[async_trait]
impl FeedbackSource for FixedSource {
    async fn list_feedback(
        &self,
        _tenant_id: Uuid,
        _window: &FeedbackWindow,
    ) -> AppResult<Vec<FeedbackItem>> {
        Ok(self.items.clone())
    }

    async fn tenant_window_stats(&self, _window_days: u32) -> AppResult<Vec<TenantWindowStats>> {
        Ok(self.stats.clone())
    }
}

/// A rated, commented feedback item
#[must_use]
pub fn item(id: i64, rating: u8, comment: &str) -> FeedbackItem {
    FeedbackItem {
        id,
        rating: Some(rating),
        comment: Some(comment.to_owned()),
        created_at: Utc::now(),
    }
}
