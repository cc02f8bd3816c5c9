// ABOUTME: Integration tests for the per-tenant daily quota guard
// ABOUTME: Quota gates fresh computations only; cache hits stay free even when exhausted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors
#![allow(missing_docs)]

mod common;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use common::{item, FixedSource, ScriptedProvider, VALID_UPSTREAM_JSON};
use feedback_intelligence::config::EngineConfig;
use feedback_intelligence::engine::FeedbackIntelligenceEngine;
use feedback_intelligence::errors::{AppResult, ErrorCode};
use feedback_intelligence::llm::ReasoningProvider;
use feedback_intelligence::models::{FeedbackItem, FeedbackWindow};
use feedback_intelligence::quota::{QuotaConfig, QuotaGuard};
use feedback_intelligence::source::{FeedbackSource, TenantWindowStats};

#[test]
fn test_quota_counts_down_and_blocks_at_limit() {
    let guard = QuotaGuard::with_config(QuotaConfig {
        daily_limit: 2,
        utc_offset_hours: 0,
    });
    let tenant = Uuid::new_v4();

    assert_eq!(guard.check(tenant).remaining, 2);
    guard.record_usage(tenant);
    assert_eq!(guard.check(tenant).remaining, 1);
    guard.record_usage(tenant);

    let status = guard.check(tenant);
    assert!(!status.allowed);
    assert_eq!(status.remaining, 0);

    let err = guard.validate(tenant).unwrap_err();
    assert_eq!(err.code, ErrorCode::QuotaExceeded);
}

#[test]
fn test_validate_error_carries_limit_and_reset() {
    let guard = QuotaGuard::with_config(QuotaConfig {
        daily_limit: 1,
        utc_offset_hours: 0,
    });
    let tenant = Uuid::new_v4();
    guard.record_usage(tenant);

    let err = guard.validate(tenant).unwrap_err();
    assert_eq!(err.context.details["limit"], 1);
    assert!(err.context.details["reset_at"].is_string());
}

#[test]
fn test_tenants_have_independent_budgets() {
    let guard = QuotaGuard::with_config(QuotaConfig {
        daily_limit: 1,
        utc_offset_hours: 0,
    });
    let spender = Uuid::new_v4();
    let other = Uuid::new_v4();

    guard.record_usage(spender);
    assert!(!guard.check(spender).allowed);
    assert!(guard.check(other).allowed);
}

#[tokio::test]
async fn test_cache_hit_served_when_quota_exhausted() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let source = FixedSource::with_items(vec![
        item(1, 1, "slow service"),
        item(2, 2, "long wait in line"),
    ]);
    let mut config = EngineConfig::default();
    config.quota.daily_limit = 1;
    let engine = FeedbackIntelligenceEngine::with_config(config, source, provider);
    let tenant = Uuid::new_v4();
    let window = FeedbackWindow::trailing_days(30);

    // The single fresh computation exhausts the budget
    let first = engine.get_analysis(tenant, &window).await.unwrap();
    assert!(!first.cached);
    assert_eq!(engine.quota_status(tenant).remaining, 0);

    // Quota gates new work, not re-reads: the hit is still served and free
    let hit = engine.get_analysis(tenant, &window).await.unwrap();
    assert!(hit.cached);
    assert_eq!(engine.quota_status(tenant).remaining, 0);
}

/// Source handing out a distinct item per call, so every request is cold
struct RotatingSource {
    next_id: AtomicI64,
}

#[async_trait]
impl FeedbackSource for RotatingSource {
    async fn list_feedback(
        &self,
        _tenant_id: Uuid,
        _window: &FeedbackWindow,
    ) -> AppResult<Vec<FeedbackItem>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(vec![item(id, 1, "slow service again")])
    }

    async fn tenant_window_stats(&self, _window_days: u32) -> AppResult<Vec<TenantWindowStats>> {
        Ok(vec![])
    }
}

/// Provider that stalls long enough for concurrent requests to overlap
struct SlowProvider;

#[async_trait]
impl ReasoningProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn model_id(&self) -> &str {
        "slow-model"
    }

    async fn complete(&self, _prompt: &str) -> AppResult<String> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(VALID_UPSTREAM_JSON.to_owned())
    }
}

#[tokio::test]
async fn test_concurrent_cold_requests_cannot_overshoot_limit() {
    let source = Arc::new(RotatingSource {
        next_id: AtomicI64::new(1),
    });
    let mut config = EngineConfig::default();
    config.quota.daily_limit = 1;
    let engine = Arc::new(FeedbackIntelligenceEngine::with_config(
        config,
        source,
        Arc::new(SlowProvider),
    ));
    let tenant = Uuid::new_v4();

    // Two cold requests with distinct content race for a budget of one
    let a = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .get_analysis(tenant, &FeedbackWindow::trailing_days(30))
                .await
        }
    });
    let b = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .get_analysis(tenant, &FeedbackWindow::trailing_days(7))
                .await
        }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let fresh = results
        .iter()
        .filter(|r| matches!(r, Ok(outcome) if !outcome.cached))
        .count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.code == ErrorCode::QuotaExceeded))
        .count();

    assert_eq!(fresh, 1, "exactly one request may consume the budget");
    assert_eq!(rejected, 1, "the loser must see quota exhaustion");
    assert_eq!(engine.quota_status(tenant).remaining, 0);
}
