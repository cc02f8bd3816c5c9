// ABOUTME: Integration tests for the resilience wrapper around the reasoning gateway
// ABOUTME: Breaker must skip the upstream during cool-down; rate limiting degrades per tenant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use common::{item, ScriptedProvider};
use feedback_intelligence::intelligence::ReasoningGateway;
use feedback_intelligence::models::{AnalysisRequest, AnalysisStatus};
use feedback_intelligence::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, RateLimitConfig, ResilientAnalyzer,
};

fn analyzer_with(
    provider: Arc<ScriptedProvider>,
    rate_limit: RateLimitConfig,
    breaker: CircuitBreakerConfig,
) -> ResilientAnalyzer {
    ResilientAnalyzer::with_config(ReasoningGateway::new(provider), rate_limit, breaker)
}

fn request() -> AnalysisRequest {
    AnalysisRequest::new(
        Uuid::new_v4(),
        vec![item(1, 1, "slow service"), item(2, 2, "cold food")],
    )
}

#[tokio::test]
async fn test_breaker_skips_upstream_during_cooldown() {
    let provider = Arc::new(ScriptedProvider::failing());
    let analyzer = analyzer_with(
        Arc::clone(&provider),
        RateLimitConfig::default(),
        CircuitBreakerConfig::new(1, Duration::from_secs(300), 1),
    );

    // One failure trips the breaker
    let first = analyzer.invoke(&request()).await;
    assert_eq!(first.status, AnalysisStatus::Fallback);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(analyzer.circuit_state(), CircuitState::Open);

    // Subsequent calls inside the cool-down never reach the upstream
    for _ in 0..3 {
        let degraded = analyzer.invoke(&request()).await;
        assert_eq!(degraded.status, AnalysisStatus::Fallback);
        assert!(degraded.note.is_some());
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_breaker_recovers_after_cooldown() {
    let provider = Arc::new(ScriptedProvider::failing());
    let analyzer = analyzer_with(
        Arc::clone(&provider),
        RateLimitConfig::default(),
        CircuitBreakerConfig::new(1, Duration::from_millis(20), 1),
    );

    analyzer.invoke(&request()).await;
    assert_eq!(analyzer.circuit_state(), CircuitState::Open);
    tokio::time::sleep(Duration::from_millis(40)).await;

    // The cool-down has expired, so the next call reaches the upstream again
    let retried = analyzer.invoke(&request()).await;
    assert_eq!(provider.call_count(), 2);
    assert_eq!(retried.status, AnalysisStatus::Fallback);
}

#[test]
fn test_unanswered_recovery_attempt_does_not_wedge_half_open() {
    let breaker = CircuitBreaker::with_config(
        "reasoning",
        CircuitBreakerConfig::new(1, Duration::from_millis(20), 1),
    );

    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    // Cool-down expires; one caller is admitted and claims the half-open slot
    std::thread::sleep(Duration::from_millis(30));
    assert!(breaker.is_allowed());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    // While that caller is still outstanding nobody else gets in
    assert!(!breaker.is_allowed());

    // The caller never reports back (its future was dropped). After another
    // cool-down the slot is reclaimed and one new caller is admitted.
    std::thread::sleep(Duration::from_millis(30));
    assert!(breaker.is_allowed());
    assert!(!breaker.is_allowed());

    breaker.record_success();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_success_closes_the_circuit_again() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let analyzer = analyzer_with(
        Arc::clone(&provider),
        RateLimitConfig::default(),
        CircuitBreakerConfig::new(1, Duration::from_millis(10), 1),
    );

    let result = analyzer.invoke(&request()).await;
    assert_eq!(result.status, AnalysisStatus::Ok);
    assert_eq!(analyzer.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_rate_limit_degrades_without_upstream_call() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let analyzer = analyzer_with(
        Arc::clone(&provider),
        RateLimitConfig {
            max_calls: 2,
            window: Duration::from_secs(60),
        },
        CircuitBreakerConfig::default(),
    );
    let tenant = Uuid::new_v4();
    let req = AnalysisRequest::new(tenant, vec![item(1, 1, "slow")]);

    for _ in 0..2 {
        let ok = analyzer.invoke(&req).await;
        assert_eq!(ok.status, AnalysisStatus::Ok);
    }
    let limited = analyzer.invoke(&req).await;
    assert_eq!(limited.status, AnalysisStatus::Fallback);
    assert!(limited.note.unwrap().contains("rate limit"));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_rate_limits_are_per_tenant() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let analyzer = analyzer_with(
        Arc::clone(&provider),
        RateLimitConfig {
            max_calls: 1,
            window: Duration::from_secs(60),
        },
        CircuitBreakerConfig::default(),
    );

    let a = AnalysisRequest::new(Uuid::new_v4(), vec![item(1, 1, "slow")]);
    let b = AnalysisRequest::new(Uuid::new_v4(), vec![item(1, 1, "slow")]);

    assert_eq!(analyzer.invoke(&a).await.status, AnalysisStatus::Ok);
    assert_eq!(analyzer.invoke(&a).await.status, AnalysisStatus::Fallback);
    // A different tenant still has budget
    assert_eq!(analyzer.invoke(&b).await.status, AnalysisStatus::Ok);
}
