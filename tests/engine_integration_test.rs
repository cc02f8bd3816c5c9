// ABOUTME: End-to-end tests driving the engine facade through its three entry points
// ABOUTME: Exercises quota, cache, degradation, action mapping, and rollups together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use uuid::Uuid;

use common::{item, FixedSource, ScriptedProvider};
use feedback_intelligence::config::EngineConfig;
use feedback_intelligence::engine::FeedbackIntelligenceEngine;
use feedback_intelligence::llm::ReasoningProvider;
use feedback_intelligence::models::{AnalysisStatus, FeedbackWindow};

#[tokio::test]
async fn test_empty_input_scenario() {
    let engine = FeedbackIntelligenceEngine::new(
        FixedSource::with_items(vec![]),
        Arc::new(ScriptedProvider::succeeding()),
    );
    let outcome = engine
        .get_analysis(Uuid::new_v4(), &FeedbackWindow::trailing_days(30))
        .await
        .expect("empty input is not an error");

    assert_eq!(outcome.result.status, AnalysisStatus::Fallback);
    assert!(!outcome.cached);
    assert_eq!(outcome.result.note.as_deref(), Some("no feedback to analyze"));
}

#[tokio::test]
async fn test_successful_pipeline_end_to_end() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let source = FixedSource::with_items(vec![
        item(1, 1, "painfully slow service"),
        item(2, 2, "the wait was endless"),
        item(3, 5, "lovely room though"),
    ]);
    let engine =
        FeedbackIntelligenceEngine::new(source, provider.clone() as Arc<dyn ReasoningProvider>);
    let tenant = Uuid::new_v4();
    let window = FeedbackWindow::trailing_days(30);

    let outcome = engine.get_analysis(tenant, &window).await.unwrap();
    assert_eq!(outcome.result.status, AnalysisStatus::Ok);
    assert_eq!(outcome.result.model_id.as_deref(), Some("scripted-model"));
    assert_eq!(outcome.result.key_issues[0].title, "Slow service");

    // The action plan derives from the upstream's issue without a second call
    let actions = engine.get_actions(tenant, &window).await.unwrap();
    assert_eq!(actions[0].owner_role, "operations_manager");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_upstream_outage_degrades_not_fails() {
    let source = FixedSource::with_items(vec![
        item(1, 1, "freezing freezing dining room"),
        item(2, 1, "freezing again today"),
    ]);
    let engine =
        FeedbackIntelligenceEngine::new(source, Arc::new(ScriptedProvider::failing()));

    let outcome = engine
        .get_analysis(Uuid::new_v4(), &FeedbackWindow::trailing_days(30))
        .await
        .expect("outages degrade, they do not error");

    assert_eq!(outcome.result.status, AnalysisStatus::Fallback);
    assert!(outcome.result.note.is_some());
    assert!(outcome
        .result
        .key_issues
        .iter()
        .any(|i| i.title == "Freezing"));
}

#[tokio::test]
async fn test_malformed_upstream_payload_degrades_with_note() {
    let source = FixedSource::with_items(vec![item(1, 1, "slow service again")]);
    let provider = Arc::new(ScriptedProvider::with_response("no json here at all"));
    let engine = FeedbackIntelligenceEngine::new(source, provider);

    let outcome = engine
        .get_analysis(Uuid::new_v4(), &FeedbackWindow::trailing_days(30))
        .await
        .unwrap();

    assert_eq!(outcome.result.status, AnalysisStatus::Fallback);
    let note = outcome.result.note.unwrap();
    assert!(note.contains("JSON"), "note was: {note}");
}

#[tokio::test]
async fn test_quota_blocks_fresh_work_only() {
    let provider = Arc::new(ScriptedProvider::succeeding());
    let source = FixedSource::with_items(vec![item(1, 1, "slow slow slow")]);
    let mut config = EngineConfig::default();
    config.quota.daily_limit = 1;
    let engine = FeedbackIntelligenceEngine::with_config(config, source, provider);
    let tenant = Uuid::new_v4();
    let window = FeedbackWindow::trailing_days(30);

    let fresh = engine.get_analysis(tenant, &window).await.unwrap();
    assert!(!fresh.cached);
    assert_eq!(engine.quota_status(tenant).remaining, 0);

    // The same batch is a cache hit and stays available
    let hit = engine.get_analysis(tenant, &window).await.unwrap();
    assert!(hit.cached);

    // A different tenant misses the cache and has its own budget
    let other = engine
        .get_analysis(Uuid::new_v4(), &window)
        .await
        .unwrap();
    assert!(!other.cached);
}

#[tokio::test]
async fn test_rollup_entry_point() {
    use feedback_intelligence::source::TenantWindowStats;
    use std::collections::HashMap;

    let stats = TenantWindowStats {
        tenant_id: Uuid::new_v4(),
        tenant_name: "Bistro".to_owned(),
        request_count: 10,
        failed_request_count: 1,
        feedback: (0..4)
            .map(|i| item(i, 1, "bad"))
            .chain((4..8).map(|i| item(i, 5, "good")))
            .collect(),
        channel_counts: HashMap::from([("email".to_owned(), 8)]),
    };
    let source = Arc::new(FixedSource {
        items: vec![],
        stats: vec![stats],
    });
    let engine =
        FeedbackIntelligenceEngine::new(source, Arc::new(ScriptedProvider::succeeding()));

    let rollup = engine.get_rollup(30).await.unwrap();
    assert_eq!(rollup.top_risk_tenants[0].tenant_name, "Bistro");
    assert!((rollup.top_risk_tenants[0].risk_score - 41.0).abs() < f64::EPSILON);
    assert_eq!(rollup.failed_request_count, 1);
}
