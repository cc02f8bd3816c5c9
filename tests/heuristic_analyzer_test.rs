// ABOUTME: Integration tests for the deterministic heuristic fallback analyzer
// ABOUTME: Same item set must yield the same issues in the same order, every run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors
#![allow(missing_docs)]

mod common;

use common::item;
use feedback_intelligence::intelligence::heuristic::analyze_locally;
use feedback_intelligence::models::{AnalysisStatus, Confidence, Severity};

#[test]
fn test_always_a_fallback_result() {
    let result = analyze_locally(&[item(1, 1, "terribly slow service")]);
    assert_eq!(result.status, AnalysisStatus::Fallback);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.model_id.is_none());
}

#[test]
fn test_deterministic_across_runs() {
    let items = vec![
        item(1, 1, "Slow service, cold food, noisy room"),
        item(2, 2, "So slow again, and the food was cold"),
        item(3, 1, "Slow slow slow"),
    ];

    let first = analyze_locally(&items);
    let second = analyze_locally(&items);
    let third = analyze_locally(&items);

    let titles: Vec<&str> = first.key_issues.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        second
            .key_issues
            .iter()
            .map(|i| i.title.as_str())
            .collect::<Vec<_>>()
    );
    assert_eq!(
        titles,
        third
            .key_issues
            .iter()
            .map(|i| i.title.as_str())
            .collect::<Vec<_>>()
    );
    // Most frequent term first
    assert_eq!(titles[0], "Slow");
}

#[test]
fn test_prefers_low_rated_comments() {
    let items = vec![
        item(1, 5, "wonderful ambience lovely staff"),
        item(2, 1, "freezing freezing freezing room"),
    ];
    let result = analyze_locally(&items);
    assert!(result.key_issues.iter().any(|i| i.title == "Freezing"));
    assert!(!result.key_issues.iter().any(|i| i.title == "Wonderful"));
}

#[test]
fn test_stop_words_and_short_tokens_skipped() {
    let items = vec![item(1, 1, "the and was very merci bonjour food food food")];
    let result = analyze_locally(&items);
    let titles: Vec<&str> = result.key_issues.iter().map(|i| i.title.as_str()).collect();
    assert!(!titles.contains(&"The"));
    assert!(!titles.contains(&"Merci"));
    assert!(!titles.contains(&"Bonjour"));
}

#[test]
fn test_severity_scales_with_mentions() {
    let many = vec![
        item(1, 1, "slow"),
        item(2, 1, "slow"),
        item(3, 1, "slow"),
        item(4, 1, "slow"),
        item(5, 1, "slow"),
    ];
    let result = analyze_locally(&many);
    let slow = result
        .key_issues
        .iter()
        .find(|i| i.title == "Slow")
        .expect("slow is the dominant term");
    assert_eq!(slow.severity, Severity::High);
    assert_eq!(slow.evidence_count, 5);
}
