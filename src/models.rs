// ABOUTME: Core domain types for feedback items, analysis requests, and analysis results
// ABOUTME: All types are serde-serializable and owned immutably by their producers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Domain Models
//!
//! Data types flowing through the analysis pipeline. `FeedbackItem` is owned
//! by the calling collaborator and only ever read here; `AnalysisResult` is
//! the single output shape for both upstream-backed and fallback analyses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single piece of customer feedback supplied by the collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Stable identifier assigned by the feedback store
    pub id: i64,
    /// Star rating 1-5, absent for comment-only submissions
    pub rating: Option<u8>,
    /// Free-text comment, absent for rating-only submissions
    pub comment: Option<String>,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl FeedbackItem {
    /// Classify the item's sentiment from its rating
    #[must_use]
    pub fn sentiment(&self) -> Sentiment {
        match self.rating {
            Some(r) if r >= 4 => Sentiment::Positive,
            Some(r) if r <= 2 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

/// Sentiment classification derived from a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Counts of feedback items by sentiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentSummary {
    /// Tally sentiment counts over a set of items
    #[must_use]
    pub fn from_items(items: &[FeedbackItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            match item.sentiment() {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Neutral => summary.neutral += 1,
                Sentiment::Negative => summary.negative += 1,
            }
        }
        summary
    }

    /// Total items counted
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }
}

/// One analysis invocation's input, constructed per call and never persisted
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Tenant the feedback belongs to
    pub tenant_id: Uuid,
    /// Feedback items in the requested window, in store order
    pub items: Vec<FeedbackItem>,
    /// Sentiment tallies over `items`
    pub sentiment_summary: SentimentSummary,
    /// Number of items carrying a non-empty comment
    pub comment_count: u32,
}

impl AnalysisRequest {
    /// Build a request from a tenant's feedback items
    #[must_use]
    pub fn new(tenant_id: Uuid, items: Vec<FeedbackItem>) -> Self {
        let sentiment_summary = SentimentSummary::from_items(&items);
        let comment_count = items
            .iter()
            .filter(|i| i.comment.as_deref().is_some_and(|c| !c.trim().is_empty()))
            .count() as u32;
        Self {
            tenant_id,
            items,
            sentiment_summary,
            comment_count,
        }
    }
}

/// Whether a result came from the validated upstream or a degradation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Well-formed response from the reasoning service
    Ok,
    /// Produced by the heuristic analyzer or triggered by an upstream error
    Fallback,
}

/// Confidence level attached to an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Severity or impact level of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Broad category of a detected issue or signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Risk,
    Ops,
    Opportunity,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Risk => write!(f, "risk"),
            Self::Ops => write!(f, "ops"),
            Self::Opportunity => write!(f, "opportunity"),
        }
    }
}

/// A detected problem or signal extracted from feedback
///
/// Issue text originates from customer comments or an LLM and is always
/// non-authoritative: display it, never execute or parse it further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Short label for the problem
    pub title: String,
    /// Supporting detail
    pub detail: String,
    /// Estimated severity
    pub severity: Severity,
    /// How many feedback items support this issue, always >= 1
    pub evidence_count: u32,
    /// Broad classification
    pub category: IssueCategory,
}

/// Normalized output of an analysis, from either path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Origin and trustworthiness of the result
    pub status: AnalysisStatus,
    /// One-line sentiment overview composed locally
    pub summary: String,
    /// Detected issues, most significant first
    pub key_issues: Vec<Issue>,
    /// Softer observations surfaced separately from issues
    #[serde(default)]
    pub signals: Vec<Issue>,
    /// Confidence in the issues list
    pub confidence: Confidence,
    /// Identifier of the upstream model, absent on fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Human-readable degradation note, absent on clean results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AnalysisResult {
    /// Synthetic result for a request with no feedback items
    #[must_use]
    pub fn empty_input() -> Self {
        Self {
            status: AnalysisStatus::Fallback,
            summary: "No feedback available for this window".to_owned(),
            key_issues: Vec::new(),
            signals: Vec::new(),
            confidence: Confidence::Low,
            model_id: None,
            note: Some(crate::constants::EMPTY_INPUT_NOTE.to_owned()),
        }
    }
}

/// Analysis result together with its cache provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// The normalized analysis
    pub result: AnalysisResult,
    /// Whether the result was served from the cache
    pub cached: bool,
    /// When the result was originally computed
    pub computed_at: DateTime<Utc>,
}

/// Half-open time window over feedback submission timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl FeedbackWindow {
    /// Window covering the trailing `days` days ending now
    #[must_use]
    pub fn trailing_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, rating: Option<u8>, comment: Option<&str>) -> FeedbackItem {
        FeedbackItem {
            id,
            rating,
            comment: comment.map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sentiment_classification() {
        assert_eq!(item(1, Some(5), None).sentiment(), Sentiment::Positive);
        assert_eq!(item(2, Some(3), None).sentiment(), Sentiment::Neutral);
        assert_eq!(item(3, Some(1), None).sentiment(), Sentiment::Negative);
        assert_eq!(item(4, None, None).sentiment(), Sentiment::Neutral);
    }

    #[test]
    fn test_request_counts_comments() {
        let request = AnalysisRequest::new(
            Uuid::new_v4(),
            vec![
                item(1, Some(1), Some("cold food")),
                item(2, Some(5), Some("   ")),
                item(3, Some(4), None),
            ],
        );
        assert_eq!(request.comment_count, 1);
        assert_eq!(request.sentiment_summary.negative, 1);
        assert_eq!(request.sentiment_summary.positive, 2);
        assert_eq!(request.sentiment_summary.total(), 3);
    }

    #[test]
    fn test_empty_input_result_is_fallback() {
        let result = AnalysisResult::empty_input();
        assert_eq!(result.status, AnalysisStatus::Fallback);
        assert_eq!(result.note.as_deref(), Some("no feedback to analyze"));
        assert!(result.key_issues.is_empty());
    }
}
