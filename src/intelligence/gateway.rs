// ABOUTME: Reasoning gateway building bounded prompts and validating upstream JSON
// ABOUTME: Falls through to the heuristic analyzer on any upstream failure or malformed payload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Reasoning Gateway
//!
//! Wraps the single upstream call. The upstream promises nothing about its
//! response shape, so parsing is defensive: the first `{` to the last `}`
//! is extracted and strictly decoded, and every failure class (transport,
//! bad status, no JSON, malformed JSON) collapses into the same fallback
//! path with a note naming the cause so operators can tell them apart.
//! The gateway never errors and never invents data: the heuristic analyzer
//! is the mandatory terminal branch, not an option.

use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{heuristic, sentiment_summary_line};
use crate::constants::reasoning;
use crate::llm::ReasoningProvider;
use crate::models::{
    AnalysisResult, AnalysisStatus, Confidence, FeedbackItem, Issue, IssueCategory,
    SentimentSummary, Severity,
};

/// Expected shape of the upstream's JSON payload
#[derive(Debug, Deserialize)]
struct UpstreamAnalysis {
    key_issues: Vec<UpstreamIssue>,
    confidence: Confidence,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamIssue {
    title: String,
    detail: String,
    severity: Severity,
    #[serde(default = "default_evidence")]
    evidence_count: u32,
    #[serde(default = "default_category")]
    category: IssueCategory,
}

const fn default_evidence() -> u32 {
    1
}

const fn default_category() -> IssueCategory {
    IssueCategory::Ops
}

/// Gateway over a reasoning provider
pub struct ReasoningGateway {
    provider: Arc<dyn ReasoningProvider>,
}

impl ReasoningGateway {
    /// Create a gateway over the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn ReasoningProvider>) -> Self {
        Self { provider }
    }

    /// Analyze a feedback batch via the upstream, falling back locally
    ///
    /// Never errors: any upstream failure yields the heuristic analyzer's
    /// result tagged `fallback` with a note describing the failure class.
    /// Callers can read upstream health off the returned `status` field:
    /// `ok` means a validated upstream response, `fallback` means the
    /// upstream failed in some way.
    pub async fn analyze(
        &self,
        items: &[FeedbackItem],
        sentiment: &SentimentSummary,
    ) -> AnalysisResult {
        let prompt = build_prompt(items, sentiment);

        let raw = match self.provider.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Reasoning call failed, using heuristic fallback");
                return self.fallback(items, format!("upstream call failed: {e}"));
            }
        };

        match parse_upstream(&raw) {
            Ok(parsed) => {
                debug!(
                    issues = parsed.key_issues.len(),
                    "Upstream analysis validated"
                );
                AnalysisResult {
                    status: AnalysisStatus::Ok,
                    summary: sentiment_summary_line(sentiment),
                    key_issues: parsed
                        .key_issues
                        .into_iter()
                        .map(|i| Issue {
                            title: i.title,
                            detail: i.detail,
                            severity: i.severity,
                            evidence_count: i.evidence_count.max(1),
                            category: i.category,
                        })
                        .collect(),
                    signals: Vec::new(),
                    confidence: parsed.confidence,
                    model_id: Some(self.provider.model_id().to_owned()),
                    note: parsed.note,
                }
            }
            Err(cause) => {
                warn!(cause = %cause, "Upstream response rejected, using heuristic fallback");
                self.fallback(items, cause)
            }
        }
    }

    /// Heuristic result annotated with the degradation cause
    fn fallback(&self, items: &[FeedbackItem], note: String) -> AnalysisResult {
        let mut result = heuristic::analyze_locally(items);
        result.note = Some(note);
        result
    }
}

/// Extract and strictly decode the JSON object embedded in the raw text
///
/// Errors carry a human-readable cause used as the fallback note.
fn parse_upstream(raw: &str) -> Result<UpstreamAnalysis, String> {
    let start = raw
        .find('{')
        .ok_or_else(|| "no JSON object in upstream response".to_owned())?;
    let end = raw
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| "no JSON object in upstream response".to_owned())?;

    serde_json::from_str(&raw[start..=end])
        .map_err(|e| format!("malformed upstream payload: {e}"))
}

/// Build the bounded analysis prompt
///
/// At most [`reasoning::MAX_PROMPT_ITEMS`] items, each comment truncated to
/// [`reasoning::MAX_COMMENT_CHARS`] characters. The upstream is instructed
/// to describe issues only; summaries and recommendations are produced
/// locally.
fn build_prompt(items: &[FeedbackItem], sentiment: &SentimentSummary) -> String {
    let mut prompt = String::with_capacity(4096);
    prompt.push_str(
        "You are analyzing customer feedback for a business. \
         Identify concrete recurring issues only. Do not write a general \
         summary and do not suggest remediations.\n\
         Respond with strictly valid JSON and nothing else, in this shape:\n\
         {\"key_issues\": [{\"title\": \"...\", \"detail\": \"...\", \
         \"severity\": \"low|medium|high\", \"evidence_count\": 1, \
         \"category\": \"risk|ops|opportunity\"}], \
         \"confidence\": \"low|medium|high\", \"note\": null}\n\n",
    );
    let _ = writeln!(
        prompt,
        "Sentiment counts: {} positive, {} neutral, {} negative.",
        sentiment.positive, sentiment.neutral, sentiment.negative
    );
    prompt.push_str("Feedback items:\n");

    for item in items.iter().take(reasoning::MAX_PROMPT_ITEMS) {
        let rating = item
            .rating
            .map_or_else(|| "unrated".to_owned(), |r| format!("{r}/5"));
        let comment = item.comment.as_deref().unwrap_or("(no comment)");
        let truncated: String = comment.chars().take(reasoning::MAX_COMMENT_CHARS).collect();
        let _ = writeln!(prompt, "- [{rating}] {truncated}");
    }

    prompt
}
