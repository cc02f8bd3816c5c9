// ABOUTME: Offline heuristic analyzer extracting frequent terms from negative feedback
// ABOUTME: Pure and deterministic, used whenever the reasoning upstream is unusable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Heuristic Fallback Analyzer
//!
//! Terminal branch of the degradation path: no network, no randomness. Given
//! the same item set it returns the same issues in the same order every time.
//! Fidelity is deliberately modest; its purpose is to keep the analysis
//! surface populated while the upstream is down, not to match it.

use std::collections::HashMap;

use crate::constants::heuristic;
use crate::intelligence::sentiment_summary_line;
use crate::models::{
    AnalysisResult, AnalysisStatus, Confidence, FeedbackItem, Issue, IssueCategory,
    SentimentSummary, Severity,
};

/// Tokens suppressed before frequency counting: function words, generic
/// praise and service nouns, and pleasantries (the platform serves French
/// and English speakers, so both languages appear). Tuned to avoid
/// false-positive "issues" like Merci or Bonjour.
const STOP_WORDS: &[&str] = &[
    // English function words
    "this", "that", "with", "from", "have", "been", "were", "they", "them", "their", "there",
    "what", "when", "where", "which", "would", "could", "should", "about", "just", "really",
    "very", "much", "more", "some", "only", "also", "than", "then", "your", "will", "because",
    "everything", "anything", "nothing", "something",
    // French function words
    "avec", "pour", "dans", "mais", "vous", "nous", "cette", "cest", "tout", "toute", "tres",
    "etait", "sont", "fait", "plus", "chez", "leur", "elle", "elles", "comme", "quand", "meme",
    // Generic praise and pleasantries
    "good", "nice", "great", "excellent", "amazing", "awesome", "love", "loved", "like", "liked",
    "best", "perfect", "well", "fine", "thank", "thanks", "hello", "please", "merci", "bonjour",
    "bonne", "bien", "super", "bravo", "parfait", "genial",
    // Generic service nouns that carry no actionable signal on their own
    "service", "place", "time", "experience", "visit", "overall", "recommend", "definitely",
];

/// Analyze feedback locally, without the reasoning upstream
///
/// Source selection prefers items rated 2 or below; if none exist the full
/// set is used. Tokens are lowercased, stripped of punctuation, filtered by
/// length and stop-word list, then frequency-counted; the top terms become
/// issues with severity derived from their mention count.
#[must_use]
pub fn analyze_locally(items: &[FeedbackItem]) -> AnalysisResult {
    let negative: Vec<&FeedbackItem> = items
        .iter()
        .filter(|i| i.rating.is_some_and(|r| r <= 2))
        .collect();
    let source: Vec<&FeedbackItem> = if negative.is_empty() {
        items.iter().collect()
    } else {
        negative
    };

    let key_issues = top_terms(&source)
        .into_iter()
        .map(|(term, count)| Issue {
            title: capitalize(&term),
            detail: "Frequently mentioned in low-rated feedback".to_owned(),
            severity: severity_for_count(count),
            evidence_count: count as u32,
            category: IssueCategory::Ops,
        })
        .collect();

    let summary = sentiment_summary_line(&SentimentSummary::from_items(items));

    AnalysisResult {
        status: AnalysisStatus::Fallback,
        summary,
        key_issues,
        signals: Vec::new(),
        confidence: Confidence::Low,
        model_id: None,
        note: None,
    }
}

/// Count surviving tokens and keep the top K by descending count,
/// ties broken by first-seen order
fn top_terms(items: &[&FeedbackItem]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for item in items {
        let Some(comment) = item.comment.as_deref() else {
            continue;
        };
        for token in tokenize(comment) {
            if token.chars().count() < heuristic::MIN_TOKEN_LEN {
                continue;
            }
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            let entry = counts.entry(token.clone()).or_insert(0);
            if *entry == 0 {
                first_seen.push(token);
            }
            *entry += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|t| {
            let count = counts[&t];
            (t, count)
        })
        .collect();
    // Stable sort preserves first-seen order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(heuristic::TOP_TERMS);
    ranked
}

/// Lowercase, elide apostrophes, replace remaining punctuation with spaces,
/// split on whitespace. Eliding keeps contractions as one token ("c'est"
/// becomes "cest") so the fused stop-word spellings match them.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '\'' | '\u{2019}' => None,
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            _ => Some(' '),
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

const fn severity_for_count(count: usize) -> Severity {
    if count >= heuristic::HIGH_SEVERITY_COUNT {
        Severity::High
    } else if count >= heuristic::MEDIUM_SEVERITY_COUNT {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
