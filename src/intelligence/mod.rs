// ABOUTME: Intelligence layer: reasoning gateway, heuristic fallback, action mapping, rollups
// ABOUTME: Turns raw feedback batches into normalized analyses and ranked remediation plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Feedback Intelligence
//!
//! The analysis pipeline's brains. [`gateway`] talks to the reasoning
//! upstream and validates its output, [`heuristic`] is the deterministic
//! offline fallback, [`actions`] converts detected issues into a ranked
//! remediation plan, and [`rollup`] computes cross-tenant risk scoring.

/// Insight-to-action mapping with a data-driven template catalog
pub mod actions;
/// Reasoning gateway: prompt construction and defensive response parsing
pub mod gateway;
/// Deterministic offline fallback analyzer
pub mod heuristic;
/// Cross-tenant aggregation and risk scoring
pub mod rollup;

pub use actions::{map_to_actions, Action, Priority};
pub use gateway::ReasoningGateway;
pub use rollup::{PlatformRollup, RiskScorer, TenantRisk};

use crate::models::SentimentSummary;

/// One-line sentiment overview used as the `summary` of every analysis
#[must_use]
pub fn sentiment_summary_line(summary: &SentimentSummary) -> String {
    format!(
        "{} feedback items: {} positive, {} neutral, {} negative",
        summary.total(),
        summary.positive,
        summary.neutral,
        summary.negative
    )
}
