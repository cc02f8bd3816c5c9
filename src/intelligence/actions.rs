// ABOUTME: Insight-to-action mapper converting detected issues into a ranked remediation plan
// ABOUTME: Data-driven keyword catalog evaluated in priority order, first match wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Insight-to-Action Mapper
//!
//! Deterministic rule engine turning an analysis into an owner-assigned
//! remediation plan. The catalog is an ordered table of (keyword cluster,
//! template) pairs rather than hard-coded branches, so clusters can be
//! tested and reordered in isolation. Actions are derived on every call
//! and never persisted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{AnalysisResult, Issue, Severity};

/// Remediation priority tier, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

/// One recommended remediation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// What to do
    pub title: String,
    /// How to go about it
    pub detail: String,
    /// Urgency tier
    pub priority: Priority,
    /// Evidence-weighted leverage estimate used to rank within a tier
    pub impact_score: f64,
    /// The problem that produced this action, tagged with its origin
    pub problem_source: String,
    /// Suggested completion horizon
    pub timeline: String,
    /// Role accountable for the action
    pub owner_role: String,
    /// Metric to watch while remediating
    pub kpi_to_track: String,
}

/// Remediation template matched against problem text
struct ActionTemplate {
    /// Lowercase substrings; any match selects this template
    keywords: &'static [&'static str],
    title: &'static str,
    detail: &'static str,
    timeline: &'static str,
    owner_role: &'static str,
    kpi_to_track: &'static str,
    /// Estimated remediation leverage, multiplies the evidence count
    weight: f64,
    /// Priority when the source severity is not high
    default_priority: Priority,
}

/// Ordered catalog, most specific operational clusters first.
/// First matching cluster wins.
const CATALOG: &[ActionTemplate] = &[
    ActionTemplate {
        keywords: &["slow", "wait", "waiting", "delay", "late", "queue", "lent", "attente", "retard"],
        title: "Reduce service and delivery wait times",
        detail: "Map the order-to-delivery path, find the slowest step, and staff or re-sequence it",
        timeline: "1-2 weeks",
        owner_role: "operations_manager",
        kpi_to_track: "average_wait_time",
        weight: 3.0,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["quality", "temperature", "cold", "lukewarm", "undercooked", "overcooked", "froid", "qualite"],
        title: "Tighten product quality and temperature control",
        detail: "Audit preparation and holding procedures; add a final temperature check before handoff",
        timeline: "1-2 weeks",
        owner_role: "kitchen_manager",
        kpi_to_track: "quality_complaint_rate",
        weight: 3.0,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["order", "wrong", "missing", "incorrect", "mistake", "commande", "erreur"],
        title: "Improve order accuracy",
        detail: "Introduce a double-check of each order against the ticket before it leaves",
        timeline: "1 week",
        owner_role: "operations_manager",
        kpi_to_track: "order_accuracy_rate",
        weight: 2.5,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["staff", "rude", "unfriendly", "attitude", "impolite", "serveur", "personnel"],
        title: "Coach front-line staff on customer interactions",
        detail: "Run a short service-behavior refresher and follow up with spot checks",
        timeline: "2-3 weeks",
        owner_role: "hr_manager",
        kpi_to_track: "service_rating",
        weight: 2.5,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["noise", "noisy", "dirty", "clean", "ambience", "ambiance", "decor", "loud", "bruyant", "sale"],
        title: "Improve venue ambience and cleanliness",
        detail: "Schedule a deep clean and review noise sources and layout in the customer area",
        timeline: "3-4 weeks",
        owner_role: "facility_manager",
        kpi_to_track: "ambience_rating",
        weight: 2.0,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["price", "expensive", "overpriced", "value", "cost", "cher", "prix"],
        title: "Review pricing against perceived value",
        detail: "Benchmark prices locally and consider portion or bundle adjustments",
        timeline: "4-6 weeks",
        owner_role: "general_manager",
        kpi_to_track: "value_perception_score",
        weight: 2.0,
        default_priority: Priority::P2,
    },
    ActionTemplate {
        keywords: &["fresh", "freshness", "stale", "sourcing", "ingredient", "frais"],
        title: "Audit ingredient freshness and sourcing",
        detail: "Review supplier rotation and stock turnover for the items called out",
        timeline: "2-3 weeks",
        owner_role: "kitchen_manager",
        kpi_to_track: "freshness_audit_pass_rate",
        weight: 2.5,
        default_priority: Priority::P1,
    },
    ActionTemplate {
        keywords: &["communication", "unclear", "confusing", "information", "response", "reply", "clarity"],
        title: "Clarify customer communication",
        detail: "Rewrite the touchpoints customers flagged and set a response-time target",
        timeline: "1-2 weeks",
        owner_role: "customer_success_lead",
        kpi_to_track: "first_response_time",
        weight: 1.5,
        default_priority: Priority::P2,
    },
];

/// Fallback leverage for problems no cluster matches
const GENERIC_WEIGHT: f64 = 1.5;

/// Convert an analysis into a ranked, owner-assigned action plan
///
/// Key issues and signals are merged into one problem list, each matched
/// against the catalog on its lowercased title+detail. Sorting is a pure,
/// stable ordering: ascending priority tier, then descending impact score,
/// preserving original relative order on full ties.
#[must_use]
pub fn map_to_actions(analysis: &AnalysisResult) -> Vec<Action> {
    let problems = analysis
        .key_issues
        .iter()
        .map(|i| ("key_issue", i))
        .chain(analysis.signals.iter().map(|i| ("signal", i)));

    let mut actions: Vec<Action> = problems
        .map(|(origin, issue)| action_for(origin, issue))
        .collect();

    actions.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then_with(|| {
            b.impact_score
                .partial_cmp(&a.impact_score)
                .unwrap_or(Ordering::Equal)
        })
    });
    actions
}

fn action_for(origin: &str, issue: &Issue) -> Action {
    let text = format!("{} {}", issue.title, issue.detail).to_lowercase();
    let problem_source = format!("{origin}: {}", issue.title);
    let evidence = f64::from(issue.evidence_count.max(1));

    let matched = CATALOG
        .iter()
        .find(|t| t.keywords.iter().any(|k| text.contains(k)));

    match matched {
        Some(template) => Action {
            title: template.title.to_owned(),
            detail: template.detail.to_owned(),
            priority: priority_for(issue.severity, template.default_priority),
            impact_score: evidence * template.weight,
            problem_source,
            timeline: template.timeline.to_owned(),
            owner_role: template.owner_role.to_owned(),
            kpi_to_track: template.kpi_to_track.to_owned(),
        },
        None => Action {
            title: format!("Address: {}", issue.title),
            detail: "Investigate the reported problem and define a remediation".to_owned(),
            priority: priority_for(issue.severity, Priority::P1),
            impact_score: evidence * GENERIC_WEIGHT,
            problem_source,
            timeline: "2-4 weeks".to_owned(),
            owner_role: "general_manager".to_owned(),
            kpi_to_track: "customer_satisfaction".to_owned(),
        },
    }
}

/// High-severity problems always escalate to P0
const fn priority_for(severity: Severity, template_default: Priority) -> Priority {
    match severity {
        Severity::High => Priority::P0,
        Severity::Low | Severity::Medium => template_default,
    }
}
