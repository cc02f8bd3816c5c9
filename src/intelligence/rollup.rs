// ABOUTME: Cross-tenant rollup and per-tenant risk scoring over a trailing window
// ABOUTME: Risk weighs negative-feedback rate against non-response rate, top tenants retained
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Aggregation and Risk Scoring
//!
//! Pure computation over [`TenantWindowStats`] snapshots supplied by the
//! feedback source. The scorer holds no state and performs no I/O, so the
//! weighting formula can be tested directly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::rollup::{NEGATIVE_RATE_WEIGHT, NON_RESPONSE_WEIGHT, TOP_TENANTS};
use crate::models::{Sentiment, SentimentSummary};
use crate::source::TenantWindowStats;

/// One tenant's position in the risk ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRisk {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    /// 0.0 to 100.0, one decimal place
    pub risk_score: f64,
    pub negative_rate: f64,
    pub response_rate: f64,
    pub feedback_count: u32,
    pub request_count: u32,
}

/// Platform-wide view over the trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRollup {
    pub window_days: u32,
    pub sentiment: SentimentSummary,
    pub request_count: u32,
    pub feedback_count: u32,
    pub failed_request_count: u32,
    /// Fraction of requests that produced feedback, 0 when no requests
    pub response_rate: f64,
    /// Received feedback per delivery channel
    pub channel_distribution: HashMap<String, u32>,
    /// Highest-risk tenants, descending by score
    pub top_risk_tenants: Vec<TenantRisk>,
}

/// Computes rollups and tenant risk rankings
#[derive(Debug, Clone, Copy)]
pub struct RiskScorer {
    /// How many tenants to retain in the ranking
    top_tenants: usize,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            top_tenants: TOP_TENANTS,
        }
    }
}

impl RiskScorer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_top_tenants(top_tenants: usize) -> Self {
        Self { top_tenants }
    }

    /// Aggregate every tenant's window stats into one platform rollup
    #[must_use]
    pub fn build_rollup(&self, window_days: u32, stats: &[TenantWindowStats]) -> PlatformRollup {
        let mut sentiment = SentimentSummary::default();
        let mut request_count = 0u32;
        let mut feedback_count = 0u32;
        let mut failed_request_count = 0u32;
        let mut channel_distribution: HashMap<String, u32> = HashMap::new();

        for tenant in stats {
            request_count += tenant.request_count;
            failed_request_count += tenant.failed_request_count;
            feedback_count += u32::try_from(tenant.feedback.len()).unwrap_or(u32::MAX);
            for item in &tenant.feedback {
                match item.sentiment() {
                    Sentiment::Positive => sentiment.positive += 1,
                    Sentiment::Neutral => sentiment.neutral += 1,
                    Sentiment::Negative => sentiment.negative += 1,
                }
            }
            for (channel, count) in &tenant.channel_counts {
                *channel_distribution.entry(channel.clone()).or_insert(0) += count;
            }
        }

        let response_rate = ratio(feedback_count, request_count);

        let mut ranked: Vec<TenantRisk> = stats.iter().map(Self::score_tenant).collect();
        ranked.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(self.top_tenants);

        PlatformRollup {
            window_days,
            sentiment,
            request_count,
            feedback_count,
            failed_request_count,
            response_rate,
            channel_distribution,
            top_risk_tenants: ranked,
        }
    }

    /// Risk is a weighted blend of the negative-feedback rate and the
    /// non-response rate, scaled to 0..=100 and rounded to one decimal.
    /// Both rates are 0 when their denominator is 0.
    fn score_tenant(stats: &TenantWindowStats) -> TenantRisk {
        let feedback_count = u32::try_from(stats.feedback.len()).unwrap_or(u32::MAX);
        let negative = u32::try_from(
            stats
                .feedback
                .iter()
                .filter(|f| f.sentiment() == Sentiment::Negative)
                .count(),
        )
        .unwrap_or(u32::MAX);

        let negative_rate = ratio(negative, feedback_count);
        let response_rate = ratio(feedback_count, stats.request_count);
        let raw =
            100.0 * (NEGATIVE_RATE_WEIGHT * negative_rate + NON_RESPONSE_WEIGHT * (1.0 - response_rate));

        TenantRisk {
            tenant_id: stats.tenant_id,
            tenant_name: stats.tenant_name.clone(),
            risk_score: round_one_decimal(raw),
            negative_rate,
            response_rate,
            feedback_count,
            request_count: stats.request_count,
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
