// ABOUTME: Centralized tunable defaults for quotas, rate limits, and analysis bounds
// ABOUTME: Single source of truth so limits never drift between modules and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

/// Quota defaults
pub mod quota {
    /// Fresh analyses allowed per tenant per calendar day, identical for
    /// every subscription tier. Cache hits never count against it.
    pub const DAILY_ANALYSIS_LIMIT: u32 = 4;
}

/// Rate limiter defaults
pub mod rate_limit {
    /// Maximum upstream invocations per tenant per window
    pub const MAX_CALLS_PER_WINDOW: u32 = 100;
    /// Fixed window length in seconds
    pub const WINDOW_SECS: u64 = 60;
}

/// Circuit breaker defaults
pub mod breaker {
    /// Consecutive failures before the circuit opens. The upstream is a
    /// best-effort enrichment, so a single failure trips the breaker.
    pub const FAILURE_THRESHOLD: u32 = 1;
    /// Cool-down before a recovery attempt is allowed, in seconds
    pub const COOLDOWN_SECS: u64 = 300;
    /// Successes required in half-open state before the circuit closes
    pub const SUCCESS_THRESHOLD: u32 = 1;
}

/// Analysis cache defaults
pub mod cache {
    /// Maximum cached analyses held in memory across all tenants
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
}

/// Reasoning gateway bounds
pub mod reasoning {
    /// Upstream service name used in logs and error notes
    pub const UPSTREAM_NAME: &str = "reasoning";
    /// Maximum feedback items included in a single prompt
    pub const MAX_PROMPT_ITEMS: usize = 120;
    /// Maximum characters of each comment included in the prompt
    pub const MAX_COMMENT_CHARS: usize = 600;
    /// Bounded timeout for the single upstream HTTP call, in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Heuristic fallback analyzer bounds
pub mod heuristic {
    /// Number of top frequency terms reported as issues
    pub const TOP_TERMS: usize = 6;
    /// Minimum token length kept after filtering
    pub const MIN_TOKEN_LEN: usize = 4;
    /// Evidence count at or above which an issue is high severity
    pub const HIGH_SEVERITY_COUNT: usize = 5;
    /// Evidence count at or above which an issue is medium severity
    pub const MEDIUM_SEVERITY_COUNT: usize = 3;
}

/// Rollup and risk scoring defaults
pub mod rollup {
    /// Number of highest-risk tenants retained in a rollup
    pub const TOP_TENANTS: usize = 8;
    /// Weight of the negative-feedback rate in the risk score
    pub const NEGATIVE_RATE_WEIGHT: f64 = 0.7;
    /// Weight of the non-response rate in the risk score
    pub const NON_RESPONSE_WEIGHT: f64 = 0.3;
}

/// Fixed note attached to the synthetic result for empty input
pub const EMPTY_INPUT_NOTE: &str = "no feedback to analyze";
