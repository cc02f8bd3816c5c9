// ABOUTME: Resilience wrapper combining per-tenant rate limiting with a circuit breaker
// ABOUTME: Guarantees every invocation returns a usable analysis, upstream health regardless
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Resilience Wrapper
//!
//! Sits between the analysis cache and the reasoning gateway. Order of
//! checks: per-tenant rate limit, then the shared circuit breaker, then the
//! gateway. A refused or failed upstream path degrades to the heuristic
//! analyzer; `invoke` never errors. The breaker is global across tenants
//! (an upstream outage is the upstream's property); the rate limiter and
//! quota are per-tenant and independent of it.

/// Atomic circuit breaker for the reasoning upstream
pub mod circuit_breaker;
/// Per-tenant fixed-window rate limiter
pub mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimitConfig, RateLimitDecision, TenantRateLimiter};

use tracing::{debug, warn};

use crate::constants::reasoning;
use crate::intelligence::{heuristic, ReasoningGateway};
use crate::models::{AnalysisRequest, AnalysisResult, AnalysisStatus};

/// Rate-limited, circuit-broken front of the reasoning gateway
pub struct ResilientAnalyzer {
    gateway: ReasoningGateway,
    rate_limiter: TenantRateLimiter,
    breaker: CircuitBreaker,
}

impl ResilientAnalyzer {
    /// Create a wrapper with default limiter and breaker configuration
    #[must_use]
    pub fn new(gateway: ReasoningGateway) -> Self {
        Self::with_config(
            gateway,
            RateLimitConfig::default(),
            CircuitBreakerConfig::default(),
        )
    }

    /// Create a wrapper with custom limiter and breaker configuration
    #[must_use]
    pub fn with_config(
        gateway: ReasoningGateway,
        rate_limit: RateLimitConfig,
        breaker: CircuitBreakerConfig,
    ) -> Self {
        Self {
            gateway,
            rate_limiter: TenantRateLimiter::with_config(rate_limit),
            breaker: CircuitBreaker::with_config(reasoning::UPSTREAM_NAME, breaker),
        }
    }

    /// Current circuit state, for health reporting
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Analyze a request, degrading instead of failing
    ///
    /// Always returns a usable result. Paths, in order:
    /// 1. Tenant over its per-minute budget: skip upstream, heuristic fallback.
    /// 2. Circuit open within cool-down: skip upstream, heuristic fallback
    ///    (no upstream attempt at all - the point of the breaker).
    /// 3. Gateway call: success clears the breaker; any upstream failure
    ///    trips it and the gateway has already degraded the result.
    pub async fn invoke(&self, request: &AnalysisRequest) -> AnalysisResult {
        let decision = self.rate_limiter.try_acquire(request.tenant_id);
        if !decision.allowed {
            warn!(
                tenant_id = %request.tenant_id,
                limit = decision.limit,
                reset_at = %decision.reset_at,
                "Rate limit exceeded, skipping reasoning upstream"
            );
            return self.degraded(
                request,
                format!(
                    "rate limit of {} calls per window exceeded; retrying after {}",
                    decision.limit, decision.reset_at
                ),
            );
        }

        if !self.breaker.is_allowed() {
            debug!(
                tenant_id = %request.tenant_id,
                retry_in_secs = self.breaker.secs_until_recovery(),
                "Circuit open, skipping reasoning upstream"
            );
            return self.degraded(
                request,
                format!(
                    "reasoning service cooling down after failure; retry in {}s",
                    self.breaker.secs_until_recovery()
                ),
            );
        }

        let result = self
            .gateway
            .analyze(&request.items, &request.sentiment_summary)
            .await;

        match result.status {
            AnalysisStatus::Ok => self.breaker.record_success(),
            AnalysisStatus::Fallback => {
                warn!(
                    tenant_id = %request.tenant_id,
                    note = result.note.as_deref().unwrap_or(""),
                    "Upstream analysis degraded, recording circuit failure"
                );
                self.breaker.record_failure();
            }
        }

        result
    }

    /// Heuristic result for paths that never reach the gateway
    fn degraded(&self, request: &AnalysisRequest, note: String) -> AnalysisResult {
        let mut result = heuristic::analyze_locally(&request.items);
        result.note = Some(note);
        result
    }
}
