// ABOUTME: Per-tenant fixed-window rate limiter for upstream reasoning calls
// ABOUTME: Counts calls atomically per tenant and refuses once the window budget is spent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::rate_limit;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum calls per tenant per window
    pub max_calls: u32,
    /// Fixed window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: rate_limit::MAX_CALLS_PER_WINDOW,
            window: Duration::from_secs(rate_limit::WINDOW_SECS),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitDecision {
    /// Whether the call may proceed
    pub allowed: bool,
    /// Maximum calls in the current window
    pub limit: u32,
    /// Calls remaining in the current window
    pub remaining: u32,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
}

/// Per-tenant counter for the current fixed window
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Fixed-window rate limiter keyed by tenant
///
/// Each tenant's counter is updated under its `DashMap` entry lock, so
/// concurrent requests from the same tenant never under- or over-count.
/// Tenants are fully independent of each other and of the circuit breaker.
pub struct TenantRateLimiter {
    config: RateLimitConfig,
    counters: DashMap<Uuid, WindowCounter>,
}

impl TenantRateLimiter {
    /// Create a limiter with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a limiter with custom configuration
    #[must_use]
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: DashMap::new(),
        }
    }

    /// Check the tenant's budget and consume one call if allowed
    pub fn try_acquire(&self, tenant_id: Uuid) -> RateLimitDecision {
        let now = Utc::now();
        let window = ChronoDuration::from_std(self.config.window)
            .unwrap_or_else(|_| ChronoDuration::seconds(60));

        let mut entry = self.counters.entry(tenant_id).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });

        // Roll the window forward lazily on access
        if now - entry.window_start >= window {
            entry.window_start = now;
            entry.count = 0;
        }

        let reset_at = entry.window_start + window;
        if entry.count >= self.config.max_calls {
            return RateLimitDecision {
                allowed: false,
                limit: self.config.max_calls,
                remaining: 0,
                reset_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            limit: self.config.max_calls,
            remaining: self.config.max_calls - entry.count,
            reset_at,
        }
    }
}

impl Default for TenantRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
