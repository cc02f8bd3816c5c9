// ABOUTME: Per-tenant daily quota guard for fresh (non-cached) analyses
// ABOUTME: Recounts usage inside the current calendar-day window on every check, no reset task
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Quota Guard
//!
//! Bounds how many fresh analyses a tenant can trigger per calendar day.
//! The limit is a single constant shared by every subscription tier, and it
//! is independent of (and stricter than) the cache: a cache hit never
//! consumes quota, only a genuine computation does. There is no background
//! reset job - the window rolls over implicitly because every check
//! recounts usage timestamps falling inside the current day.

use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::quota;
use crate::errors::{AppError, AppResult};

/// Quota configuration
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Fresh analyses allowed per tenant per day
    pub daily_limit: u32,
    /// UTC offset (hours) of the platform's configured timezone, used to
    /// place the calendar-day boundary
    pub utc_offset_hours: i32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: quota::DAILY_ANALYSIS_LIMIT,
            utc_offset_hours: 0,
        }
    }
}

/// Snapshot of a tenant's quota for the current window
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    /// Whether a fresh analysis may proceed
    pub allowed: bool,
    /// Fresh analyses remaining in the current window
    pub remaining: u32,
    /// The daily limit
    pub limit: u32,
    /// When the current window rolls over
    pub window_reset_at: DateTime<Utc>,
}

/// Per-tenant daily quota accounting
///
/// Usage rows are in-memory timestamps appended by [`QuotaGuard::record_usage`];
/// each check counts the rows created inside `[window_start, window_start + 1 day)`
/// and prunes older ones. Updates happen under the tenant's `DashMap` entry
/// lock, so concurrent requests from one tenant never under- or over-count.
pub struct QuotaGuard {
    config: QuotaConfig,
    usage: DashMap<Uuid, Vec<DateTime<Utc>>>,
}

impl QuotaGuard {
    /// Create a guard with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QuotaConfig::default())
    }

    /// Create a guard with custom configuration
    #[must_use]
    pub fn with_config(config: QuotaConfig) -> Self {
        Self {
            config,
            usage: DashMap::new(),
        }
    }

    /// Check the tenant's remaining budget without consuming any
    #[must_use]
    pub fn check(&self, tenant_id: Uuid) -> QuotaStatus {
        let window_start = self.current_window_start();
        let window_reset_at = window_start + Duration::days(1);

        let used = self
            .usage
            .get(&tenant_id)
            .map_or(0, |stamps| Self::count_in_window(&stamps, window_start)) as u32;

        let remaining = self.config.daily_limit.saturating_sub(used);
        QuotaStatus {
            allowed: remaining > 0,
            remaining,
            limit: self.config.daily_limit,
            window_reset_at,
        }
    }

    /// Check the budget, erroring when it is exhausted
    ///
    /// # Errors
    ///
    /// Returns [`AppError::quota_exceeded`] carrying the limit and the
    /// window reset time when no fresh analyses remain.
    pub fn validate(&self, tenant_id: Uuid) -> AppResult<QuotaStatus> {
        let status = self.check(tenant_id);
        if status.allowed {
            Ok(status)
        } else {
            Err(
                AppError::quota_exceeded(status.limit, status.window_reset_at)
                    .with_tenant_id(tenant_id),
            )
        }
    }

    /// Record one fresh analysis for the tenant
    ///
    /// Call exactly once per non-cached computation. Prunes usage rows that
    /// fell out of the current window while the entry lock is held.
    pub fn record_usage(&self, tenant_id: Uuid) {
        let window_start = self.current_window_start();
        let mut stamps = self.usage.entry(tenant_id).or_default();
        stamps.retain(|t| *t >= window_start);
        stamps.push(Utc::now());
        debug!(
            tenant_id = %tenant_id,
            used_today = stamps.len(),
            limit = self.config.daily_limit,
            "Recorded fresh analysis usage"
        );
    }

    /// Atomically reserve one fresh analysis for the tenant
    ///
    /// Prunes, counts, and appends in a single pass under the tenant's
    /// entry lock, so two concurrent cold requests can never both slip
    /// past the limit. Pair with [`QuotaGuard::refund`] when the reserved
    /// computation turns out to be a cache hit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::quota_exceeded`] carrying the limit and the
    /// window reset time when no fresh analyses remain.
    pub fn try_consume(&self, tenant_id: Uuid) -> AppResult<QuotaStatus> {
        let window_start = self.current_window_start();
        let window_reset_at = window_start + Duration::days(1);

        let mut stamps = self.usage.entry(tenant_id).or_default();
        stamps.retain(|t| *t >= window_start);
        let used = stamps.len() as u32;
        if used >= self.config.daily_limit {
            return Err(
                AppError::quota_exceeded(self.config.daily_limit, window_reset_at)
                    .with_tenant_id(tenant_id),
            );
        }
        stamps.push(Utc::now());
        debug!(
            tenant_id = %tenant_id,
            used_today = stamps.len(),
            limit = self.config.daily_limit,
            "Reserved fresh analysis quota"
        );
        Ok(QuotaStatus {
            allowed: true,
            remaining: self.config.daily_limit - used - 1,
            limit: self.config.daily_limit,
            window_reset_at,
        })
    }

    /// Return one previously reserved analysis to the tenant's budget
    pub fn refund(&self, tenant_id: Uuid) {
        if let Some(mut stamps) = self.usage.get_mut(&tenant_id) {
            stamps.pop();
            debug!(tenant_id = %tenant_id, "Refunded unused analysis quota");
        }
    }

    /// Start of the current calendar day in the configured timezone
    fn current_window_start(&self) -> DateTime<Utc> {
        let offset = FixedOffset::east_opt(self.config.utc_offset_hours * 3600).unwrap_or_else(|| {
            warn!(
                offset_hours = self.config.utc_offset_hours,
                "Invalid quota timezone offset, using UTC"
            );
            Utc.fix()
        });
        let local_now = Utc::now().with_timezone(&offset);
        let day_start = local_now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_else(|| local_now.naive_local());
        offset
            .from_local_datetime(&day_start)
            .single()
            .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
    }

    fn count_in_window(stamps: &[DateTime<Utc>], window_start: DateTime<Utc>) -> usize {
        stamps.iter().filter(|t| **t >= window_start).count()
    }
}

impl Default for QuotaGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_down_to_rejection() {
        let guard = QuotaGuard::with_config(QuotaConfig {
            daily_limit: 2,
            utc_offset_hours: 0,
        });
        let tenant = Uuid::new_v4();

        assert_eq!(guard.check(tenant).remaining, 2);
        guard.record_usage(tenant);
        assert_eq!(guard.check(tenant).remaining, 1);
        guard.record_usage(tenant);

        let status = guard.check(tenant);
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);

        let err = guard.validate(tenant).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::QuotaExceeded);
        assert_eq!(err.context.details["limit"], 2);
    }

    #[test]
    fn test_tenants_are_independent() {
        let guard = QuotaGuard::with_config(QuotaConfig {
            daily_limit: 1,
            utc_offset_hours: 0,
        });
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        guard.record_usage(a);
        assert!(!guard.check(a).allowed);
        assert!(guard.check(b).allowed);
    }

    #[test]
    fn test_try_consume_reserves_and_refund_returns() {
        let guard = QuotaGuard::with_config(QuotaConfig {
            daily_limit: 1,
            utc_offset_hours: 0,
        });
        let tenant = Uuid::new_v4();

        let status = guard.try_consume(tenant).unwrap();
        assert_eq!(status.remaining, 0);

        let err = guard.try_consume(tenant).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::QuotaExceeded);

        guard.refund(tenant);
        assert!(guard.try_consume(tenant).is_ok());
    }

    #[test]
    fn test_window_rollover_readmits_tenant() {
        let guard = QuotaGuard::with_config(QuotaConfig {
            daily_limit: 1,
            utc_offset_hours: 0,
        });
        let tenant = Uuid::new_v4();

        // A usage row from two days ago falls outside any current window
        guard
            .usage
            .insert(tenant, vec![Utc::now() - Duration::days(2)]);
        let status = guard.check(tenant);
        assert!(status.allowed);
        assert_eq!(status.remaining, 1);
    }

    #[test]
    fn test_reset_is_next_day_boundary() {
        let guard = QuotaGuard::new();
        let status = guard.check(Uuid::new_v4());
        let now = Utc::now();
        assert!(status.window_reset_at > now);
        assert!(status.window_reset_at <= now + Duration::days(1));
    }
}
