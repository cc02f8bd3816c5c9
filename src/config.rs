// ABOUTME: Engine configuration aggregated from environment variables
// ABOUTME: Tolerant parsing: invalid values log a warning and fall back to defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Configuration
//!
//! One [`EngineConfig`] bundles every tunable the engine exposes. All
//! knobs come from `FEEDBACK_*` environment variables and every one has
//! a sensible default, so `EngineConfig::from_env()` never fails.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::cache::CacheConfig;
use crate::llm::ReasoningConfig;
use crate::quota::QuotaConfig;
use crate::resilience::{CircuitBreakerConfig, RateLimitConfig};

const QUOTA_DAILY_LIMIT_ENV: &str = "FEEDBACK_QUOTA_DAILY_LIMIT";
const QUOTA_UTC_OFFSET_ENV: &str = "FEEDBACK_QUOTA_UTC_OFFSET_HOURS";
const RATE_LIMIT_MAX_CALLS_ENV: &str = "FEEDBACK_RATE_LIMIT_MAX_CALLS";
const RATE_LIMIT_WINDOW_ENV: &str = "FEEDBACK_RATE_LIMIT_WINDOW_SECS";
const BREAKER_FAILURE_THRESHOLD_ENV: &str = "FEEDBACK_BREAKER_FAILURE_THRESHOLD";
const BREAKER_COOLDOWN_ENV: &str = "FEEDBACK_BREAKER_COOLDOWN_SECS";
const CACHE_MAX_ENTRIES_ENV: &str = "FEEDBACK_CACHE_MAX_ENTRIES";

/// Every tunable the engine exposes, with defaults applied
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub quota: QuotaConfig,
    pub rate_limit: RateLimitConfig,
    pub breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    pub reasoning: ReasoningConfig,
}

impl EngineConfig {
    /// Assemble configuration from `FEEDBACK_*` environment variables.
    /// Missing or unparseable values fall back to defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let quota_defaults = QuotaConfig::default();
        let quota = QuotaConfig {
            daily_limit: env_parse(QUOTA_DAILY_LIMIT_ENV, quota_defaults.daily_limit),
            utc_offset_hours: env_parse(QUOTA_UTC_OFFSET_ENV, quota_defaults.utc_offset_hours),
        };

        let rate_defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_calls: env_parse(RATE_LIMIT_MAX_CALLS_ENV, rate_defaults.max_calls),
            window: Duration::from_secs(env_parse(
                RATE_LIMIT_WINDOW_ENV,
                rate_defaults.window.as_secs(),
            )),
        };

        let breaker_defaults = CircuitBreakerConfig::default();
        let breaker = CircuitBreakerConfig {
            failure_threshold: env_parse(
                BREAKER_FAILURE_THRESHOLD_ENV,
                breaker_defaults.failure_threshold,
            ),
            cooldown: Duration::from_secs(env_parse(
                BREAKER_COOLDOWN_ENV,
                breaker_defaults.cooldown.as_secs(),
            )),
            success_threshold: breaker_defaults.success_threshold,
        };

        let cache = CacheConfig {
            max_entries: env_parse(CACHE_MAX_ENTRIES_ENV, CacheConfig::default().max_entries),
        };

        Self {
            quota,
            rate_limit,
            breaker,
            cache,
            reasoning: ReasoningConfig::from_env(),
        }
    }
}

/// Parse an environment variable, warning and defaulting on bad input
fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(value = %raw, "Invalid {name}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = EngineConfig::default();
        assert_eq!(config.quota.daily_limit, 4);
        assert_eq!(config.rate_limit.max_calls, 100);
        assert_eq!(config.breaker.failure_threshold, 1);
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        env::set_var("FEEDBACK_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<u32>("FEEDBACK_TEST_GARBAGE", 7), 7);
        env::remove_var("FEEDBACK_TEST_GARBAGE");
    }
}
