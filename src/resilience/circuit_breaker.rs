// ABOUTME: Circuit breaker guarding the external reasoning service
// ABOUTME: Fails fast during a cool-down window instead of hammering a known-bad upstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Circuit Breaker
//!
//! One breaker instance guards one upstream dependency and is shared by
//! every tenant: an upstream outage is a property of the upstream, not of
//! the caller. All state lives in atomics so the hot path (check-and-skip)
//! never takes a lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::constants::breaker;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests pass through
    Closed,
    /// Circuit is tripped - requests are skipped immediately
    Open,
    /// Testing recovery - allowing one request through
    HalfOpen,
}

impl CircuitState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::HalfOpen,
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Cool-down before a recovery attempt is allowed
    pub cooldown: Duration,
    /// Successes required in half-open state before the circuit closes
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: breaker::FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(breaker::COOLDOWN_SECS),
            success_threshold: breaker::SUCCESS_THRESHOLD,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new circuit breaker configuration
    #[must_use]
    pub const fn new(failure_threshold: u32, cooldown: Duration, success_threshold: u32) -> Self {
        Self {
            failure_threshold,
            cooldown,
            success_threshold,
        }
    }
}

/// Thread-safe circuit breaker for the reasoning upstream
///
/// # States
///
/// - **Closed**: normal operation, requests pass through; failures counted.
/// - **Open**: circuit tripped; all requests skipped until the cool-down
///   elapses.
/// - **Half-Open**: after the cool-down, one request is allowed through to
///   test recovery.
///
/// # Thread Safety
///
/// All state is managed with atomic operations. Concurrent failures racing
/// to set the trip timestamp resolve last-writer-wins; exact cool-down
/// timing is not safety-critical.
pub struct CircuitBreaker {
    /// Upstream name for logging
    upstream_name: String,
    /// Current state (0=Closed, 1=Open, 2=HalfOpen)
    state: AtomicU32,
    /// Count of consecutive failures
    failure_count: AtomicU32,
    /// Count of consecutive successes in half-open state
    success_count: AtomicU32,
    /// Elapsed millis (from start_instant) when the circuit last tripped
    last_failure_time: AtomicU64,
    /// Elapsed millis when the current recovery attempt was admitted
    half_open_since: AtomicU64,
    config: CircuitBreakerConfig,
    /// Start time for calculating elapsed durations
    start_instant: Instant,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default configuration
    #[must_use]
    pub fn new(upstream_name: &str) -> Self {
        Self::with_config(upstream_name, CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom configuration
    #[must_use]
    pub fn with_config(upstream_name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream_name: upstream_name.to_owned(),
            state: AtomicU32::new(CircuitState::Closed.to_u8().into()),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            last_failure_time: AtomicU64::new(0),
            half_open_since: AtomicU64::new(0),
            config,
            start_instant: Instant::now(),
        }
    }

    /// Get current circuit state
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::SeqCst) as u8)
    }

    /// Get current failure count
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::SeqCst)
    }

    /// Check if the circuit allows a request
    ///
    /// An open circuit whose cool-down has elapsed transitions to half-open
    /// and admits exactly one caller (the CAS winner). A half-open circuit
    /// whose admitted caller never reported back (e.g. its future was
    /// dropped) re-admits one caller per cool-down, so the breaker cannot
    /// wedge.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => self.should_attempt_recovery(),
            // One request at a time in half-open, time-boxed by the cool-down
            CircuitState::HalfOpen => self.retry_stale_half_open(),
        }
    }

    fn should_attempt_recovery(&self) -> bool {
        let last_failure = self.last_failure_time.load(Ordering::SeqCst);
        let elapsed_ms = self.elapsed_millis();
        // Cool-downs are minutes at most, well within u64 millis
        #[allow(clippy::cast_possible_truncation)]
        let cooldown_ms = self.config.cooldown.as_millis() as u64;

        if elapsed_ms.saturating_sub(last_failure) >= cooldown_ms {
            let expected = CircuitState::Open.to_u8().into();
            let new_state = CircuitState::HalfOpen.to_u8().into();
            if self
                .state
                .compare_exchange(expected, new_state, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.half_open_since.store(elapsed_ms, Ordering::SeqCst);
                info!(
                    upstream = %self.upstream_name,
                    "Circuit breaker transitioning to half-open for recovery test"
                );
                return true;
            }
        }
        false
    }

    /// Re-admit one caller if the current half-open attempt went stale
    ///
    /// The admitted caller normally resolves half-open via `record_success`
    /// or `record_failure`. If neither arrives within a cool-down, the slot
    /// is reclaimed by CAS-ing the admission timestamp forward, which again
    /// admits exactly one winner.
    fn retry_stale_half_open(&self) -> bool {
        let admitted_at = self.half_open_since.load(Ordering::SeqCst);
        let elapsed_ms = self.elapsed_millis();
        #[allow(clippy::cast_possible_truncation)]
        let cooldown_ms = self.config.cooldown.as_millis() as u64;

        if elapsed_ms.saturating_sub(admitted_at) < cooldown_ms {
            return false;
        }
        let reclaimed = self
            .half_open_since
            .compare_exchange(admitted_at, elapsed_ms, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if reclaimed {
            warn!(
                upstream = %self.upstream_name,
                "Circuit breaker recovery test went unanswered - re-admitting one caller"
            );
        }
        reclaimed
    }

    fn elapsed_millis(&self) -> u64 {
        #[allow(clippy::cast_possible_truncation)]
        {
            self.start_instant.elapsed().as_millis() as u64
        }
    }

    /// Record a successful upstream call
    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::SeqCst);
            }
            CircuitState::HalfOpen => {
                let count = self.success_count.fetch_add(1, Ordering::SeqCst) + 1;
                if count >= self.config.success_threshold {
                    self.state
                        .store(CircuitState::Closed.to_u8().into(), Ordering::SeqCst);
                    self.failure_count.store(0, Ordering::SeqCst);
                    self.success_count.store(0, Ordering::SeqCst);
                    info!(
                        upstream = %self.upstream_name,
                        "Circuit breaker closed - upstream recovered"
                    );
                }
            }
            CircuitState::Open => {
                // A success while open means another caller recovered first
            }
        }
    }

    /// Record a failed upstream call
    pub fn record_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
                if count >= self.config.failure_threshold {
                    self.state
                        .store(CircuitState::Open.to_u8().into(), Ordering::SeqCst);
                    self.last_failure_time
                        .store(self.elapsed_millis(), Ordering::SeqCst);
                    warn!(
                        upstream = %self.upstream_name,
                        failures = count,
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "Circuit breaker opened - upstream failing"
                    );
                }
            }
            CircuitState::HalfOpen => {
                self.state
                    .store(CircuitState::Open.to_u8().into(), Ordering::SeqCst);
                self.last_failure_time
                    .store(self.elapsed_millis(), Ordering::SeqCst);
                self.success_count.store(0, Ordering::SeqCst);
                warn!(
                    upstream = %self.upstream_name,
                    "Circuit breaker re-opened - recovery test failed"
                );
            }
            CircuitState::Open => {
                self.last_failure_time
                    .store(self.elapsed_millis(), Ordering::SeqCst);
            }
        }
    }

    /// Seconds remaining until a recovery attempt is allowed
    #[must_use]
    pub fn secs_until_recovery(&self) -> u64 {
        let last_failure = self.last_failure_time.load(Ordering::SeqCst);
        let elapsed = self.elapsed_millis();
        #[allow(clippy::cast_possible_truncation)]
        let cooldown_ms = self.config.cooldown.as_millis() as u64;

        let since_failure = elapsed.saturating_sub(last_failure);
        cooldown_ms.saturating_sub(since_failure).div_ceil(1000)
    }

    /// Force reset the circuit to closed
    ///
    /// For tests and manual operator intervention only.
    pub fn reset(&self) {
        self.state
            .store(CircuitState::Closed.to_u8().into(), Ordering::SeqCst);
        self.failure_count.store(0, Ordering::SeqCst);
        self.success_count.store(0, Ordering::SeqCst);
        info!(
            upstream = %self.upstream_name,
            "Circuit breaker manually reset to closed"
        );
    }
}
