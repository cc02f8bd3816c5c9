// ABOUTME: Engine facade wiring quota, cache, resilience, and rollup into three entry points
// ABOUTME: Only quota exhaustion crosses this boundary as an error; all else degrades gracefully
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Feedback Intelligence Engine
//!
//! Library-style facade with three entry points: [`get_analysis`],
//! [`get_actions`], and [`get_rollup`]. Quota gates fresh computations
//! only; a cache hit is always served, even to an exhausted tenant.
//!
//! [`get_analysis`]: FeedbackIntelligenceEngine::get_analysis
//! [`get_actions`]: FeedbackIntelligenceEngine::get_actions
//! [`get_rollup`]: FeedbackIntelligenceEngine::get_rollup

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{AnalysisCache, InMemoryAnalysisStore};
use crate::config::EngineConfig;
use crate::errors::AppResult;
use crate::intelligence::{map_to_actions, Action, PlatformRollup, ReasoningGateway, RiskScorer};
use crate::llm::ReasoningProvider;
use crate::models::{AnalysisOutcome, AnalysisRequest, FeedbackWindow};
use crate::quota::{QuotaGuard, QuotaStatus};
use crate::resilience::ResilientAnalyzer;
use crate::source::FeedbackSource;

/// Multi-tenant feedback analysis engine
pub struct FeedbackIntelligenceEngine {
    source: Arc<dyn FeedbackSource>,
    quota: QuotaGuard,
    cache: AnalysisCache,
    scorer: RiskScorer,
}

impl FeedbackIntelligenceEngine {
    /// Build an engine with default configuration and an in-memory cache
    #[must_use]
    pub fn new(source: Arc<dyn FeedbackSource>, provider: Arc<dyn ReasoningProvider>) -> Self {
        Self::with_config(EngineConfig::default(), source, provider)
    }

    #[must_use]
    pub fn with_config(
        config: EngineConfig,
        source: Arc<dyn FeedbackSource>,
        provider: Arc<dyn ReasoningProvider>,
    ) -> Self {
        let gateway = ReasoningGateway::new(provider);
        let analyzer = Arc::new(ResilientAnalyzer::with_config(
            gateway,
            config.rate_limit,
            config.breaker,
        ));
        let store = Arc::new(InMemoryAnalysisStore::new(&config.cache));
        Self {
            source,
            quota: QuotaGuard::with_config(config.quota),
            cache: AnalysisCache::new(store, analyzer),
            scorer: RiskScorer::new(),
        }
    }

    /// Analyze a tenant's feedback for the window.
    ///
    /// Cache hits are served unconditionally. A cold path reserves quota
    /// up front and refunds it when another in-flight request already
    /// cached the result, so only genuinely fresh computations consume
    /// budget. The only error this returns is quota exhaustion.
    pub async fn get_analysis(
        &self,
        tenant_id: Uuid,
        window: &FeedbackWindow,
    ) -> AppResult<AnalysisOutcome> {
        let items = self.source.list_feedback(tenant_id, window).await?;
        let request = AnalysisRequest::new(tenant_id, items);

        if let Some(hit) = self.cache.lookup(&request).await {
            debug!(tenant_id = %tenant_id, "Serving cached analysis");
            return Ok(hit);
        }

        // Empty batches produce a synthetic result without touching quota
        if request.items.is_empty() {
            return Ok(self.cache.get_or_compute(&request).await);
        }

        // Reserve before computing so concurrent cold requests cannot
        // overshoot the limit; refund if another flight already cached it.
        self.quota.try_consume(tenant_id)?;
        let outcome = self.cache.get_or_compute(&request).await;
        if outcome.cached {
            self.quota.refund(tenant_id);
        } else {
            info!(
                tenant_id = %tenant_id,
                status = ?outcome.result.status,
                "Fresh analysis computed"
            );
        }
        Ok(outcome)
    }

    /// Ranked remediation plan derived from the tenant's current analysis
    pub async fn get_actions(
        &self,
        tenant_id: Uuid,
        window: &FeedbackWindow,
    ) -> AppResult<Vec<Action>> {
        let outcome = self.get_analysis(tenant_id, window).await?;
        Ok(map_to_actions(&outcome.result))
    }

    /// Cross-tenant rollup with risk ranking over the trailing window
    pub async fn get_rollup(&self, window_days: u32) -> AppResult<PlatformRollup> {
        let stats = self.source.tenant_window_stats(window_days).await?;
        Ok(self.scorer.build_rollup(window_days, &stats))
    }

    /// Current quota snapshot for a tenant, without consuming anything
    #[must_use]
    pub fn quota_status(&self, tenant_id: Uuid) -> QuotaStatus {
        self.quota.check(tenant_id)
    }
}
