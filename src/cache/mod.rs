// ABOUTME: Content-addressable analysis cache with single-flight computation per key
// ABOUTME: Defines the content hash, cached row shape, and pluggable store trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Analysis Cache
//!
//! Content-addressable store keyed by a digest of the feedback set's
//! identity. Two requests with the same tenant and the same set of item ids
//! hit the same row regardless of item order; adding or removing an item
//! changes the key. Concurrent misses on the same key are collapsed to one
//! upstream invocation by a per-key single-flight lock, and a row only
//! becomes visible after its result is fully computed - readers never see a
//! partial write. This component never fails outward: the resilience layer
//! below it always hands back a valid (possibly degraded) result to persist.

/// In-memory store implementation
pub mod memory;

pub use memory::InMemoryAnalysisStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::cache;
use crate::errors::AppResult;
use crate::models::{AnalysisOutcome, AnalysisRequest, AnalysisResult};
use crate::resilience::ResilientAnalyzer;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum cached analyses held across all tenants
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: cache::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Digest over the identity of a feedback set
///
/// Computed from the tenant id plus the sorted, de-duplicated item ids -
/// identity, not content. Editing the rating or comment of an existing item
/// does NOT change the hash, so a cached analysis will not reflect such an
/// edit until the item set itself changes. This is a deliberate
/// cost/staleness trade-off: it avoids re-analysis storms from comment
/// edits at the price of potentially stale cached analyses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Compute the hash for a tenant's feedback set
    #[must_use]
    pub fn compute(tenant_id: Uuid, item_ids: &[i64]) -> Self {
        let mut ids: Vec<i64> = item_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut hasher = Sha256::new();
        hasher.update(tenant_id.as_bytes());
        for id in ids {
            hasher.update(id.to_le_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Hash for an analysis request
    #[must_use]
    pub fn of_request(request: &AnalysisRequest) -> Self {
        let ids: Vec<i64> = request.items.iter().map(|i| i.id).collect();
        Self::compute(request.tenant_id, &ids)
    }

    /// Hex digest string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable cached analysis row
///
/// Never mutated after creation. A changed item set writes a new row under a
/// new hash; prior rows are superseded, not deleted (the bounded store may
/// evict them under pressure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnalysis {
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Identity digest of the analyzed item set
    pub content_hash: ContentHash,
    /// Number of items analyzed
    pub item_count: u32,
    /// The stored analysis
    pub result: AnalysisResult,
    /// When the analysis was computed
    pub computed_at: DateTime<Utc>,
}

/// Pluggable storage backend for cached analyses
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Fetch the row for (tenant, hash), if present
    ///
    /// # Errors
    ///
    /// Returns an error if the backend lookup fails.
    async fn get(&self, tenant_id: Uuid, hash: &ContentHash) -> AppResult<Option<CachedAnalysis>>;

    /// Store a row, superseding any prior row under the same key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    async fn put(&self, row: CachedAnalysis) -> AppResult<()>;

    /// Remove every row (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if the clear operation fails.
    async fn clear_all(&self) -> AppResult<()>;
}

/// Content-addressable cache in front of the resilience wrapper
pub struct AnalysisCache {
    store: Arc<dyn AnalysisStore>,
    analyzer: Arc<ResilientAnalyzer>,
    /// Per-(tenant, hash) locks collapsing concurrent misses to one computation
    flights: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl AnalysisCache {
    /// Create a cache over the given store and analyzer
    #[must_use]
    pub fn new(store: Arc<dyn AnalysisStore>, analyzer: Arc<ResilientAnalyzer>) -> Self {
        Self {
            store,
            analyzer,
            flights: DashMap::new(),
        }
    }

    /// Look up a cached analysis without computing on miss
    ///
    /// Returns `None` for empty item sets as well: those are never cached.
    pub async fn lookup(&self, request: &AnalysisRequest) -> Option<AnalysisOutcome> {
        if request.items.is_empty() {
            return None;
        }
        let hash = ContentHash::of_request(request);
        self.fetch(request.tenant_id, &hash).await.map(|row| {
            debug!(tenant_id = %request.tenant_id, hash = %hash, "Analysis cache hit");
            AnalysisOutcome {
                result: row.result,
                cached: true,
                computed_at: row.computed_at,
            }
        })
    }

    /// Serve the cached analysis for this request, computing it on miss
    ///
    /// Empty input short-circuits to a fixed synthetic fallback that is never
    /// cached and never reaches the resilience wrapper. On a miss the caller
    /// entering the single-flight first computes and stores; concurrent
    /// callers wait and then observe the stored row. If the caller is
    /// cancelled mid-computation nothing is written - the row is either
    /// complete and visible or absent entirely.
    pub async fn get_or_compute(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        if request.items.is_empty() {
            debug!(tenant_id = %request.tenant_id, "Empty feedback set, synthetic fallback");
            return AnalysisOutcome {
                result: AnalysisResult::empty_input(),
                cached: false,
                computed_at: Utc::now(),
            };
        }

        let hash = ContentHash::of_request(request);
        let flight_key = format!("{}:{}", request.tenant_id, hash);
        let flight = self
            .flights
            .entry(flight_key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = flight.lock().await;

        // Re-check under the flight lock: a concurrent caller may have
        // stored the row while we waited.
        if let Some(row) = self.fetch(request.tenant_id, &hash).await {
            debug!(tenant_id = %request.tenant_id, hash = %hash, "Analysis cache hit");
            return AnalysisOutcome {
                result: row.result,
                cached: true,
                computed_at: row.computed_at,
            };
        }

        debug!(tenant_id = %request.tenant_id, hash = %hash, "Analysis cache miss, computing");
        let result = self.analyzer.invoke(request).await;
        let computed_at = Utc::now();

        let row = CachedAnalysis {
            tenant_id: request.tenant_id,
            content_hash: hash,
            item_count: request.items.len() as u32,
            result: result.clone(),
            computed_at,
        };
        if let Err(e) = self.store.put(row).await {
            // A failed write degrades to a cache miss next time; the caller
            // still gets a valid result.
            warn!(tenant_id = %request.tenant_id, error = %e, "Failed to store analysis");
        }

        self.flights.remove(&flight_key);

        AnalysisOutcome {
            result,
            cached: false,
            computed_at,
        }
    }

    async fn fetch(&self, tenant_id: Uuid, hash: &ContentHash) -> Option<CachedAnalysis> {
        match self.store.get(tenant_id, hash).await {
            Ok(row) => row,
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Analysis store lookup failed");
                None
            }
        }
    }
}
