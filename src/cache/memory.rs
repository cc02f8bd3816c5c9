// ABOUTME: Bounded in-memory analysis store with LRU eviction
// ABOUTME: Default backend for the content-addressable analysis cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AnalysisStore, CacheConfig, CachedAnalysis, ContentHash};
use crate::errors::AppResult;

/// In-memory analysis store with LRU eviction
///
/// Rows are immutable once written; superseded rows (older hashes for the
/// same tenant) stay resident until LRU pressure evicts them. The write
/// lock spans each whole operation, so a row is either fully visible or
/// absent - never partial.
#[derive(Clone)]
pub struct InMemoryAnalysisStore {
    rows: Arc<RwLock<LruCache<String, CachedAnalysis>>>,
}

impl InMemoryAnalysisStore {
    /// Fallback capacity when config specifies zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a store with the given configuration
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            rows: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    fn row_key(tenant_id: Uuid, hash: &ContentHash) -> String {
        format!("tenant:{tenant_id}:analysis:{hash}")
    }
}

impl Default for InMemoryAnalysisStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn get(&self, tenant_id: Uuid, hash: &ContentHash) -> AppResult<Option<CachedAnalysis>> {
        // LruCache::get is mutable (updates recency), so take the write lock
        let mut rows = self.rows.write().await;
        Ok(rows.get(&Self::row_key(tenant_id, hash)).cloned())
    }

    async fn put(&self, row: CachedAnalysis) -> AppResult<()> {
        let key = Self::row_key(row.tenant_id, &row.content_hash);
        self.rows.write().await.push(key, row);
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.rows.write().await.clear();
        Ok(())
    }
}
