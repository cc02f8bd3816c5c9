// ABOUTME: Feedback source abstraction consumed from the collaborating collection service
// ABOUTME: Supplies per-tenant feedback batches and window statistics for rollups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

//! # Feedback Source
//!
//! The engine never owns feedback rows; it reads them through this trait.
//! Implementations typically wrap the collection service's datastore.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{FeedbackItem, FeedbackWindow};

/// Per-tenant activity counters for one trailing window
#[derive(Debug, Clone, Default)]
pub struct TenantWindowStats {
    pub tenant_id: Uuid,
    /// Display name for rollup output
    pub tenant_name: String,
    /// Feedback requests sent to customers in the window
    pub request_count: u32,
    /// Requests that could not be delivered
    pub failed_request_count: u32,
    /// Feedback actually received in the window
    pub feedback: Vec<FeedbackItem>,
    /// Received feedback per delivery channel (email, sms, qr, ...)
    pub channel_counts: HashMap<String, u32>,
}

/// Read-only access to collected feedback
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    /// All feedback items for one tenant within the window
    async fn list_feedback(
        &self,
        tenant_id: Uuid,
        window: &FeedbackWindow,
    ) -> AppResult<Vec<FeedbackItem>>;

    /// Activity statistics for every tenant over the trailing window
    async fn tenant_window_stats(&self, window_days: u32)
        -> AppResult<Vec<TenantWindowStats>>;
}
