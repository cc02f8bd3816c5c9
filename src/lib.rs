// ABOUTME: Main library entry point for the multi-tenant feedback intelligence engine
// ABOUTME: Quota-gated, cached, resilience-wrapped analysis with heuristic fallback and risk rollups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Feedback Intelligence contributors

#![deny(unsafe_code)]

//! # Feedback Intelligence
//!
//! A library-style engine that turns batches of customer feedback into
//! normalized analyses, ranked remediation plans, and cross-tenant risk
//! rollups. Analysis is an enrichment feature: every upstream failure is
//! absorbed into a degraded-but-valid fallback result, and only daily
//! quota exhaustion ever crosses the engine boundary as an error.
//!
//! ## Architecture
//!
//! - **Engine**: the facade exposing `get_analysis`, `get_actions`, and
//!   `get_rollup`
//! - **Quota**: per-tenant daily budget for fresh computations; cache
//!   hits are always free
//! - **Cache**: content-addressable analysis store keyed by a digest of
//!   the feedback item identity set
//! - **Resilience**: per-tenant rate limiting and a global circuit
//!   breaker in front of the reasoning upstream
//! - **Intelligence**: reasoning gateway, deterministic heuristic
//!   fallback, insight-to-action mapping, and risk scoring
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use feedback_intelligence::config::EngineConfig;
//! use feedback_intelligence::engine::FeedbackIntelligenceEngine;
//! use feedback_intelligence::llm::HttpReasoningProvider;
//! # use feedback_intelligence::source::FeedbackSource;
//!
//! # fn source() -> Arc<dyn FeedbackSource> { unimplemented!() }
//! # fn main() -> anyhow::Result<()> {
//! let provider = Arc::new(HttpReasoningProvider::from_env()?);
//! let engine =
//!     FeedbackIntelligenceEngine::with_config(EngineConfig::from_env(), source(), provider);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod intelligence;
pub mod llm;
pub mod logging;
pub mod models;
pub mod quota;
pub mod resilience;
pub mod source;
