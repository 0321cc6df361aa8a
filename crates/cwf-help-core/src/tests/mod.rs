//! Test module for cwf-help-core
//!
//! This module contains tests for:
//! - Topic history invariants under arbitrary navigation
//! - Help viewer command handling, tabs and content tracking
//! - The viewer proxy: buffering, launching, connecting and closing
//! - The per-page viewer manager
//! - Search indexing, persistence and ranking
//! - Configuration loading and defaults

// Test modules use exact float comparisons
#![allow(clippy::float_cmp)]

mod history_tests;
mod proxy_tests;
