//! Fixed classification tables.
//!
//! This module provides the lookup data shared by the analyzers:
//! - Rejection reason categories driven by keyword phrases
//! - The monetary range ladder
//! - Period keys for time bucketing and the trend-direction rule
//!
//! All tables are plain data owned by [`crate::config::EngineConfig`] and
//! injected into the analyzers; nothing here is global state.

mod buckets;
mod categories;
mod periods;

pub use buckets::{AmountBand, AmountLadder};
pub use categories::{CategoryKeywords, RejectionCategory, RejectionTaxonomy};
pub use periods::{Granularity, TrendDirection, period_key};
