//! Data quality scoring and validation.
//!
//! This module provides:
//! - Completeness, validity and consistency scores with their composite
//! - A per-column quality breakdown
//! - A rule-based validation report with issues, warnings and recommendations

mod scorer;
pub mod validation;

pub use scorer::{ColumnQuality, QualityScorer, ValidityRule};
pub use validation::{ValidationReport, validate};
