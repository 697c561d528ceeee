//! Claims Analysis Engine Library
//!
//! A heuristic analysis engine for healthcare-insurance claim spreadsheets
//! whose column naming is unknown and inconsistent.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Ingestion**: Raw cell grids become header-keyed records with inferred column types
//! - **Field Resolution**: Arbitrary column labels are matched to business concepts
//!   (amount, date, provider, status, ...) through configurable alias lists
//! - **Quality Scoring**: Completeness, validity and consistency, plus a rule-based
//!   validation report
//! - **Analytics**: Rejection statistics, period trends, cross-table patterns and
//!   metric rankings, each with rule-derived insights
//! - **Profiling**: Dataset kind detection and numeric column statistics
//!
//! The core performs no I/O. The [`source`] module loads CSV or JSON grids for
//! callers that start from files.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use claims_engine::{AnalysisEngine, AnalysisOptions, EngineConfig, source};
//! use std::path::Path;
//!
//! let engine = AnalysisEngine::new(EngineConfig::default())?;
//!
//! let raw = source::load_csv(Path::new("claims.csv"))?;
//! let table = engine.process_table(&raw);
//! println!("Quality: {:.1}", table.quality.composite_score);
//!
//! let results = engine.run(&[table], &AnalysisOptions::default())?;
//! for result in &results {
//!     for insight in result.insights() {
//!         println!("[{}] {}: {}", insight.severity, insight.title, insight.description);
//!     }
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`EngineConfig`] to customize aliases, the rejection taxonomy, the
//! amount ladder and the inference thresholds:
//!
//! ```rust,ignore
//! use claims_engine::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .type_sample_size(50)
//!     .number_threshold(0.9)
//!     .high_rejection_rate(15.0)
//!     .build()?;
//! ```
//!
//! # Concurrency
//!
//! Every analysis is a pure function over immutable inputs. [`AnalysisEngine`],
//! [`ProcessedTable`] and [`AnalysisResult`] are `Send + Sync`, so whole-table
//! processing or whole analyses can be dispatched onto worker threads.

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod resolver;
pub mod source;
pub mod taxonomy;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analysis::{
    AnalysisEngine, AnalysisOptions, AnalysisResult, AnalysisType, ComparisonAnalysis,
    ComparisonMetric, PatternAnalysis, PatternType, QualityAnalysis, RejectionAnalysis,
    TrendAnalysis, TrendMetric,
};
pub use config::{ConfigValidationError, EngineConfig, EngineConfigBuilder};
pub use error::{AnalysisError, Result as EngineResult, ResultExt};
pub use ingest::{InferenceRules, infer_column_types, infer_type, ingest};
pub use profiler::{DatasetKind, DatasetProfile, DatasetProfiler, NumericStatistics};
pub use quality::{ColumnQuality, QualityScorer, ValidationReport};
pub use reporting::{AnalysisReport, ReportGenerator};
pub use resolver::{FieldAliases, FieldConcept, FieldResolver, field_matches, resolve, resolve_non_empty};
pub use taxonomy::{
    AmountLadder, Granularity, RejectionCategory, RejectionTaxonomy, TrendDirection, period_key,
};
pub use types::{
    Insight, InsightCategory, InferredType, PatternBucket, ProcessedTable, QualityMetrics,
    RawTable, Record, Schema, Severity, Value,
};
pub use utils::{parse_date, parse_number, parse_numeric_string};
