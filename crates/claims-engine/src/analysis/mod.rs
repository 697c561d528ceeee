//! Analyses over processed tables.
//!
//! [`AnalysisEngine`] owns the read-only configuration and exposes one
//! operation per analysis:
//! - Rejection statistics per table and pooled across tables
//! - Per-period trends at a chosen granularity
//! - Cross-table pattern buckets with commonalities and differences
//! - Cross-table metric rankings
//! - A per-table quality report
//!
//! Every operation is a pure function of its inputs; the engine can be shared
//! between threads without locking.

pub mod comparison;
pub mod pattern;
pub mod quality;
pub mod rejection;
pub mod trend;

pub use comparison::{
    ComparisonAnalysis, ComparisonAnalyzer, ComparisonMetric, MetricRanking, RankedTable,
    SchemaComparison, TableMetric,
};
pub use pattern::{
    PatternAnalysis, PatternAnalyzer, PatternDifference, PatternGroup, PatternType, TablePattern,
};
pub use quality::QualityAnalysis;
pub use rejection::{RejectionAnalysis, RejectionAnalyzer, ReasonSummary};
pub use trend::{PeriodStats, TrendAnalysis, TrendMetric};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ingest::{InferenceRules, infer_column_types, ingest};
use crate::quality::QualityScorer;
use crate::resolver::FieldResolver;
use crate::taxonomy::Granularity;
use crate::types::{Insight, ProcessedTable, RawTable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, warn};

// ============================================================================
// Options
// ============================================================================

/// How much of the analysis suite [`AnalysisEngine::run`] executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Rejection and quality per table.
    Basic,
    /// Basic plus trends per table, pooled rejections, patterns and comparison.
    #[default]
    Comprehensive,
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AnalysisType::Basic),
            "comprehensive" => Ok(AnalysisType::Comprehensive),
            other => Err(format!("unknown analysis type '{}'", other)),
        }
    }
}

/// Caller-supplied options for [`AnalysisEngine::run`].
///
/// Pattern types and metrics are plain strings as they arrive from callers;
/// unknown entries are skipped with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub analysis_type: AnalysisType,
    pub granularity: Granularity,
    pub pattern_types: Vec<String>,
    pub comparison_metrics: Vec<String>,
    pub trend_metrics: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::default(),
            granularity: Granularity::default(),
            pattern_types: PatternType::ALL.iter().map(|p| p.to_string()).collect(),
            comparison_metrics: ComparisonMetric::ALL.iter().map(|m| m.to_string()).collect(),
            trend_metrics: vec![
                TrendMetric::Claims.to_string(),
                TrendMetric::Rejections.to_string(),
            ],
        }
    }
}

/// Parse option strings, dropping the ones that are not recognised.
fn parse_known<T>(values: &[String], kind: &str) -> Vec<T>
where
    T: FromStr<Err = String> + PartialEq,
{
    let mut parsed = Vec::new();
    for value in values {
        match value.parse::<T>() {
            Ok(v) if !parsed.contains(&v) => parsed.push(v),
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", kind, e),
        }
    }
    parsed
}

impl AnalysisOptions {
    pub fn pattern_types(&self) -> Vec<PatternType> {
        parse_known(&self.pattern_types, "pattern type")
    }

    pub fn comparison_metrics(&self) -> Vec<ComparisonMetric> {
        parse_known(&self.comparison_metrics, "comparison metric")
    }

    pub fn trend_metrics(&self) -> Vec<TrendMetric> {
        parse_known(&self.trend_metrics, "trend metric")
    }
}

// ============================================================================
// Results
// ============================================================================

/// One analysis outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisResult {
    Rejection(RejectionAnalysis),
    Trend(TrendAnalysis),
    Pattern(PatternAnalysis),
    Quality(QualityAnalysis),
    Comparison(ComparisonAnalysis),
}

impl AnalysisResult {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisResult::Rejection(_) => "rejection",
            AnalysisResult::Trend(_) => "trend",
            AnalysisResult::Pattern(_) => "pattern",
            AnalysisResult::Quality(_) => "quality",
            AnalysisResult::Comparison(_) => "comparison",
        }
    }

    pub fn insights(&self) -> &[Insight] {
        match self {
            AnalysisResult::Rejection(r) => &r.insights,
            AnalysisResult::Trend(r) => &r.insights,
            AnalysisResult::Pattern(r) => &r.insights,
            AnalysisResult::Quality(r) => &r.insights,
            AnalysisResult::Comparison(r) => &r.insights,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Entry point for processing sheets and running analyses.
///
/// # Example
///
/// ```rust,ignore
/// use claims_engine::{AnalysisEngine, AnalysisOptions, RawTable};
///
/// let engine = AnalysisEngine::default();
/// let table = engine.process_table(&RawTable::new("claims", rows));
/// let results = engine.run(&[table], &AnalysisOptions::default())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: EngineConfig,
}

static_assertions::assert_impl_all!(AnalysisEngine: Send, Sync);
static_assertions::assert_impl_all!(ProcessedTable: Send, Sync);
static_assertions::assert_impl_all!(AnalysisResult: Send, Sync);

impl AnalysisEngine {
    /// Create an engine, validating the configuration first.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ingest a raw grid, infer column types and score its quality.
    pub fn process_table(&self, raw: &RawTable) -> ProcessedTable {
        let (schema, records) = ingest(raw);
        let column_types = infer_column_types(&schema, &records, &InferenceRules::from(&self.config));
        let quality = QualityScorer::new(self.config.consistency_threshold).score(
            &schema,
            &records,
            &column_types,
        );

        info!(
            "Processed '{}': {} records, {} columns, quality {:.1}",
            raw.name,
            records.len(),
            schema.len(),
            quality.composite_score
        );

        ProcessedTable {
            name: raw.name.clone(),
            record_count: records.len(),
            column_count: schema.len(),
            headers: schema.headers,
            column_types,
            records,
            quality,
        }
    }

    pub fn analyze_rejections(&self, table: &ProcessedTable) -> RejectionAnalysis {
        RejectionAnalyzer::new(&self.config).analyze(table)
    }

    /// Rejection analysis over the records of all tables together.
    pub fn aggregate_rejections(&self, tables: &[ProcessedTable]) -> RejectionAnalysis {
        RejectionAnalyzer::new(&self.config).aggregate(tables)
    }

    pub fn analyze_trends(
        &self,
        table: &ProcessedTable,
        granularity: Granularity,
        metrics: &[TrendMetric],
    ) -> TrendAnalysis {
        trend::analyze_trends(
            FieldResolver::new(&self.config.aliases),
            table,
            granularity,
            metrics,
        )
    }

    pub fn analyze_patterns(
        &self,
        tables: &[ProcessedTable],
        pattern_types: &[PatternType],
    ) -> PatternAnalysis {
        PatternAnalyzer::new(&self.config).analyze(tables, pattern_types)
    }

    pub fn compare_datasets(
        &self,
        tables: &[ProcessedTable],
        metrics: &[ComparisonMetric],
    ) -> ComparisonAnalysis {
        ComparisonAnalyzer::new(&self.config).compare(tables, metrics)
    }

    pub fn analyze_quality(&self, table: &ProcessedTable) -> Result<QualityAnalysis> {
        quality::analyze_quality(&self.config, table)
    }

    /// Run the analyses selected by `options` over the given tables.
    ///
    /// Per-table results come first in table order, followed by the
    /// cross-table results of a comprehensive run.
    pub fn run(
        &self,
        tables: &[ProcessedTable],
        options: &AnalysisOptions,
    ) -> Result<Vec<AnalysisResult>> {
        info!(
            "Running {:?} analysis over {} tables",
            options.analysis_type,
            tables.len()
        );

        let comprehensive = options.analysis_type == AnalysisType::Comprehensive;
        let trend_metrics = options.trend_metrics();
        let mut results = Vec::new();

        for table in tables {
            results.push(AnalysisResult::Rejection(self.analyze_rejections(table)));
            results.push(AnalysisResult::Quality(self.analyze_quality(table)?));

            if comprehensive {
                if trend_metrics.is_empty() {
                    warn!("No usable trend metrics, skipping trends for '{}'", table.name);
                } else {
                    results.push(AnalysisResult::Trend(self.analyze_trends(
                        table,
                        options.granularity,
                        &trend_metrics,
                    )));
                }
            }
        }

        if comprehensive && !tables.is_empty() {
            results.push(AnalysisResult::Rejection(self.aggregate_rejections(tables)));

            let pattern_types = options.pattern_types();
            if pattern_types.is_empty() {
                warn!("No usable pattern types, skipping pattern analysis");
            } else {
                results.push(AnalysisResult::Pattern(
                    self.analyze_patterns(tables, &pattern_types),
                ));
            }

            let metrics = options.comparison_metrics();
            if metrics.is_empty() {
                warn!("No usable comparison metrics, skipping comparison");
            } else {
                results.push(AnalysisResult::Comparison(
                    self.compare_datasets(tables, &metrics),
                ));
            }
        }

        debug!("Produced {} analysis results", results.len());
        Ok(results)
    }
}
