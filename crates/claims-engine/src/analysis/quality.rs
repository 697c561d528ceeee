//! Quality report for one processed table.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::profiler::{DatasetProfile, DatasetProfiler};
use crate::quality::{ColumnQuality, QualityScorer, ValidationReport, validate};
use crate::types::{Insight, InsightCategory, ProcessedTable, QualityMetrics, Severity};
use serde::Serialize;

const LOW_COMPOSITE: f64 = 70.0;
const LOW_COMPLETENESS: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAnalysis {
    pub source: String,
    /// The metrics stored on the table at processing time.
    pub metrics: QualityMetrics,
    pub columns: Vec<ColumnQuality>,
    pub validation: ValidationReport,
    pub profile: DatasetProfile,
    pub insights: Vec<Insight>,
}

pub fn analyze_quality(config: &EngineConfig, table: &ProcessedTable) -> Result<QualityAnalysis> {
    let columns = QualityScorer::new(config.consistency_threshold).score_columns(
        &table.schema(),
        &table.records,
        &table.column_types,
    );
    let validation = validate(table, &config.aliases);
    let profile = DatasetProfiler::profile(table)?;
    let insights = insights(&table.quality, &columns);

    Ok(QualityAnalysis {
        source: table.name.clone(),
        metrics: table.quality,
        columns,
        validation,
        profile,
        insights,
    })
}

fn insights(metrics: &QualityMetrics, columns: &[ColumnQuality]) -> Vec<Insight> {
    let mut insights = Vec::new();

    if metrics.composite_score < LOW_COMPOSITE {
        insights.push(
            Insight::new(
                InsightCategory::Quality,
                Severity::High,
                "Low data quality",
                format!(
                    "Composite quality score is {:.1} (completeness {:.1}, validity {:.1}, consistency {:.1})",
                    metrics.composite_score,
                    metrics.completeness,
                    metrics.validity,
                    metrics.consistency
                ),
            )
            .with_confidence(0.9)
            .actionable(),
        );
    }

    if metrics.completeness < LOW_COMPLETENESS {
        insights.push(
            Insight::new(
                InsightCategory::Quality,
                Severity::Medium,
                "Incomplete data",
                format!("Only {:.1}% of cells are filled", metrics.completeness),
            )
            .with_confidence(0.9)
            .actionable(),
        );
    }

    let inconsistent: Vec<&str> = columns
        .iter()
        .filter(|c| !c.consistent)
        .map(|c| c.name.as_str())
        .collect();
    if !inconsistent.is_empty() {
        insights.push(
            Insight::new(
                InsightCategory::Quality,
                Severity::Low,
                "Inconsistent columns",
                format!(
                    "Values do not consistently match the inferred type in: {}",
                    inconsistent.join(", ")
                ),
            )
            .with_confidence(0.7)
            .actionable(),
        );
    }

    insights
}
