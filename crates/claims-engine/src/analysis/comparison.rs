//! Per-table summary metrics, rankings and schema overlap.

use super::rejection::RejectionAnalyzer;
use crate::config::EngineConfig;
use crate::resolver::FieldResolver;
use crate::types::{Insight, InsightCategory, ProcessedTable, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Composite quality spread (points) above which tables are flagged as uneven.
const QUALITY_GAP: f64 = 20.0;

/// Rejection-rate spread (percentage points) above which tables are flagged.
const REJECTION_RATE_GAP: f64 = 10.0;

/// Scalar computed once per table for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Record count.
    Volume,
    /// Composite quality score.
    Quality,
    Completeness,
    Validity,
    Consistency,
    RejectionRate,
    /// Sum of resolved amounts over all records.
    TotalAmount,
    /// Mean resolved amount over records with an amount.
    AverageAmount,
    /// Sum of resolved amounts over rejected records.
    RejectedAmount,
}

impl ComparisonMetric {
    pub const ALL: [ComparisonMetric; 9] = [
        ComparisonMetric::Volume,
        ComparisonMetric::Quality,
        ComparisonMetric::Completeness,
        ComparisonMetric::Validity,
        ComparisonMetric::Consistency,
        ComparisonMetric::RejectionRate,
        ComparisonMetric::TotalAmount,
        ComparisonMetric::AverageAmount,
        ComparisonMetric::RejectedAmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMetric::Volume => "volume",
            ComparisonMetric::Quality => "quality",
            ComparisonMetric::Completeness => "completeness",
            ComparisonMetric::Validity => "validity",
            ComparisonMetric::Consistency => "consistency",
            ComparisonMetric::RejectionRate => "rejection_rate",
            ComparisonMetric::TotalAmount => "total_amount",
            ComparisonMetric::AverageAmount => "average_amount",
            ComparisonMetric::RejectedAmount => "rejected_amount",
        }
    }
}

impl fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ComparisonMetric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown comparison metric '{}'", wanted))
    }
}

/// Metric value of one table, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetric {
    pub table: String,
    pub value: f64,
}

/// One position of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    /// 1-based.
    pub rank: usize,
    pub table: String,
    pub value: f64,
    /// Leader's value minus this table's value.
    pub delta_from_leader: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRanking {
    pub metric: ComparisonMetric,
    pub values: Vec<TableMetric>,
    /// Descending by value; equal values keep input order.
    pub ranking: Vec<RankedTable>,
    pub spread: f64,
    pub mean: f64,
}

impl MetricRanking {
    pub fn leader(&self) -> Option<&RankedTable> {
        self.ranking.first()
    }
}

/// Header overlap between tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaComparison {
    /// Headers present in every table, in the first table's order.
    pub common_headers: Vec<String>,
    /// Headers found in exactly one table, keyed by table name.
    pub unique_headers: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonAnalysis {
    pub table_count: usize,
    pub tables: Vec<String>,
    pub metrics: Vec<MetricRanking>,
    pub schema: SchemaComparison,
    pub insights: Vec<Insight>,
}

/// Rank `values` descending; the sort is stable so ties keep input order.
pub fn rank(metric: ComparisonMetric, values: Vec<TableMetric>) -> MetricRanking {
    let mut ordered: Vec<&TableMetric> = values.iter().collect();
    ordered.sort_by(|a, b| b.value.total_cmp(&a.value));

    let leader_value = ordered.first().map(|t| t.value).unwrap_or(0.0);
    let ranking = ordered
        .iter()
        .enumerate()
        .map(|(idx, t)| RankedTable {
            rank: idx + 1,
            table: t.table.clone(),
            value: t.value,
            delta_from_leader: leader_value - t.value,
        })
        .collect::<Vec<_>>();

    let spread = match (ordered.first(), ordered.last()) {
        (Some(max), Some(min)) => max.value - min.value,
        _ => 0.0,
    };
    let mean = if values.is_empty() {
        0.0
    } else {
        values.iter().map(|t| t.value).sum::<f64>() / values.len() as f64
    };

    MetricRanking {
        metric,
        values,
        ranking,
        spread,
        mean,
    }
}

/// Header overlap across tables.
pub fn compare_schemas(tables: &[ProcessedTable]) -> SchemaComparison {
    let Some(first) = tables.first() else {
        return SchemaComparison::default();
    };

    let common_headers = first
        .headers
        .iter()
        .filter(|h| tables.iter().all(|t| t.headers.contains(h)))
        .cloned()
        .collect();

    let mut unique_headers = BTreeMap::new();
    if tables.len() > 1 {
        for table in tables {
            let unique: Vec<String> = table
                .headers
                .iter()
                .filter(|h| {
                    tables
                        .iter()
                        .filter(|t| t.headers.contains(h))
                        .count()
                        == 1
                })
                .cloned()
                .collect();
            if !unique.is_empty() {
                unique_headers.insert(table.name.clone(), unique);
            }
        }
    }

    SchemaComparison {
        common_headers,
        unique_headers,
    }
}

/// Compares processed tables on summary metrics.
pub struct ComparisonAnalyzer<'a> {
    rejection: RejectionAnalyzer<'a>,
    resolver: FieldResolver<'a>,
}

impl<'a> ComparisonAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            rejection: RejectionAnalyzer::new(config),
            resolver: FieldResolver::new(&config.aliases),
        }
    }

    /// The value of `metric` for one table. Empty tables yield 0.
    pub fn metric_value(&self, metric: ComparisonMetric, table: &ProcessedTable) -> f64 {
        match metric {
            ComparisonMetric::Volume => table.record_count as f64,
            ComparisonMetric::Quality => table.quality.composite_score,
            ComparisonMetric::Completeness => table.quality.completeness,
            ComparisonMetric::Validity => table.quality.validity,
            ComparisonMetric::Consistency => table.quality.consistency,
            ComparisonMetric::RejectionRate => self.rejection.analyze(table).rejection_rate,
            ComparisonMetric::TotalAmount => self.amounts(table).iter().sum(),
            ComparisonMetric::AverageAmount => {
                let amounts = self.amounts(table);
                if amounts.is_empty() {
                    0.0
                } else {
                    amounts.iter().sum::<f64>() / amounts.len() as f64
                }
            }
            ComparisonMetric::RejectedAmount => self.rejection.analyze(table).total_rejected_amount,
        }
    }

    fn amounts(&self, table: &ProcessedTable) -> Vec<f64> {
        table
            .records
            .iter()
            .filter_map(|r| self.resolver.amount(r))
            .collect()
    }

    pub fn compare(&self, tables: &[ProcessedTable], metrics: &[ComparisonMetric]) -> ComparisonAnalysis {
        let rankings: Vec<MetricRanking> = metrics
            .iter()
            .map(|metric| {
                let values = tables
                    .iter()
                    .map(|t| TableMetric {
                        table: t.name.clone(),
                        value: self.metric_value(*metric, t),
                    })
                    .collect();
                rank(*metric, values)
            })
            .collect();

        let insights = insights(&rankings, tables.len());

        ComparisonAnalysis {
            table_count: tables.len(),
            tables: tables.iter().map(|t| t.name.clone()).collect(),
            metrics: rankings,
            schema: compare_schemas(tables),
            insights,
        }
    }
}

fn insights(rankings: &[MetricRanking], table_count: usize) -> Vec<Insight> {
    let mut insights = Vec::new();
    if table_count < 2 {
        return insights;
    }

    for ranking in rankings {
        if let Some(leader) = ranking.leader()
            && ranking.spread > 0.0
        {
            insights.push(
                Insight::new(
                    InsightCategory::Comparison,
                    Severity::Low,
                    format!("Highest {}", ranking.metric.as_str().replace('_', " ")),
                    format!(
                        "'{}' leads on {} with {:.2}",
                        leader.table, ranking.metric, leader.value
                    ),
                )
                .with_confidence(0.9),
            );
        }

        match ranking.metric {
            ComparisonMetric::Quality if ranking.spread > QUALITY_GAP => insights.push(
                Insight::new(
                    InsightCategory::Comparison,
                    Severity::Medium,
                    "Uneven data quality",
                    format!(
                        "Composite quality differs by {:.1} points between tables",
                        ranking.spread
                    ),
                )
                .with_confidence(0.8)
                .actionable(),
            ),
            ComparisonMetric::RejectionRate if ranking.spread > REJECTION_RATE_GAP => {
                insights.push(
                    Insight::new(
                        InsightCategory::Comparison,
                        Severity::High,
                        "Rejection rates diverge",
                        format!(
                            "Rejection rates differ by {:.1} percentage points between tables",
                            ranking.spread
                        ),
                    )
                    .with_confidence(0.8)
                    .actionable(),
                )
            }
            _ => {}
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InferredType, QualityMetrics, Record, Value};
    use pretty_assertions::assert_eq;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]], quality: f64) -> ProcessedTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records: Vec<Record> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| Value::from(*v)))
                    .collect()
            })
            .collect();
        ProcessedTable {
            name: name.to_string(),
            column_count: headers.len(),
            column_types: vec![InferredType::Text; headers.len()],
            record_count: records.len(),
            headers,
            records,
            quality: QualityMetrics::new(quality, quality, quality),
        }
    }

    fn tables() -> Vec<ProcessedTable> {
        vec![
            table(
                "a",
                &["Status", "Amount", "Provider"],
                &[&["Rejected", "100"], &["Approved", "300"]],
                90.0,
            ),
            table(
                "b",
                &["Status", "Amount", "Region"],
                &[&["Approved", "50"], &["Approved", "50"]],
                60.0,
            ),
            table("c", &["Status", "Amount"], &[&["Denied", "10"], &["Approved", "x"]], 90.0),
        ]
    }

    #[test]
    fn test_volume_ranking_is_stable() {
        let config = EngineConfig::default();
        let analysis =
            ComparisonAnalyzer::new(&config).compare(&tables(), &[ComparisonMetric::Volume]);
        let order: Vec<&str> = analysis.metrics[0]
            .ranking
            .iter()
            .map(|r| r.table.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(analysis.metrics[0].spread, 0.0);
    }

    #[test]
    fn test_quality_ranking_and_gap_insight() {
        let config = EngineConfig::default();
        let analysis =
            ComparisonAnalyzer::new(&config).compare(&tables(), &[ComparisonMetric::Quality]);
        let ranking = &analysis.metrics[0];

        let order: Vec<&str> = ranking.ranking.iter().map(|r| r.table.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(ranking.ranking[2].rank, 3);
        assert_eq!(ranking.ranking[2].delta_from_leader, 30.0);
        assert_eq!(ranking.spread, 30.0);
        assert_eq!(ranking.mean, 80.0);
        assert!(analysis.insights.iter().any(|i| i.title == "Uneven data quality"));
    }

    #[test]
    fn test_amount_metrics() {
        let config = EngineConfig::default();
        let analyzer = ComparisonAnalyzer::new(&config);
        let tables = tables();

        assert_eq!(analyzer.metric_value(ComparisonMetric::TotalAmount, &tables[0]), 400.0);
        assert_eq!(analyzer.metric_value(ComparisonMetric::AverageAmount, &tables[0]), 200.0);
        assert_eq!(analyzer.metric_value(ComparisonMetric::AverageAmount, &tables[2]), 10.0);
        assert_eq!(analyzer.metric_value(ComparisonMetric::RejectedAmount, &tables[0]), 100.0);
        assert_eq!(analyzer.metric_value(ComparisonMetric::RejectionRate, &tables[1]), 0.0);
    }

    #[test]
    fn test_schema_comparison() {
        let schema = compare_schemas(&tables());
        assert_eq!(schema.common_headers, vec!["Status".to_string(), "Amount".to_string()]);
        assert_eq!(schema.unique_headers["a"], vec!["Provider".to_string()]);
        assert_eq!(schema.unique_headers["b"], vec!["Region".to_string()]);
        assert!(!schema.unique_headers.contains_key("c"));
    }

    #[test]
    fn test_empty_input() {
        let config = EngineConfig::default();
        let analysis = ComparisonAnalyzer::new(&config).compare(&[], &ComparisonMetric::ALL);
        assert_eq!(analysis.table_count, 0);
        assert!(analysis.metrics.iter().all(|m| m.ranking.is_empty() && m.mean == 0.0));
        assert!(analysis.insights.is_empty());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(
            "rejection_rate".parse::<ComparisonMetric>(),
            Ok(ComparisonMetric::RejectionRate)
        );
        assert!("profit".parse::<ComparisonMetric>().is_err());
    }
}
