//! Rejection statistics for one table or several tables pooled together.

use crate::config::EngineConfig;
use crate::resolver::{FieldResolver, resolve, resolve_non_empty};
use crate::taxonomy::{
    AmountLadder, Granularity, RejectionCategory, RejectionTaxonomy, TrendDirection, period_key,
};
use crate::types::{Insight, InsightCategory, PatternBucket, ProcessedTable, Record, Severity};
use crate::utils::percentage;
use serde::Serialize;
use tracing::debug;

/// Status substrings that mark a claim as rejected (lowercase).
const REJECTION_MARKERS: [&str; 3] = ["reject", "denied", "decline"];

/// Share of recoverable rejected amount expected back after resubmission.
const RECOVERY_RATE: f64 = 0.7;

/// Share of all rejected amount assumed recoverable when no reasons are recorded.
const UNATTRIBUTED_RECOVERY_RATE: f64 = 0.3;

const TOP_REASON_LIMIT: usize = 10;
const RECOMMENDED_REASONS: usize = 3;

/// One row of the top-reasons table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonSummary {
    pub reason: String,
    pub count: usize,
    /// Share of rejected records, in percent.
    pub percentage: f64,
    pub category: RejectionCategory,
    pub severity: Severity,
}

/// Rejection statistics and insights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionAnalysis {
    /// Table name, or "aggregate" for pooled tables.
    pub source: String,
    pub table_count: usize,
    pub total_count: usize,
    pub rejected_count: usize,
    pub rejection_rate: f64,
    pub approval_rate: f64,
    pub total_rejected_amount: f64,
    pub average_rejected_amount: f64,
    pub potential_recovery: f64,
    pub by_reason: PatternBucket,
    pub by_category: PatternBucket,
    pub by_provider: PatternBucket,
    pub by_specialty: PatternBucket,
    pub by_month: PatternBucket,
    pub by_amount_range: PatternBucket,
    pub top_reasons: Vec<ReasonSummary>,
    pub monthly_trend: TrendDirection,
    pub recommendations: Vec<String>,
    pub insights: Vec<Insight>,
}

/// True when a status-like field reads as a rejection.
///
/// Each status candidate is resolved on its own; a value containing
/// "reject", "denied" or "decline", or equal to "no", counts. Both checks
/// ignore case; the "no" check does not trim.
pub fn is_rejected<S: AsRef<str>>(record: &Record, status_candidates: &[S]) -> bool {
    status_candidates.iter().any(|candidate| {
        resolve(record, std::slice::from_ref(candidate))
            .filter(|value| value.is_filled())
            .map(|value| {
                let status = value.to_text().to_lowercase();
                status == "no" || REJECTION_MARKERS.iter().any(|m| status.contains(m))
            })
            .unwrap_or(false)
    })
}

/// First non-empty reason among the reason candidates, trimmed.
pub fn extract_reason<S: AsRef<str>>(record: &Record, reason_candidates: &[S]) -> Option<String> {
    resolve_non_empty(record, reason_candidates)
        .map(|v| v.to_text().trim().to_string())
        .filter(|reason| !reason.is_empty())
}

/// Computes [`RejectionAnalysis`] over records.
pub struct RejectionAnalyzer<'a> {
    resolver: FieldResolver<'a>,
    taxonomy: &'a RejectionTaxonomy,
    ladder: &'a AmountLadder,
    high_rejection_rate: f64,
}

#[derive(Default)]
struct Tally {
    total: usize,
    rejected: usize,
    rejected_amount: f64,
    rejected_with_amount: usize,
    recoverable_amount: f64,
    any_reason: bool,
    by_reason: PatternBucket,
    by_category: PatternBucket,
    by_provider: PatternBucket,
    by_specialty: PatternBucket,
    by_month: PatternBucket,
    by_amount_range: PatternBucket,
}

impl<'a> RejectionAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            resolver: FieldResolver::new(&config.aliases),
            taxonomy: &config.taxonomy,
            ladder: &config.amount_ladder,
            high_rejection_rate: config.high_rejection_rate,
        }
    }

    pub fn is_rejected(&self, record: &Record) -> bool {
        is_rejected(record, &self.resolver.aliases().status)
    }

    pub fn extract_reason(&self, record: &Record) -> Option<String> {
        extract_reason(record, &self.resolver.aliases().rejection_reason)
    }

    pub fn categorize(&self, reason: &str) -> RejectionCategory {
        self.taxonomy.categorize(reason)
    }

    /// Analyze one table.
    pub fn analyze(&self, table: &ProcessedTable) -> RejectionAnalysis {
        self.analyze_records(&table.name, 1, table.records.iter())
    }

    /// Analyze the records of several tables as one population.
    pub fn aggregate(&self, tables: &[ProcessedTable]) -> RejectionAnalysis {
        self.analyze_records(
            "aggregate",
            tables.len(),
            tables.iter().flat_map(|t| t.records.iter()),
        )
    }

    fn tally<'r>(&self, records: impl Iterator<Item = &'r Record>) -> Tally {
        let mut tally = Tally::default();

        for record in records {
            tally.total += 1;
            if !self.is_rejected(record) {
                continue;
            }
            tally.rejected += 1;

            let reason = self.extract_reason(record);
            let category = reason
                .as_deref()
                .map(|r| self.categorize(r))
                .unwrap_or(RejectionCategory::Other);
            tally.by_category.increment(category.as_str());
            if let Some(reason) = reason {
                tally.any_reason = true;
                tally.by_reason.increment(reason);
            }

            if let Some(provider) = self.resolver.provider(record) {
                tally.by_provider.increment(provider);
            }
            if let Some(specialty) = self.resolver.specialty(record) {
                tally.by_specialty.increment(specialty);
            }
            if let Some(date) = self.resolver.date(record) {
                tally.by_month.increment(period_key(date, Granularity::Monthly));
            }
            if let Some(amount) = self.resolver.amount(record) {
                tally.rejected_amount += amount;
                tally.rejected_with_amount += 1;
                if category.is_recoverable() {
                    tally.recoverable_amount += amount;
                }
                if let Some(label) = self.ladder.bucket(amount) {
                    tally.by_amount_range.increment(label);
                }
            }
        }

        tally
    }

    /// Analyze an arbitrary record stream under a source label.
    pub fn analyze_records<'r>(
        &self,
        source: &str,
        table_count: usize,
        records: impl Iterator<Item = &'r Record>,
    ) -> RejectionAnalysis {
        let tally = self.tally(records);

        let rejection_rate = percentage(tally.rejected as f64, tally.total as f64);
        let approval_rate = if tally.total > 0 {
            100.0 - rejection_rate
        } else {
            0.0
        };
        let average_rejected_amount = if tally.rejected_with_amount > 0 {
            tally.rejected_amount / tally.rejected_with_amount as f64
        } else {
            0.0
        };
        let potential_recovery = if tally.any_reason {
            tally.recoverable_amount * RECOVERY_RATE
        } else {
            tally.rejected_amount * UNATTRIBUTED_RECOVERY_RATE
        };

        let top_reasons = self.top_reasons(&tally.by_reason, tally.rejected);
        let monthly_trend = monthly_direction(&tally.by_month);
        let recommendations = recommendations(&top_reasons);

        let mut analysis = RejectionAnalysis {
            source: source.to_string(),
            table_count,
            total_count: tally.total,
            rejected_count: tally.rejected,
            rejection_rate,
            approval_rate,
            total_rejected_amount: tally.rejected_amount,
            average_rejected_amount,
            potential_recovery,
            by_reason: tally.by_reason,
            by_category: tally.by_category,
            by_provider: tally.by_provider,
            by_specialty: tally.by_specialty,
            by_month: tally.by_month,
            by_amount_range: tally.by_amount_range,
            top_reasons,
            monthly_trend,
            recommendations,
            insights: Vec::new(),
        };
        analysis.insights = self.insights(&analysis);

        debug!(
            "Rejection analysis for '{}': {}/{} rejected ({:.2}%)",
            analysis.source, analysis.rejected_count, analysis.total_count, analysis.rejection_rate
        );

        analysis
    }

    fn top_reasons(&self, by_reason: &PatternBucket, rejected: usize) -> Vec<ReasonSummary> {
        by_reason
            .sorted()
            .into_iter()
            .take(TOP_REASON_LIMIT)
            .map(|entry| {
                let category = self.categorize(&entry.label);
                ReasonSummary {
                    percentage: percentage(entry.count as f64, rejected as f64),
                    severity: category.severity(),
                    category,
                    count: entry.count,
                    reason: entry.label,
                }
            })
            .collect()
    }

    fn insights(&self, analysis: &RejectionAnalysis) -> Vec<Insight> {
        let mut insights = Vec::new();

        if analysis.rejection_rate > self.high_rejection_rate {
            insights.push(
                Insight::new(
                    InsightCategory::Rejection,
                    Severity::High,
                    "High rejection rate",
                    format!(
                        "{:.1}% of claims ({} of {}) were rejected",
                        analysis.rejection_rate, analysis.rejected_count, analysis.total_count
                    ),
                )
                .with_confidence(0.9)
                .actionable(),
            );
        }

        if let Some(top) = analysis.top_reasons.first() {
            insights.push(
                Insight::new(
                    InsightCategory::Rejection,
                    top.severity,
                    "Top rejection reason",
                    format!(
                        "'{}' accounts for {:.1}% of rejections ({} of {})",
                        top.reason, top.percentage, top.count, analysis.rejected_count
                    ),
                )
                .with_confidence(0.8)
                .actionable(),
            );
        }

        if analysis.monthly_trend == TrendDirection::Increasing {
            insights.push(
                Insight::new(
                    InsightCategory::Rejection,
                    Severity::Medium,
                    "Rejections increasing",
                    "Recent months show more rejections than the earliest months",
                )
                .with_confidence(0.6),
            );
        }

        if analysis.potential_recovery > 0.0 {
            insights.push(
                Insight::new(
                    InsightCategory::Rejection,
                    Severity::Medium,
                    "Recoverable rejected amount",
                    format!(
                        "An estimated {:.2} of {:.2} rejected could be recovered through resubmission",
                        analysis.potential_recovery, analysis.total_rejected_amount
                    ),
                )
                .with_confidence(0.5)
                .actionable(),
            );
        }

        insights
    }
}

/// Direction of monthly rejection counts, months in calendar order.
fn monthly_direction(by_month: &PatternBucket) -> TrendDirection {
    let mut months: Vec<_> = by_month.entries().to_vec();
    months.sort_by(|a, b| a.label.cmp(&b.label));
    let counts: Vec<f64> = months.iter().map(|e| e.count as f64).collect();
    TrendDirection::from_series(&counts)
}

fn recommendations(top_reasons: &[ReasonSummary]) -> Vec<String> {
    top_reasons
        .iter()
        .take(RECOMMENDED_REASONS)
        .filter_map(|reason| {
            if reason.severity == Severity::High {
                Some(format!(
                    "Implement immediate process improvements for '{}' rejections",
                    reason.reason
                ))
            } else if reason.percentage > 10.0 {
                Some(format!(
                    "Develop targeted training for reducing '{}' rejections",
                    reason.reason
                ))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InferredType, QualityMetrics, Value};
    use pretty_assertions::assert_eq;

    fn table(name: &str, headers: &[&str], rows: Vec<Vec<Value>>) -> ProcessedTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records: Vec<Record> = rows
            .into_iter()
            .map(|row| headers.iter().cloned().zip(row).collect())
            .collect();
        ProcessedTable {
            name: name.to_string(),
            column_count: headers.len(),
            column_types: vec![InferredType::Text; headers.len()],
            record_count: records.len(),
            headers,
            records,
            quality: QualityMetrics::default(),
        }
    }

    fn status_amount_table() -> ProcessedTable {
        table(
            "claims",
            &["Status", "Amount"],
            vec![
                vec![Value::from("Rejected"), Value::from(150.0)],
                vec![Value::from("Approved"), Value::from(50.0)],
                vec![Value::from("Rejected"), Value::from(1200.0)],
            ],
        )
    }

    #[test]
    fn test_status_amount_scenario() {
        let config = EngineConfig::default();
        let analysis = RejectionAnalyzer::new(&config).analyze(&status_amount_table());

        assert_eq!(analysis.total_count, 3);
        assert_eq!(analysis.rejected_count, 2);
        assert!((analysis.rejection_rate - 66.67).abs() < 0.01);
        assert!((analysis.approval_rate - 33.33).abs() < 0.01);
        assert_eq!(analysis.by_amount_range.get("100-500"), 1);
        assert_eq!(analysis.by_amount_range.get("1K-5K"), 1);
        assert_eq!(analysis.by_amount_range.len(), 2);
        assert_eq!(analysis.total_rejected_amount, 1350.0);
        assert_eq!(analysis.average_rejected_amount, 675.0);
        assert_eq!(analysis.potential_recovery, 1350.0 * 0.3);
        assert!(analysis.insights.iter().any(|i| i.severity == Severity::High));
    }

    #[test]
    fn test_empty_table() {
        let config = EngineConfig::default();
        let analysis = RejectionAnalyzer::new(&config).analyze(&table("empty", &[], vec![]));

        assert_eq!(analysis.total_count, 0);
        assert_eq!(analysis.rejection_rate, 0.0);
        assert_eq!(analysis.approval_rate, 0.0);
        assert_eq!(analysis.average_rejected_amount, 0.0);
        assert!(analysis.insights.is_empty());
    }

    #[test]
    fn test_is_rejected_markers() {
        let statuses = ["status"];
        let rec = |s: &str| -> Record { [("Claim Status", Value::from(s))].into_iter().collect() };

        assert!(is_rejected(&rec("DENIED"), &statuses));
        assert!(is_rejected(&rec("Partially Rejected"), &statuses));
        assert!(is_rejected(&rec("declined"), &statuses));
        assert!(is_rejected(&rec("No"), &statuses));
        assert!(!is_rejected(&rec(" no "), &statuses));
        assert!(is_rejected(&rec("  denied "), &statuses));
        assert!(!is_rejected(&rec("Approved"), &statuses));
        assert!(!is_rejected(&rec("none"), &statuses));
        assert!(!is_rejected(&Record::new(), &statuses));
    }

    #[test]
    fn test_is_rejected_checks_every_status_field() {
        let config = EngineConfig::default();
        let analyzer = RejectionAnalyzer::new(&config);
        let rec: Record = [
            ("Status", Value::from("Closed")),
            ("Result", Value::from("Denied")),
        ]
        .into_iter()
        .collect();
        assert!(analyzer.is_rejected(&rec));
    }

    #[test]
    fn test_reason_buckets_and_categories() {
        let config = EngineConfig::default();
        let t = table(
            "claims",
            &["Status", "Denial Reason", "Provider", "Specialty", "Date", "Amount"],
            vec![
                vec![
                    Value::from("Denied"),
                    Value::from("Missing documentation"),
                    Value::from("Clinic A"),
                    Value::from("Cardiology"),
                    Value::from("2024-01-10"),
                    Value::from("200"),
                ],
                vec![
                    Value::from("Denied"),
                    Value::from("Missing documentation"),
                    Value::from("Clinic B"),
                    Value::Null,
                    Value::from("2024-02-03"),
                    Value::from("300"),
                ],
                vec![
                    Value::from("Denied"),
                    Value::from("Not medically necessary"),
                    Value::from("Clinic A"),
                    Value::from("Oncology"),
                    Value::from("bad date"),
                    Value::Null,
                ],
                vec![
                    Value::from("Denied"),
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::from("100"),
                ],
                vec![
                    Value::from("Approved"),
                    Value::from("n/a"),
                    Value::from("Clinic C"),
                    Value::from("Cardiology"),
                    Value::from("2024-02-05"),
                    Value::from("900"),
                ],
            ],
        );

        let analysis = RejectionAnalyzer::new(&config).analyze(&t);

        assert_eq!(analysis.rejected_count, 4);
        assert_eq!(analysis.by_reason.get("Missing documentation"), 2);
        assert_eq!(analysis.by_reason.total(), 3);
        assert_eq!(analysis.by_category.get("administrative"), 2);
        assert_eq!(analysis.by_category.get("medical"), 1);
        assert_eq!(analysis.by_category.get("other"), 1);
        assert_eq!(analysis.by_category.total(), analysis.rejected_count);
        assert_eq!(analysis.by_provider.get("Clinic A"), 2);
        assert_eq!(analysis.by_provider.total(), 3);
        assert_eq!(analysis.by_specialty.total(), 2);
        assert_eq!(analysis.by_month.get("2024-01"), 1);
        assert_eq!(analysis.by_month.get("2024-02"), 1);
        assert_eq!(analysis.total_rejected_amount, 600.0);
        assert_eq!(analysis.average_rejected_amount, 200.0);
        assert_eq!(analysis.potential_recovery, 500.0 * 0.7);

        let top = &analysis.top_reasons[0];
        assert_eq!(top.reason, "Missing documentation");
        assert_eq!(top.percentage, 50.0);
        assert_eq!(top.category, RejectionCategory::Administrative);
        assert_eq!(top.severity, Severity::Medium);

        assert_eq!(
            analysis.recommendations,
            vec![
                "Develop targeted training for reducing 'Missing documentation' rejections"
                    .to_string(),
                "Implement immediate process improvements for 'Not medically necessary' rejections"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_aggregate_pools_tables() {
        let config = EngineConfig::default();
        let analyzer = RejectionAnalyzer::new(&config);
        let tables = vec![
            status_amount_table(),
            table(
                "second",
                &["Claim Status"],
                vec![vec![Value::from("Approved")], vec![Value::from("Declined")]],
            ),
        ];

        let aggregate = analyzer.aggregate(&tables);
        assert_eq!(aggregate.source, "aggregate");
        assert_eq!(aggregate.table_count, 2);
        assert_eq!(aggregate.total_count, 5);
        assert_eq!(aggregate.rejected_count, 3);
        assert_eq!(aggregate.rejection_rate, 60.0);
    }

    #[test]
    fn test_rate_matches_counts() {
        let config = EngineConfig::default();
        let analysis = RejectionAnalyzer::new(&config).analyze(&status_amount_table());
        let expected = analysis.rejected_count as f64 / analysis.total_count as f64 * 100.0;
        assert!((analysis.rejection_rate - expected).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_direction_uses_calendar_order() {
        let mut bucket = PatternBucket::new();
        bucket.add("2024-03", 9);
        bucket.add("2024-01", 1);
        bucket.add("2024-02", 2);
        assert_eq!(monthly_direction(&bucket), TrendDirection::Increasing);
    }
}
