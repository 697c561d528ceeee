//! Per-period accumulation of claim counts, amounts and rejections.

use super::rejection::is_rejected;
use crate::resolver::FieldResolver;
use crate::taxonomy::{Granularity, TrendDirection, period_key};
use crate::types::{Insight, InsightCategory, ProcessedTable, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What a trend analysis accumulates per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    /// Record count plus resolved amount.
    Claims,
    /// Count of rejected records.
    Rejections,
    /// Record count.
    Volume,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 3] = [
        TrendMetric::Claims,
        TrendMetric::Rejections,
        TrendMetric::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendMetric::Claims => "claims",
            TrendMetric::Rejections => "rejections",
            TrendMetric::Volume => "volume",
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claims" => Ok(TrendMetric::Claims),
            "rejections" => Ok(TrendMetric::Rejections),
            "volume" => Ok(TrendMetric::Volume),
            other => Err(format!("unknown trend metric '{}'", other)),
        }
    }
}

/// Accumulated values for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub count: usize,
    pub amount: f64,
    pub rejections: usize,
}

/// Period series for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub source: String,
    pub granularity: Granularity,
    pub metrics: Vec<TrendMetric>,
    /// Keyed by period, ascending.
    pub periods: BTreeMap<String, PeriodStats>,
    pub dated_records: usize,
    pub undated_records: usize,
    pub first_period: Option<String>,
    pub last_period: Option<String>,
    pub peak_period: Option<String>,
    pub direction: TrendDirection,
    pub insights: Vec<Insight>,
}

impl TrendAnalysis {
    /// The series the direction and peak are read from: counts when any
    /// counting metric was requested, otherwise rejections.
    fn series_value(metrics: &[TrendMetric], stats: &PeriodStats) -> f64 {
        if metrics
            .iter()
            .any(|m| matches!(m, TrendMetric::Claims | TrendMetric::Volume))
        {
            stats.count as f64
        } else {
            stats.rejections as f64
        }
    }
}

/// Build the period series of a table.
///
/// Every record with a resolvable date opens its period even when no
/// requested metric increments it. `claims` and `volume` share the count, so
/// requesting both counts each record once.
pub fn analyze_trends(
    resolver: FieldResolver<'_>,
    table: &ProcessedTable,
    granularity: Granularity,
    metrics: &[TrendMetric],
) -> TrendAnalysis {
    let counts = metrics
        .iter()
        .any(|m| matches!(m, TrendMetric::Claims | TrendMetric::Volume));
    let sums_amount = metrics.contains(&TrendMetric::Claims);
    let counts_rejections = metrics.contains(&TrendMetric::Rejections);

    let mut periods: BTreeMap<String, PeriodStats> = BTreeMap::new();
    let mut undated_records = 0;

    for record in &table.records {
        let Some(date) = resolver.date(record) else {
            undated_records += 1;
            continue;
        };
        let stats = periods.entry(period_key(date, granularity)).or_default();

        if counts {
            stats.count += 1;
        }
        if sums_amount && let Some(amount) = resolver.amount(record) {
            stats.amount += amount;
        }
        if counts_rejections && is_rejected(record, &resolver.aliases().status) {
            stats.rejections += 1;
        }
    }

    let dated_records = table.records.len() - undated_records;
    let series: Vec<f64> = periods
        .values()
        .map(|s| TrendAnalysis::series_value(metrics, s))
        .collect();
    let direction = TrendDirection::from_series(&series);

    let peak_period = periods
        .iter()
        .fold(None, |best: Option<(&String, f64)>, (key, stats)| {
            let value = TrendAnalysis::series_value(metrics, stats);
            match best {
                Some((_, v)) if v >= value => best,
                _ => Some((key, value)),
            }
        })
        .map(|(key, _)| key.clone());

    let mut analysis = TrendAnalysis {
        source: table.name.clone(),
        granularity,
        metrics: metrics.to_vec(),
        first_period: periods.keys().next().cloned(),
        last_period: periods.keys().next_back().cloned(),
        periods,
        dated_records,
        undated_records,
        peak_period,
        direction,
        insights: Vec::new(),
    };
    analysis.insights = insights(&analysis);
    analysis
}

fn insights(analysis: &TrendAnalysis) -> Vec<Insight> {
    let mut insights = Vec::new();
    let noun = if analysis.metrics.iter().all(|m| *m == TrendMetric::Rejections) {
        "Rejections"
    } else {
        "Claim volume"
    };

    match analysis.direction {
        TrendDirection::Increasing => insights.push(
            Insight::new(
                InsightCategory::Trend,
                Severity::Medium,
                format!("{} increasing", noun),
                format!(
                    "{} rose across {} {} periods",
                    noun,
                    analysis.periods.len(),
                    analysis.granularity
                ),
            )
            .with_confidence(0.7),
        ),
        TrendDirection::Decreasing => insights.push(
            Insight::new(
                InsightCategory::Trend,
                Severity::Low,
                format!("{} decreasing", noun),
                format!(
                    "{} fell across {} {} periods",
                    noun,
                    analysis.periods.len(),
                    analysis.granularity
                ),
            )
            .with_confidence(0.7),
        ),
        TrendDirection::Stable => {}
    }

    if analysis.periods.len() > 1
        && let Some(peak) = &analysis.peak_period
    {
        insights.push(
            Insight::new(
                InsightCategory::Trend,
                Severity::Low,
                "Peak period",
                format!("{} peaked in {}", noun, peak),
            )
            .with_confidence(0.8),
        );
    }

    if analysis.undated_records > 0 && analysis.dated_records > 0 {
        insights.push(
            Insight::new(
                InsightCategory::Trend,
                Severity::Low,
                "Undated records",
                format!(
                    "{} records had no usable date and were left out of the trend",
                    analysis.undated_records
                ),
            )
            .actionable(),
        );
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FieldAliases;
    use crate::types::{InferredType, QualityMetrics, Record, Value};
    use pretty_assertions::assert_eq;

    fn table(rows: &[(&str, &str, &str)]) -> ProcessedTable {
        let records: Vec<Record> = rows
            .iter()
            .map(|(date, status, amount)| {
                [
                    ("Service Date", Value::from(*date)),
                    ("Status", Value::from(*status)),
                    ("Paid Amount", Value::from(*amount)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        ProcessedTable {
            name: "claims".to_string(),
            headers: vec!["Service Date".into(), "Status".into(), "Paid Amount".into()],
            record_count: records.len(),
            column_count: 3,
            column_types: vec![InferredType::Date, InferredType::Text, InferredType::Number],
            records,
            quality: QualityMetrics::default(),
        }
    }

    fn sample() -> ProcessedTable {
        table(&[
            ("2024-01-05", "Approved", "100"),
            ("2024-01-20", "Rejected", "50"),
            ("2024-03-02", "Approved", "$1,000"),
            ("2024-02-11", "Denied", ""),
            ("", "Approved", "10"),
            ("garbage", "Approved", "10"),
        ])
    }

    #[test]
    fn test_monthly_claims_and_rejections() {
        let aliases = FieldAliases::default();
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &sample(),
            Granularity::Monthly,
            &[TrendMetric::Claims, TrendMetric::Rejections],
        );

        let keys: Vec<&str> = analysis.periods.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);

        let jan = &analysis.periods["2024-01"];
        assert_eq!(jan.count, 2);
        assert_eq!(jan.amount, 150.0);
        assert_eq!(jan.rejections, 1);
        assert_eq!(analysis.periods["2024-02"].rejections, 1);
        assert_eq!(analysis.periods["2024-03"].amount, 1000.0);

        assert_eq!(analysis.dated_records, 4);
        assert_eq!(analysis.undated_records, 2);
        assert_eq!(analysis.first_period.as_deref(), Some("2024-01"));
        assert_eq!(analysis.last_period.as_deref(), Some("2024-03"));
        assert_eq!(analysis.peak_period.as_deref(), Some("2024-01"));
    }

    #[test]
    fn test_rejections_only_opens_periods_without_counts() {
        let aliases = FieldAliases::default();
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &sample(),
            Granularity::Yearly,
            &[TrendMetric::Rejections],
        );

        let year = &analysis.periods["2024"];
        assert_eq!(year.count, 0);
        assert_eq!(year.amount, 0.0);
        assert_eq!(year.rejections, 2);
    }

    #[test]
    fn test_claims_and_volume_count_once() {
        let aliases = FieldAliases::default();
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &sample(),
            Granularity::Quarterly,
            &[TrendMetric::Claims, TrendMetric::Volume],
        );
        assert_eq!(analysis.periods["2024-Q1"].count, 4);
    }

    #[test]
    fn test_weekly_keys_use_iso_year() {
        let aliases = FieldAliases::default();
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &table(&[("2024-12-30", "Approved", "1")]),
            Granularity::Weekly,
            &[TrendMetric::Volume],
        );
        assert!(analysis.periods.contains_key("2025-W01"));
    }

    #[test]
    fn test_increasing_direction() {
        let aliases = FieldAliases::default();
        let t = table(&[
            ("2024-01-01", "Approved", "1"),
            ("2024-02-01", "Approved", "1"),
            ("2024-02-02", "Approved", "1"),
            ("2024-03-01", "Approved", "1"),
            ("2024-03-02", "Approved", "1"),
            ("2024-03-03", "Approved", "1"),
        ]);
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &t,
            Granularity::Monthly,
            &[TrendMetric::Volume],
        );
        assert_eq!(analysis.direction, TrendDirection::Stable);

        let t = table(&[
            ("2024-01-01", "Approved", "1"),
            ("2024-02-01", "Approved", "1"),
            ("2024-03-01", "Approved", "1"),
            ("2024-04-01", "Approved", "1"),
            ("2024-04-02", "Approved", "1"),
            ("2024-05-01", "Approved", "1"),
            ("2024-05-02", "Approved", "1"),
            ("2024-06-01", "Approved", "1"),
            ("2024-06-02", "Approved", "1"),
        ]);
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &t,
            Granularity::Monthly,
            &[TrendMetric::Volume],
        );
        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!(
            analysis
                .insights
                .iter()
                .any(|i| i.title == "Claim volume increasing")
        );
    }

    #[test]
    fn test_empty_table() {
        let aliases = FieldAliases::default();
        let analysis = analyze_trends(
            FieldResolver::new(&aliases),
            &table(&[]),
            Granularity::Monthly,
            &[TrendMetric::Claims],
        );
        assert!(analysis.periods.is_empty());
        assert_eq!(analysis.first_period, None);
        assert_eq!(analysis.peak_period, None);
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert!(analysis.insights.is_empty());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Claims".parse::<TrendMetric>(), Ok(TrendMetric::Claims));
        assert!("forecast".parse::<TrendMetric>().is_err());
    }
}
