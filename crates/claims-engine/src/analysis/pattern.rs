//! Cross-table category buckets with commonalities and differences.

use super::rejection::RejectionAnalyzer;
use crate::config::EngineConfig;
use crate::resolver::FieldResolver;
use crate::taxonomy::{AmountLadder, Granularity, RejectionCategory, period_key};
use crate::types::{Insight, InsightCategory, PatternBucket, ProcessedTable, Record, Severity};
use crate::utils::percentage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category dimension a pattern bucket is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Rejected records by reason.
    RejectionReasons,
    /// Rejected records by taxonomy category.
    RejectionCategories,
    Providers,
    Specialties,
    AmountRanges,
    Statuses,
    /// Dated records by month.
    MonthlyVolume,
}

impl PatternType {
    pub const ALL: [PatternType; 7] = [
        PatternType::RejectionReasons,
        PatternType::RejectionCategories,
        PatternType::Providers,
        PatternType::Specialties,
        PatternType::AmountRanges,
        PatternType::Statuses,
        PatternType::MonthlyVolume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::RejectionReasons => "rejection_reasons",
            PatternType::RejectionCategories => "rejection_categories",
            PatternType::Providers => "providers",
            PatternType::Specialties => "specialties",
            PatternType::AmountRanges => "amount_ranges",
            PatternType::Statuses => "statuses",
            PatternType::MonthlyVolume => "monthly_volume",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PatternType::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown pattern type '{}'", wanted))
    }
}

/// Bucket of one source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePattern {
    pub table: String,
    pub bucket: PatternBucket,
}

/// A label found in exactly one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDifference {
    pub label: String,
    pub table: String,
}

/// All tables' buckets for one pattern type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternGroup {
    pub pattern_type: PatternType,
    pub per_table: Vec<TablePattern>,
    pub merged: PatternBucket,
    /// Labels with a nonzero count in more than one table, in merged order.
    pub commonalities: Vec<String>,
    /// Labels unique to one table. Only derived when at least two tables are compared.
    pub differences: Vec<PatternDifference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    pub table_count: usize,
    pub patterns: Vec<PatternGroup>,
    pub insights: Vec<Insight>,
}

/// Builds pattern buckets over processed tables.
pub struct PatternAnalyzer<'a> {
    rejection: RejectionAnalyzer<'a>,
    resolver: FieldResolver<'a>,
    ladder: &'a AmountLadder,
}

impl<'a> PatternAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            rejection: RejectionAnalyzer::new(config),
            resolver: FieldResolver::new(&config.aliases),
            ladder: &config.amount_ladder,
        }
    }

    /// Label a record contributes to a pattern type, if any.
    fn label(&self, pattern_type: PatternType, record: &Record) -> Option<String> {
        match pattern_type {
            PatternType::RejectionReasons => {
                if !self.rejection.is_rejected(record) {
                    return None;
                }
                self.rejection.extract_reason(record)
            }
            PatternType::RejectionCategories => {
                if !self.rejection.is_rejected(record) {
                    return None;
                }
                let category = self
                    .rejection
                    .extract_reason(record)
                    .map(|r| self.rejection.categorize(&r))
                    .unwrap_or(RejectionCategory::Other);
                Some(category.as_str().to_string())
            }
            PatternType::Providers => self.resolver.provider(record),
            PatternType::Specialties => self.resolver.specialty(record),
            PatternType::AmountRanges => self
                .resolver
                .amount(record)
                .and_then(|a| self.ladder.bucket(a))
                .map(str::to_string),
            PatternType::Statuses => self.resolver.status(record),
            PatternType::MonthlyVolume => self
                .resolver
                .date(record)
                .map(|d| period_key(d, Granularity::Monthly)),
        }
    }

    pub fn bucket(&self, pattern_type: PatternType, table: &ProcessedTable) -> PatternBucket {
        let mut bucket = PatternBucket::new();
        for label in table.records.iter().filter_map(|r| self.label(pattern_type, r)) {
            bucket.increment(label);
        }
        bucket
    }

    fn group(&self, pattern_type: PatternType, tables: &[ProcessedTable]) -> PatternGroup {
        let per_table: Vec<TablePattern> = tables
            .iter()
            .map(|t| TablePattern {
                table: t.name.clone(),
                bucket: self.bucket(pattern_type, t),
            })
            .collect();

        let mut merged = PatternBucket::new();
        for pattern in &per_table {
            merged.merge(&pattern.bucket);
        }

        let holders = |label: &str| {
            per_table
                .iter()
                .filter(|p| p.bucket.contains(label))
                .collect::<Vec<_>>()
        };

        let mut commonalities = Vec::new();
        let mut differences = Vec::new();
        for entry in merged.sorted() {
            let holding = holders(&entry.label);
            if holding.len() > 1 {
                commonalities.push(entry.label);
            } else if per_table.len() > 1
                && let [only] = holding.as_slice()
            {
                differences.push(PatternDifference {
                    table: only.table.clone(),
                    label: entry.label,
                });
            }
        }

        PatternGroup {
            pattern_type,
            per_table,
            merged,
            commonalities,
            differences,
        }
    }

    pub fn analyze(&self, tables: &[ProcessedTable], pattern_types: &[PatternType]) -> PatternAnalysis {
        let patterns: Vec<PatternGroup> = pattern_types
            .iter()
            .map(|p| self.group(*p, tables))
            .collect();
        let insights = insights(&patterns, tables.len());

        PatternAnalysis {
            table_count: tables.len(),
            patterns,
            insights,
        }
    }
}

fn insights(patterns: &[PatternGroup], table_count: usize) -> Vec<Insight> {
    let mut insights = Vec::new();

    for group in patterns {
        let Some(top) = group.merged.top() else {
            continue;
        };
        let share = percentage(top.count as f64, group.merged.total() as f64);
        insights.push(
            Insight::new(
                InsightCategory::Pattern,
                Severity::Low,
                format!("Most common {}", group.pattern_type.as_str().replace('_', " ")),
                format!(
                    "'{}' accounts for {:.1}% of {} entries",
                    top.label,
                    share,
                    group.merged.total()
                ),
            )
            .with_confidence(0.8),
        );

        if table_count > 1 && !group.commonalities.is_empty() {
            insights.push(
                Insight::new(
                    InsightCategory::Pattern,
                    Severity::Low,
                    format!("Shared {}", group.pattern_type.as_str().replace('_', " ")),
                    format!(
                        "{} categories appear in more than one table",
                        group.commonalities.len()
                    ),
                )
                .with_confidence(0.7),
            );
        }

        if group.pattern_type == PatternType::RejectionReasons && !group.differences.is_empty() {
            insights.push(
                Insight::new(
                    InsightCategory::Pattern,
                    Severity::Medium,
                    "Table-specific rejection reasons",
                    format!(
                        "{} rejection reasons occur in only one table",
                        group.differences.len()
                    ),
                )
                .with_confidence(0.6)
                .actionable(),
            );
        }
    }

    insights
}
