//! Completeness, validity and consistency scoring.

use crate::ingest::matches_type;
use crate::types::{InferredType, QualityMetrics, Record, Schema, Value};
use crate::utils::{parse_number, percentage, ratio};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Validity patterns - compiled once at startup
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex: email"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-\+\(\)\.]+$").expect("Invalid regex: phone"));

const MIN_PHONE_DIGITS: usize = 7;

/// Validity rule selected from a header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityRule {
    Email,
    Phone,
    Numeric,
    Any,
}

impl ValidityRule {
    /// Pick the rule for a header (case-insensitive, first match wins).
    pub fn for_header(header: &str) -> Self {
        let lower = header.to_lowercase();
        if lower.contains("email") {
            ValidityRule::Email
        } else if lower.contains("phone") {
            ValidityRule::Phone
        } else if lower.contains("amount") || lower.contains("price") {
            ValidityRule::Numeric
        } else {
            ValidityRule::Any
        }
    }

    /// Check a filled value against the rule.
    pub fn is_valid(&self, value: &Value) -> bool {
        match self {
            ValidityRule::Email => EMAIL_PATTERN.is_match(value.to_text().trim()),
            ValidityRule::Phone => {
                let text = value.to_text();
                let text = text.trim();
                PHONE_PATTERN.is_match(text)
                    && text.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
            }
            ValidityRule::Numeric => match value {
                Value::Number(n) => n.is_finite(),
                Value::Text(s) => parse_number(s).is_some(),
                _ => false,
            },
            ValidityRule::Any => true,
        }
    }
}

/// Per-column quality breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub name: String,
    pub inferred_type: InferredType,
    pub filled: usize,
    pub valid: usize,
    /// Percentage of records with a filled value.
    pub completeness: f64,
    /// Percentage of filled values passing the header's validity rule.
    pub validity: f64,
    /// Fraction of filled values matching the inferred type.
    pub type_match_ratio: f64,
    pub consistent: bool,
}

/// Computes [`QualityMetrics`] for an ingested table.
#[derive(Debug, Clone, Copy)]
pub struct QualityScorer {
    consistency_threshold: f64,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl QualityScorer {
    pub fn new(consistency_threshold: f64) -> Self {
        Self {
            consistency_threshold,
        }
    }

    fn score_column(
        &self,
        header: &str,
        inferred_type: InferredType,
        records: &[Record],
    ) -> ColumnQuality {
        let rule = ValidityRule::for_header(header);
        let filled_values: Vec<&Value> = records
            .iter()
            .filter_map(|r| r.get(header))
            .filter(|v| v.is_filled())
            .collect();

        let filled = filled_values.len();
        let valid = filled_values.iter().filter(|v| rule.is_valid(v)).count();
        let matching = filled_values
            .iter()
            .filter(|v| matches_type(v, inferred_type))
            .count();
        let type_match_ratio = ratio(matching, filled);

        ColumnQuality {
            name: header.to_string(),
            inferred_type,
            filled,
            valid,
            completeness: percentage(filled as f64, records.len() as f64),
            validity: percentage(valid as f64, filled as f64),
            type_match_ratio,
            consistent: filled > 0 && type_match_ratio > self.consistency_threshold,
        }
    }

    /// Per-column breakdown, one entry per header.
    ///
    /// Headers beyond `column_types` are treated as text.
    pub fn score_columns(
        &self,
        schema: &Schema,
        records: &[Record],
        column_types: &[InferredType],
    ) -> Vec<ColumnQuality> {
        schema
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let inferred = column_types.get(idx).copied().unwrap_or(InferredType::Text);
                self.score_column(header, inferred, records)
            })
            .collect()
    }

    /// Aggregate quality for a table. Every dimension is 0 for an empty table.
    pub fn score(
        &self,
        schema: &Schema,
        records: &[Record],
        column_types: &[InferredType],
    ) -> QualityMetrics {
        let columns = self.score_columns(schema, records, column_types);
        Self::aggregate(&columns, records.len())
    }

    /// Fold a per-column breakdown into table metrics.
    pub fn aggregate(columns: &[ColumnQuality], record_count: usize) -> QualityMetrics {
        let total_cells = columns.len() * record_count;
        let filled: usize = columns.iter().map(|c| c.filled).sum();
        let valid: usize = columns.iter().map(|c| c.valid).sum();
        let consistent = columns.iter().filter(|c| c.consistent).count();

        QualityMetrics::new(
            percentage(filled as f64, total_cells as f64),
            percentage(valid as f64, filled as f64),
            percentage(consistent as f64, columns.len() as f64),
        )
    }
}
