//! Rule-based validation report for a processed table.
//!
//! Issues are problems that make a sheet unreliable for analysis, warnings
//! are suspicious but tolerable. Both lower the report's quality score.

use crate::profiler::{DatasetKind, detect_dataset_kind};
use crate::resolver::{FieldAliases, FieldConcept, FieldResolver};
use crate::types::{ProcessedTable, Record};
use crate::utils::{percentage, truncate_str};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Status values recognised in claim exports (lowercase).
pub const VALID_STATUSES: [&str; 6] = [
    "approved",
    "denied",
    "pending",
    "rejected",
    "paid",
    "processing",
];

const REQUIRED_CLAIM_CONCEPTS: [FieldConcept; 3] = [
    FieldConcept::ClaimId,
    FieldConcept::Amount,
    FieldConcept::Status,
];

const LARGE_AMOUNT: f64 = 1_000_000.0;
const EARLIEST_PLAUSIBLE_YEAR: i32 = 1900;

/// Outcome of validating one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dataset_kind: DatasetKind,
    pub is_valid: bool,
    /// Share of empty cells, 0.0 - 1.0.
    pub missing_ratio: f64,
    pub duplicate_records: usize,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    /// `1 - 0.1·issues - 0.05·warnings - 0.3·missing_ratio`, clamped to [0, 1].
    pub quality_score: f64,
}

/// Build the validation report for a table.
pub fn validate(table: &ProcessedTable, aliases: &FieldAliases) -> ValidationReport {
    let resolver = FieldResolver::new(aliases);
    let dataset_kind = detect_dataset_kind(&table.headers);
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    if table.records.is_empty() {
        issues.push("File contains no data records".to_string());
    }

    let missing_ratio = missing_ratio(table);
    let missing_pct = missing_ratio * 100.0;
    if missing_pct > 30.0 {
        issues.push(format!("High percentage of missing data: {:.1}%", missing_pct));
    } else if missing_pct > 15.0 {
        warnings.push(format!("Moderate missing data: {:.1}%", missing_pct));
    }

    if dataset_kind == DatasetKind::HealthcareClaims {
        issues.extend(claim_issues(table, aliases, &resolver));
    }

    issues.extend(date_issues(table));

    let large = table
        .records
        .iter()
        .filter_map(|r| resolver.amount(r))
        .filter(|a| *a > LARGE_AMOUNT)
        .count();
    if large > 0 {
        issues.push(format!("Unusually large amounts: {} records", large));
    }

    let duplicate_records = count_duplicates(&table.records);
    if duplicate_records > 0 {
        warnings.push(format!("Found {} duplicate records", duplicate_records));
        recommendations.push("Consider removing duplicate records".to_string());
    }

    let denied_with_amount = table
        .records
        .iter()
        .filter(|r| {
            resolver
                .status(r)
                .is_some_and(|s| s.to_lowercase() == "denied")
                && resolver.amount(r).is_some_and(|a| a > 0.0)
        })
        .count();
    if denied_with_amount > 0 {
        warnings.push(format!(
            "Denied claims with positive amounts: {} records",
            denied_with_amount
        ));
    }

    let quality_score = (1.0
        - 0.1 * issues.len() as f64
        - 0.05 * warnings.len() as f64
        - 0.3 * missing_ratio)
        .clamp(0.0, 1.0);

    if quality_score < 0.7 {
        recommendations.push("Data quality is below acceptable threshold".to_string());
        recommendations.push("Consider data cleaning before analysis".to_string());
    }
    if missing_pct > 10.0 {
        recommendations.push("Address missing data through imputation or collection".to_string());
    }

    debug!(
        "Validated '{}': {} issues, {} warnings, score {:.2}",
        table.name,
        issues.len(),
        warnings.len(),
        quality_score
    );

    ValidationReport {
        dataset_kind,
        is_valid: issues.is_empty(),
        missing_ratio,
        duplicate_records,
        issues,
        warnings,
        recommendations,
        quality_score,
    }
}

fn missing_ratio(table: &ProcessedTable) -> f64 {
    let total = table.headers.len() * table.records.len();
    let filled: usize = table
        .records
        .iter()
        .map(|r| {
            table
                .headers
                .iter()
                .filter(|h| r.get(h).is_some_and(|v| v.is_filled()))
                .count()
        })
        .sum();
    percentage((total - filled) as f64, total as f64) / 100.0
}

fn claim_issues(
    table: &ProcessedTable,
    aliases: &FieldAliases,
    resolver: &FieldResolver<'_>,
) -> Vec<String> {
    let mut issues = Vec::new();

    let missing: Vec<&str> = REQUIRED_CLAIM_CONCEPTS
        .iter()
        .filter(|c| aliases.matching_header(**c, &table.headers).is_none())
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        issues.push(format!("Missing required columns: {}", missing.join(", ")));
    }

    let amounts: Vec<f64> = table.records.iter().filter_map(|r| resolver.amount(r)).collect();
    let negative = amounts.iter().filter(|a| **a < 0.0).count();
    if negative > 0 {
        issues.push(format!("Found {} claims with negative amounts", negative));
    }
    let zero = amounts.iter().filter(|a| **a == 0.0).count();
    if zero as f64 > table.records.len() as f64 * 0.1 {
        issues.push(format!("High number of zero-amount claims: {}", zero));
    }

    let mut seen = HashSet::new();
    let invalid: Vec<String> = table
        .records
        .iter()
        .filter_map(|r| resolver.status(r))
        .filter(|s| !VALID_STATUSES.contains(&s.to_lowercase().as_str()))
        .filter(|s| seen.insert(s.clone()))
        .collect();
    if !invalid.is_empty() {
        let shown: Vec<String> = invalid.iter().take(5).map(|s| truncate_str(s, 30)).collect();
        issues.push(format!("Invalid status values found: {}", shown.join(", ")));
    }

    issues
}

fn date_issues(table: &ProcessedTable) -> Vec<String> {
    let mut issues = Vec::new();

    for header in table.headers.iter().filter(|h| h.to_lowercase().contains("date")) {
        let filled = table
            .records
            .iter()
            .filter_map(|r| r.get(header))
            .filter(|v| v.is_filled());

        let mut unparseable = 0;
        let mut very_old = 0;
        for value in filled {
            match value.as_date() {
                None => unparseable += 1,
                Some(d) if d.year() < EARLIEST_PLAUSIBLE_YEAR => very_old += 1,
                Some(_) => {}
            }
        }

        if unparseable > 0 {
            issues.push(format!(
                "Invalid dates in column '{}': {} records",
                header, unparseable
            ));
        }
        if very_old > 0 {
            issues.push(format!(
                "Very old dates found in '{}': {} records",
                header, very_old
            ));
        }
    }

    issues
}

/// Records identical to an earlier record, compared by rendered cell text.
fn count_duplicates(records: &[Record]) -> usize {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| {
            let key: Vec<(String, String)> = r
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_text()))
                .collect();
            !seen.insert(key)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InferredType, QualityMetrics, Value};
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ProcessedTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records: Vec<Record> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| {
                        let value = if v.is_empty() { Value::Null } else { Value::from(*v) };
                        (h.clone(), value)
                    })
                    .collect()
            })
            .collect();

        ProcessedTable {
            name: "test".to_string(),
            column_count: headers.len(),
            column_types: vec![InferredType::Text; headers.len()],
            record_count: records.len(),
            headers,
            records,
            quality: QualityMetrics::default(),
        }
    }

    #[test]
    fn test_clean_claims_table_is_valid() {
        let t = table(
            &["Claim ID", "Patient", "Amount", "Status"],
            &[
                &["C1", "P1", "100", "Approved"],
                &["C2", "P2", "250", "Rejected"],
            ],
        );
        let report = validate(&t, &FieldAliases::default());
        assert_eq!(report.dataset_kind, DatasetKind::HealthcareClaims);
        assert!(report.is_valid);
        assert_eq!(report.issues, Vec::<String>::new());
        assert_eq!(report.quality_score, 1.0);
    }

    #[test]
    fn test_empty_table_reports_no_records() {
        let t = table(&[], &[]);
        let report = validate(&t, &FieldAliases::default());
        assert!(!report.is_valid);
        assert_eq!(report.issues, vec!["File contains no data records".to_string()]);
        assert_eq!(report.missing_ratio, 0.0);
        assert!((report.quality_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_claim_rules() {
        let t = table(
            &["Claim ID", "Patient", "Amount", "Status"],
            &[
                &["C1", "P1", "-50", "Approved"],
                &["C2", "P2", "0", "On Hold"],
                &["C3", "P3", "2000000", "Denied"],
                &["C3", "P3", "2000000", "Denied"],
            ],
        );
        let report = validate(&t, &FieldAliases::default());

        assert!(report.issues.contains(&"Found 1 claims with negative amounts".to_string()));
        assert!(report.issues.contains(&"High number of zero-amount claims: 1".to_string()));
        assert!(report.issues.contains(&"Invalid status values found: On Hold".to_string()));
        assert!(report.issues.contains(&"Unusually large amounts: 2 records".to_string()));
        assert_eq!(report.duplicate_records, 1);
        assert!(report.warnings.contains(&"Found 1 duplicate records".to_string()));
        assert!(report
            .warnings
            .contains(&"Denied claims with positive amounts: 2 records".to_string()));
        assert!(report.quality_score < 0.7);
        assert!(report
            .recommendations
            .contains(&"Consider removing duplicate records".to_string()));
    }

    #[test]
    fn test_missing_required_columns() {
        let t = table(
            &["Claim Number", "Patient", "Provider"],
            &[&["C1", "P1", "Dr A"]],
        );
        let report = validate(&t, &FieldAliases::default());
        assert!(report
            .issues
            .contains(&"Missing required columns: amount, status".to_string()));
    }

    #[test]
    fn test_date_rules() {
        let t = table(
            &["Service Date", "Note"],
            &[&["2024-01-01", "a"], &["someday", "b"], &["1850-06-01", "c"]],
        );
        let report = validate(&t, &FieldAliases::default());
        assert!(report
            .issues
            .contains(&"Invalid dates in column 'Service Date': 1 records".to_string()));
        assert!(report
            .issues
            .contains(&"Very old dates found in 'Service Date': 1 records".to_string()));
    }

    #[test]
    fn test_missing_data_thresholds() {
        let t = table(&["A", "B"], &[&["1", ""], &["2", ""], &["3", "x"]]);
        let report = validate(&t, &FieldAliases::default());
        assert!((report.missing_ratio - 2.0 / 6.0).abs() < 1e-9);
        assert!(report.issues.iter().any(|i| i.starts_with("High percentage of missing data")));
        assert!(report
            .recommendations
            .contains(&"Address missing data through imputation or collection".to_string()));
    }
}
