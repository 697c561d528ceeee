//! Dataset profiling.
//!
//! This module provides descriptive profiling of a processed table:
//! - Dataset kind detection from header indicator words
//! - Descriptive statistics for number-typed columns
//! - The date range covered by the first usable date column

mod classification;
mod statistics;

pub use classification::{DatasetKind, detect_dataset_kind};
pub use statistics::NumericStatistics;

use crate::error::Result;
use crate::types::{InferredType, ProcessedTable, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statistics::numeric_statistics;

static NULL: Value = Value::Null;

/// First and last date found in a date column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub column: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Descriptive profile of one processed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub kind: DatasetKind,
    pub record_count: usize,
    pub column_count: usize,
    pub numeric_columns: Vec<NumericStatistics>,
    pub date_range: Option<DateRange>,
}

/// Profiler for processed tables.
pub struct DatasetProfiler;

impl DatasetProfiler {
    /// Profile a table: kind, numeric statistics and date range.
    pub fn profile(table: &ProcessedTable) -> Result<DatasetProfile> {
        Ok(DatasetProfile {
            kind: detect_dataset_kind(&table.headers),
            record_count: table.record_count,
            column_count: table.column_count,
            numeric_columns: Self::numeric_columns(table)?,
            date_range: Self::date_range(table),
        })
    }

    fn column_values<'t>(table: &'t ProcessedTable, header: &'t str) -> impl Iterator<Item = &'t Value> {
        table.records.iter().map(move |r| r.get(header).unwrap_or(&NULL))
    }

    /// Statistics for every number-typed column with at least one parsed value.
    pub fn numeric_columns(table: &ProcessedTable) -> Result<Vec<NumericStatistics>> {
        let mut stats = Vec::new();

        for (header, inferred) in table.headers.iter().zip(&table.column_types) {
            if *inferred != InferredType::Number {
                continue;
            }

            let mut values = Vec::new();
            let mut null_count = 0;
            for value in Self::column_values(table, header) {
                if !value.is_filled() {
                    null_count += 1;
                } else if let Some(n) = value.as_number() {
                    values.push(n);
                }
            }

            if let Some(column_stats) = numeric_statistics(header, &values, null_count)? {
                stats.push(column_stats);
            }
        }

        Ok(stats)
    }

    /// Earliest and latest date of the first date-typed column that has any.
    pub fn date_range(table: &ProcessedTable) -> Option<DateRange> {
        table
            .headers
            .iter()
            .zip(&table.column_types)
            .filter(|(_, inferred)| **inferred == InferredType::Date)
            .find_map(|(header, _)| {
                let dates: Vec<NaiveDate> = Self::column_values(table, header)
                    .filter_map(Value::as_date)
                    .collect();
                let start = dates.iter().min()?;
                let end = dates.iter().max()?;
                Some(DateRange {
                    column: header.clone(),
                    start: *start,
                    end: *end,
                })
            })
    }
}
