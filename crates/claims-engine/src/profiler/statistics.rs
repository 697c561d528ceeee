//! Descriptive statistics for numeric columns.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub column: String,
    /// Number of parsed values the statistics are computed over.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); 0 for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    /// Values outside `[q1 - 1.5·IQR, q3 + 1.5·IQR]`.
    pub outlier_count: usize,
    /// Cells that are empty.
    pub null_count: usize,
    pub unique_count: usize,
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Sample standard deviation.
pub(crate) fn calculate_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Compute statistics for a column's parsed values.
///
/// Returns `None` when no value parsed.
pub(crate) fn numeric_statistics(
    column: &str,
    values: &[f64],
    null_count: usize,
) -> Result<Option<NumericStatistics>> {
    if values.is_empty() {
        return Ok(None);
    }

    let series = Series::new(column.into(), values);
    let mean = series.mean().unwrap_or(0.0);
    let median = series.median().unwrap_or(0.0);
    let unique_count = series.n_unique()?;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    let outlier_count = sorted
        .iter()
        .filter(|&&v| v < lower_bound || v > upper_bound)
        .count();

    Ok(Some(NumericStatistics {
        column: column.to_string(),
        count: values.len(),
        mean,
        median,
        std_dev: calculate_std(values, mean),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q1,
        q3,
        outlier_count,
        null_count,
        unique_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_statistics() {
        let stats = numeric_statistics("amount", &[1.0, 2.0, 3.0, 4.0], 1)
            .unwrap()
            .unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.unique_count, 4);
        assert!((stats.std_dev - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn test_outliers_by_iqr() {
        let values = [10.0, 11.0, 12.0, 11.0, 10.0, 12.0, 500.0];
        let stats = numeric_statistics("amount", &values, 0).unwrap().unwrap();
        assert_eq!(stats.outlier_count, 1);
        assert_eq!(stats.unique_count, 4);
    }

    #[test]
    fn test_single_value_has_zero_std() {
        let stats = numeric_statistics("x", &[7.0], 0).unwrap().unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.q1, 7.0);
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_no_values() {
        assert!(numeric_statistics("x", &[], 3).unwrap().is_none());
    }
}
