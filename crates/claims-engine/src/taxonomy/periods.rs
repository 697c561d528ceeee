//! Time-period keys and direction of period series.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolution at which dates are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "quarterly" => Ok(Granularity::Quarterly),
            "yearly" => Ok(Granularity::Yearly),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// Format a date as a period key.
///
/// | granularity | key          |
/// |-------------|--------------|
/// | daily       | `2024-03-15` |
/// | weekly      | `2024-W11`   |
/// | monthly     | `2024-03`    |
/// | quarterly   | `2024-Q1`    |
/// | yearly      | `2024`       |
///
/// Weekly keys use the ISO week-numbering year, so 2024-12-30 is `2025-W01`.
pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Quarterly => format!("{:04}-Q{}", date.year(), date.month0() / 3 + 1),
        Granularity::Yearly => format!("{:04}", date.year()),
    }
}

/// Direction of a series of per-period values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl TrendDirection {
    /// Compare the mean of the last three periods to the mean of the first three.
    ///
    /// More than 10% above is increasing, more than 10% below is decreasing.
    /// Fewer than two periods is always stable.
    pub fn from_series(values: &[f64]) -> Self {
        if values.len() < 2 {
            return TrendDirection::Stable;
        }
        let window = values.len().min(3);
        let earlier = mean(&values[..window]);
        let recent = mean(&values[values.len() - window..]);

        if recent > earlier * 1.1 {
            TrendDirection::Increasing
        } else if recent < earlier * 0.9 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
