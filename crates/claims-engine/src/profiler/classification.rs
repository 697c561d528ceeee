//! Dataset kind detection from header names.

use serde::{Deserialize, Serialize};
use std::fmt;

const CLAIM_INDICATORS: [&str; 6] = ["claim", "patient", "provider", "insurance", "amount", "status"];
const MEDICAL_INDICATORS: [&str; 4] = ["diagnosis", "procedure", "icd", "cpt"];
const FINANCIAL_INDICATORS: [&str; 4] = ["amount", "cost", "payment", "billing"];

/// Broad kind of data a sheet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    HealthcareClaims,
    MedicalRecords,
    FinancialData,
    GeneralData,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::HealthcareClaims => "healthcare_claims",
            DatasetKind::MedicalRecords => "medical_records",
            DatasetKind::FinancialData => "financial_data",
            DatasetKind::GeneralData => "general_data",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count indicators that appear inside at least one lowercased header.
fn indicator_score(headers: &[String], indicators: &[&str]) -> usize {
    indicators
        .iter()
        .filter(|indicator| headers.iter().any(|h| h.contains(**indicator)))
        .count()
}

/// Classify a sheet by which indicator words its headers contain.
pub fn detect_dataset_kind<S: AsRef<str>>(headers: &[S]) -> DatasetKind {
    let lowered: Vec<String> = headers.iter().map(|h| h.as_ref().to_lowercase()).collect();

    if indicator_score(&lowered, &CLAIM_INDICATORS) >= 3 {
        DatasetKind::HealthcareClaims
    } else if indicator_score(&lowered, &MEDICAL_INDICATORS) >= 2 {
        DatasetKind::MedicalRecords
    } else if indicator_score(&lowered, &FINANCIAL_INDICATORS) >= 2 {
        DatasetKind::FinancialData
    } else {
        DatasetKind::GeneralData
    }
}
