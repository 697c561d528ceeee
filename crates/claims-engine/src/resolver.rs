//! Fuzzy field resolution.
//!
//! Claim exports name the same business concept in many ways ("Amount",
//! "ClaimAmount", "total_amount"...). Every analyzer reads fields through
//! [`resolve`] so the matching rule lives in exactly one place.

use crate::types::{Record, Value};
use crate::utils::parse_numeric_string;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Concepts and Aliases
// ============================================================================

/// Canonical business concept a column may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldConcept {
    Amount,
    Date,
    Provider,
    Specialty,
    Status,
    RejectionReason,
    ClaimId,
    Patient,
}

impl FieldConcept {
    pub const ALL: [FieldConcept; 8] = [
        FieldConcept::Amount,
        FieldConcept::Date,
        FieldConcept::Provider,
        FieldConcept::Specialty,
        FieldConcept::Status,
        FieldConcept::RejectionReason,
        FieldConcept::ClaimId,
        FieldConcept::Patient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldConcept::Amount => "amount",
            FieldConcept::Date => "date",
            FieldConcept::Provider => "provider",
            FieldConcept::Specialty => "specialty",
            FieldConcept::Status => "status",
            FieldConcept::RejectionReason => "rejection_reason",
            FieldConcept::ClaimId => "claim_id",
            FieldConcept::Patient => "patient",
        }
    }
}

impl fmt::Display for FieldConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered candidate header names per concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub amount: Vec<String>,
    pub date: Vec<String>,
    pub provider: Vec<String>,
    pub specialty: Vec<String>,
    pub status: Vec<String>,
    pub rejection_reason: Vec<String>,
    pub claim_id: Vec<String>,
    pub patient: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            amount: names(&["amount", "claim_amount", "total_amount", "paid_amount", "cost"]),
            date: names(&[
                "date",
                "claim_date",
                "service_date",
                "submission_date",
                "date_of_service",
            ]),
            provider: names(&[
                "provider",
                "provider_name",
                "provider_id",
                "doctor",
                "physician",
                "facility",
                "hospital",
            ]),
            specialty: names(&["specialty", "speciality", "department", "service_type"]),
            status: names(&["status", "claim_status", "approval_status", "result"]),
            rejection_reason: names(&[
                "rejection_reason",
                "denial_reason",
                "reason",
                "comments",
                "notes",
            ]),
            claim_id: names(&[
                "claim_id",
                "claimid",
                "claim_number",
                "claim_no",
                "claim id",
                "claim number",
            ]),
            patient: names(&["patient_id", "patient", "member_id", "member id"]),
        }
    }
}

impl FieldAliases {
    pub fn candidates(&self, concept: FieldConcept) -> &[String] {
        match concept {
            FieldConcept::Amount => &self.amount,
            FieldConcept::Date => &self.date,
            FieldConcept::Provider => &self.provider,
            FieldConcept::Specialty => &self.specialty,
            FieldConcept::Status => &self.status,
            FieldConcept::RejectionReason => &self.rejection_reason,
            FieldConcept::ClaimId => &self.claim_id,
            FieldConcept::Patient => &self.patient,
        }
    }

    /// First header that any candidate of `concept` matches, if any.
    pub fn matching_header<'h>(
        &self,
        concept: FieldConcept,
        headers: &'h [String],
    ) -> Option<&'h str> {
        self.candidates(concept).iter().find_map(|candidate| {
            let lowered = candidate.to_lowercase();
            headers
                .iter()
                .find(|h| *h == candidate)
                .or_else(|| headers.iter().find(|h| h.to_lowercase() == lowered))
                .or_else(|| headers.iter().find(|h| field_matches(candidate, h)))
                .map(String::as_str)
        })
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Case-insensitive substring containment in either direction.
///
/// Empty candidates or keys never match.
pub fn field_matches(candidate: &str, key: &str) -> bool {
    if candidate.is_empty() || key.is_empty() {
        return false;
    }
    let candidate = candidate.to_lowercase();
    let key = key.to_lowercase();
    key.contains(&candidate) || candidate.contains(&key)
}

/// Resolve the first candidate that matches a record key.
///
/// For each candidate in order: exact key, then case-insensitive exact key,
/// then [`field_matches`] over keys in insertion order.
pub fn resolve<'r, S: AsRef<str>>(record: &'r Record, candidates: &[S]) -> Option<&'r Value> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.as_ref();
        let lowered = candidate.to_lowercase();
        record
            .get(candidate)
            .or_else(|| {
                record
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == lowered)
                    .map(|(_, value)| value)
            })
            .or_else(|| {
                record
                    .iter()
                    .find(|(key, _)| field_matches(candidate, key))
                    .map(|(_, value)| value)
            })
    })
}

/// First filled value, trying each candidate on its own.
pub fn resolve_non_empty<'r, S: AsRef<str>>(
    record: &'r Record,
    candidates: &[S],
) -> Option<&'r Value> {
    candidates
        .iter()
        .filter_map(|candidate| resolve(record, std::slice::from_ref(candidate)))
        .find(|value| value.is_filled())
}

// ============================================================================
// Typed Extraction
// ============================================================================

/// Typed accessors over a record, bound to an alias table.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    aliases: &'a FieldAliases,
}

impl<'a> FieldResolver<'a> {
    pub fn new(aliases: &'a FieldAliases) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &'a FieldAliases {
        self.aliases
    }

    pub fn value<'r>(&self, record: &'r Record, concept: FieldConcept) -> Option<&'r Value> {
        resolve(record, self.aliases.candidates(concept))
    }

    /// Finite monetary amount; currency symbols and separators are tolerated.
    pub fn amount(&self, record: &Record) -> Option<f64> {
        match self.value(record, FieldConcept::Amount)? {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_numeric_string(s),
            _ => None,
        }
    }

    pub fn date(&self, record: &Record) -> Option<NaiveDate> {
        self.value(record, FieldConcept::Date)?.as_date()
    }

    /// Trimmed text of a filled value.
    pub fn text(&self, record: &Record, concept: FieldConcept) -> Option<String> {
        let value = self.value(record, concept)?;
        let text = value.to_text();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    pub fn provider(&self, record: &Record) -> Option<String> {
        self.text(record, FieldConcept::Provider)
    }

    pub fn specialty(&self, record: &Record) -> Option<String> {
        self.text(record, FieldConcept::Specialty)
    }

    pub fn status(&self, record: &Record) -> Option<String> {
        self.text(record, FieldConcept::Status)
    }
}
