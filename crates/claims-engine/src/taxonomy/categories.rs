//! Keyword-driven rejection reason categories.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business category of a rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionCategory {
    Medical,
    Administrative,
    Eligibility,
    Financial,
    Other,
}

impl RejectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCategory::Medical => "medical",
            RejectionCategory::Administrative => "administrative",
            RejectionCategory::Eligibility => "eligibility",
            RejectionCategory::Financial => "financial",
            RejectionCategory::Other => "other",
        }
    }

    /// Impact level assigned to rejections of this category.
    pub fn severity(&self) -> Severity {
        match self {
            RejectionCategory::Medical | RejectionCategory::Eligibility => Severity::High,
            RejectionCategory::Administrative | RejectionCategory::Financial => Severity::Medium,
            RejectionCategory::Other => Severity::Low,
        }
    }

    /// Administrative rejections can usually be fixed and resubmitted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RejectionCategory::Administrative)
    }
}

impl fmt::Display for RejectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword phrases for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: RejectionCategory,
    pub keywords: Vec<String>,
}

impl CategoryKeywords {
    pub fn new(category: RejectionCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, lowered_reason: &str) -> bool {
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            !keyword.is_empty() && lowered_reason.contains(&keyword)
        })
    }
}

/// Ordered category table. The first category with a matching keyword wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejectionTaxonomy {
    pub categories: Vec<CategoryKeywords>,
}

impl Default for RejectionTaxonomy {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryKeywords::new(
                    RejectionCategory::Medical,
                    &[
                        "medical necessity",
                        "medically necessary",
                        "diagnosis",
                        "procedure",
                        "clinical",
                        "treatment",
                        "experimental",
                        "investigational",
                        "pre-existing",
                    ],
                ),
                CategoryKeywords::new(
                    RejectionCategory::Administrative,
                    &[
                        "documentation",
                        "missing information",
                        "incomplete",
                        "authorization",
                        "duplicate",
                        "coding",
                        "code",
                        "late submission",
                        "timely filing",
                        "form",
                        "signature",
                    ],
                ),
                CategoryKeywords::new(
                    RejectionCategory::Eligibility,
                    &[
                        "eligib",
                        "not covered",
                        "coverage",
                        "member",
                        "enrollment",
                        "terminated",
                        "expired",
                        "inactive",
                        "policy",
                    ],
                ),
                CategoryKeywords::new(
                    RejectionCategory::Financial,
                    &[
                        "limit",
                        "exceeded",
                        "maximum",
                        "deductible",
                        "copay",
                        "payment",
                        "cost",
                        "amount",
                        "benefit cap",
                        "price",
                    ],
                ),
            ],
        }
    }
}

impl RejectionTaxonomy {
    /// Classify a free-text reason. Unmatched or blank reasons are `Other`.
    pub fn categorize(&self, reason: &str) -> RejectionCategory {
        let lowered = reason.to_lowercase();
        self.categories
            .iter()
            .find(|entry| entry.matches(&lowered))
            .map(|entry| entry.category)
            .unwrap_or(RejectionCategory::Other)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
