//! Configuration types for the analysis engine.
//!
//! The alias table, rejection taxonomy and amount ladder are plain data that
//! the engine receives at construction. Use [`EngineConfig::builder()`] for a
//! fluent setup, or deserialize from JSON (every field has a default).

use crate::error::AnalysisError;
use crate::resolver::FieldAliases;
use crate::taxonomy::{AmountLadder, RejectionTaxonomy};
use serde::{Deserialize, Serialize};

/// Configuration for the analysis engine.
///
/// # Example
///
/// ```rust,ignore
/// use claims_engine::config::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .type_sample_size(50)
///     .high_rejection_rate(15.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidate header names per business concept.
    pub aliases: FieldAliases,

    /// Ordered rejection categories with their keyword phrases.
    pub taxonomy: RejectionTaxonomy,

    /// Monetary range ladder used for amount distributions.
    pub amount_ladder: AmountLadder,

    /// Maximum number of filled values sampled per column for type inference.
    /// Default: 100
    pub type_sample_size: usize,

    /// Fraction of the sample that must parse as numbers (0.0 - 1.0).
    /// Default: 0.8
    pub number_threshold: f64,

    /// Fraction of the sample that must parse as dates (0.0 - 1.0).
    /// Default: 0.6
    pub date_threshold: f64,

    /// Fraction of the sample that must be boolean tokens (0.0 - 1.0).
    /// Default: 0.8
    pub boolean_threshold: f64,

    /// Fraction of non-null values that must match the inferred type for a
    /// column to count as consistent (0.0 - 1.0).
    /// Default: 0.8
    pub consistency_threshold: f64,

    /// Rejection rate (percent) above which a high-severity insight is raised.
    /// Default: 20.0
    pub high_rejection_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aliases: FieldAliases::default(),
            taxonomy: RejectionTaxonomy::default(),
            amount_ladder: AmountLadder::default(),
            type_sample_size: 100,
            number_threshold: 0.8,
            date_threshold: 0.6,
            boolean_threshold: 0.8,
            consistency_threshold: 0.8,
            high_rejection_rate: 20.0,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration. Missing fields keep their defaults.
    pub fn from_json(content: &str) -> crate::error::Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("number_threshold", self.number_threshold),
            ("date_threshold", self.date_threshold),
            ("boolean_threshold", self.boolean_threshold),
            ("consistency_threshold", self.consistency_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !(0.0..=100.0).contains(&self.high_rejection_rate) {
            return Err(ConfigValidationError::InvalidPercentage {
                field: "high_rejection_rate".to_string(),
                value: self.high_rejection_rate,
            });
        }

        if self.type_sample_size == 0 {
            return Err(ConfigValidationError::InvalidSampleSize(
                self.type_sample_size,
            ));
        }

        if self.amount_ladder.bands.is_empty() || !self.amount_ladder.is_ascending() {
            return Err(ConfigValidationError::InvalidAmountLadder);
        }

        if let Some(concept) = crate::resolver::FieldConcept::ALL
            .into_iter()
            .find(|c| self.aliases.candidates(*c).is_empty())
        {
            return Err(ConfigValidationError::EmptyAliases(concept.to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid percentage for '{field}': {value} (must be between 0 and 100)")]
    InvalidPercentage { field: String, value: f64 },

    #[error("Invalid type sample size: {0} (must be at least 1)")]
    InvalidSampleSize(usize),

    #[error("Invalid amount ladder: bands must be non-empty with strictly ascending lower bounds")]
    InvalidAmountLadder,

    #[error("No alias candidates for concept '{0}'")]
    EmptyAliases(String),
}

/// Builder for [`EngineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    aliases: Option<FieldAliases>,
    taxonomy: Option<RejectionTaxonomy>,
    amount_ladder: Option<AmountLadder>,
    type_sample_size: Option<usize>,
    number_threshold: Option<f64>,
    date_threshold: Option<f64>,
    boolean_threshold: Option<f64>,
    consistency_threshold: Option<f64>,
    high_rejection_rate: Option<f64>,
}

impl EngineConfigBuilder {
    /// Replace the alias table.
    pub fn aliases(mut self, aliases: FieldAliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Replace the rejection taxonomy.
    pub fn taxonomy(mut self, taxonomy: RejectionTaxonomy) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Replace the amount ladder.
    pub fn amount_ladder(mut self, ladder: AmountLadder) -> Self {
        self.amount_ladder = Some(ladder);
        self
    }

    /// Set the per-column sample size for type inference.
    pub fn type_sample_size(mut self, size: usize) -> Self {
        self.type_sample_size = Some(size);
        self
    }

    pub fn number_threshold(mut self, threshold: f64) -> Self {
        self.number_threshold = Some(threshold);
        self
    }

    pub fn date_threshold(mut self, threshold: f64) -> Self {
        self.date_threshold = Some(threshold);
        self
    }

    pub fn boolean_threshold(mut self, threshold: f64) -> Self {
        self.boolean_threshold = Some(threshold);
        self
    }

    pub fn consistency_threshold(mut self, threshold: f64) -> Self {
        self.consistency_threshold = Some(threshold);
        self
    }

    /// Set the rejection rate (percent) that triggers a high-severity insight.
    pub fn high_rejection_rate(mut self, rate: f64) -> Self {
        self.high_rejection_rate = Some(rate);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EngineConfig` or an error if validation fails.
    pub fn build(self) -> Result<EngineConfig, ConfigValidationError> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            aliases: self.aliases.unwrap_or(defaults.aliases),
            taxonomy: self.taxonomy.unwrap_or(defaults.taxonomy),
            amount_ladder: self.amount_ladder.unwrap_or(defaults.amount_ladder),
            type_sample_size: self.type_sample_size.unwrap_or(defaults.type_sample_size),
            number_threshold: self.number_threshold.unwrap_or(defaults.number_threshold),
            date_threshold: self.date_threshold.unwrap_or(defaults.date_threshold),
            boolean_threshold: self.boolean_threshold.unwrap_or(defaults.boolean_threshold),
            consistency_threshold: self
                .consistency_threshold
                .unwrap_or(defaults.consistency_threshold),
            high_rejection_rate: self
                .high_rejection_rate
                .unwrap_or(defaults.high_rejection_rate),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::AmountBand;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.type_sample_size, 100);
        assert_eq!(config.number_threshold, 0.8);
        assert_eq!(config.date_threshold, 0.6);
        assert_eq!(config.boolean_threshold, 0.8);
        assert_eq!(config.high_rejection_rate, 20.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = EngineConfig::builder()
            .type_sample_size(25)
            .high_rejection_rate(10.0)
            .build()
            .unwrap();

        assert_eq!(config.type_sample_size, 25);
        assert_eq!(config.high_rejection_rate, 10.0);
        assert_eq!(config.consistency_threshold, 0.8);
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = EngineConfig::builder().date_threshold(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_sample_size() {
        let result = EngineConfig::builder().type_sample_size(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSampleSize(0)
        ));
    }

    #[test]
    fn test_validation_descending_ladder() {
        let ladder = AmountLadder {
            bands: vec![AmountBand::new(500.0, "high"), AmountBand::new(0.0, "low")],
        };
        let result = EngineConfig::builder().amount_ladder(ladder).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidAmountLadder
        ));
    }

    #[test]
    fn test_validation_empty_aliases() {
        let aliases = FieldAliases {
            status: Vec::new(),
            ..FieldAliases::default()
        };
        let err = EngineConfig::builder().aliases(aliases).build().unwrap_err();
        assert_eq!(err.to_string(), "No alias candidates for concept 'status'");
    }

    #[test]
    fn test_partial_config_from_json() {
        let json = r#"{
            "high_rejection_rate": 12.5,
            "aliases": { "status": ["outcome"] }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.high_rejection_rate, 12.5);
        assert_eq!(config.aliases.status, vec!["outcome".to_string()]);
        assert_eq!(config.aliases.amount, FieldAliases::default().amount);
        assert_eq!(config.type_sample_size, 100);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));

        let err = EngineConfig::from_json(r#"{"date_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
