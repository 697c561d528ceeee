//! Custom error types for the claims analysis engine.
//!
//! Row-level anomalies never surface here: resolution misses and malformed
//! cells are absorbed by the analyzers. Errors are reserved for grid sources
//! that cannot be read and for invalid configuration.
//!
//! Errors are serializable so an API layer can forward them as-is.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis engine.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The raw grid for a sheet is absent or unreadable.
    #[error("Failed to ingest '{source_name}': {reason}")]
    Ingestion { source_name: String, reason: String },

    /// Configuration text that could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Engine configuration rejected by validation.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by the CSV reader and column statistics.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any of the above wrapped with a description of the failing step.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Build an ingestion error for a named source.
    pub fn ingestion(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::Ingestion {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap the error with a description of the failing step.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code, unaffected by context wrapping.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ingestion { .. } => "INGESTION_FAILED",
            Self::InvalidConfig(_) | Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from reading a grid source.
    pub fn is_ingestion(&self) -> bool {
        match self {
            Self::Ingestion { .. } => true,
            Self::WithContext { source, .. } => source.is_ingestion(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// `.context(..)` for engine and polars results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
