//! Report generation module.
//!
//! [`AnalysisReport`] bundles the processed-table summaries and every
//! analysis result of a run, suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`-o` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use claims_engine::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(&inputs, &options, &tables, results);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&report, "claims")?;
//! ```

mod generator;

pub use generator::{
    AnalysisReport, ColumnSummary, InsightSummary, ReportGenerator, TableSummary,
};
