use crate::analysis::{AnalysisOptions, AnalysisResult, AnalysisType};
use crate::error::Result;
use crate::taxonomy::Granularity;
use crate::types::{InferredType, ProcessedTable, QualityMetrics, Severity};
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything one CLI run produced, ready for JSON output.
///
/// Use this for both JSON output (`--json`) and file writing (`-o`).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_files: Vec<String>,
    pub analysis_type: AnalysisType,
    pub granularity: Granularity,
    pub tables: Vec<TableSummary>,
    pub insight_summary: InsightSummary,
    pub results: Vec<AnalysisResult>,
}

/// Shape and quality of one processed table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub record_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
    pub quality: QualityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub inferred_type: InferredType,
}

/// Insight counts across all results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub actionable: usize,
}

impl TableSummary {
    pub fn from_table(table: &ProcessedTable) -> Self {
        Self {
            name: table.name.clone(),
            record_count: table.record_count,
            column_count: table.column_count,
            columns: table
                .headers
                .iter()
                .zip(&table.column_types)
                .map(|(name, inferred_type)| ColumnSummary {
                    name: name.clone(),
                    inferred_type: *inferred_type,
                })
                .collect(),
            quality: table.quality,
        }
    }
}

impl InsightSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut summary = InsightSummary::default();
        for insight in results.iter().flat_map(|r| r.insights()) {
            summary.total += 1;
            match insight.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            if insight.actionable {
                summary.actionable += 1;
            }
        }
        summary
    }
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds and writes [`AnalysisReport`]s.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Assemble the report for one run.
    pub fn build_report(
        input_files: &[String],
        options: &AnalysisOptions,
        tables: &[ProcessedTable],
        results: Vec<AnalysisResult>,
    ) -> AnalysisReport {
        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_files: input_files.to_vec(),
            analysis_type: options.analysis_type,
            granularity: options.granularity,
            tables: tables.iter().map(TableSummary::from_table).collect(),
            insight_summary: InsightSummary::from_results(&results),
            results,
        }
    }

    /// Write a report as pretty JSON.
    ///
    /// For a base name of "claims" the file is `claims_report.json` in the
    /// output directory.
    pub fn write_report_to_file(
        &self,
        report: &AnalysisReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use crate::types::{RawTable, Value};
    use pretty_assertions::assert_eq;

    fn run() -> (Vec<ProcessedTable>, Vec<AnalysisResult>) {
        let engine = AnalysisEngine::default();
        let raw = RawTable::new(
            "claims",
            vec![
                vec![Value::from("Status"), Value::from("Amount")],
                vec![Value::from("Rejected"), Value::from("150")],
                vec![Value::from("Approved"), Value::from("50")],
            ],
        );
        let tables = vec![engine.process_table(&raw)];
        let results = engine.run(&tables, &AnalysisOptions::default()).unwrap();
        (tables, results)
    }

    #[test]
    fn test_build_report() {
        let (tables, results) = run();
        let expected = InsightSummary::from_results(&results);
        let report = ReportGenerator::build_report(
            &["claims.csv".to_string()],
            &AnalysisOptions::default(),
            &tables,
            results,
        );

        assert_eq!(report.tables[0].record_count, 2);
        assert_eq!(
            report.tables[0].columns[1],
            ColumnSummary {
                name: "Amount".into(),
                inferred_type: InferredType::Number
            }
        );
        assert_eq!(report.insight_summary, expected);
        assert_eq!(
            report.insight_summary.total,
            report.insight_summary.high + report.insight_summary.medium + report.insight_summary.low
        );
        assert!(report.insight_summary.high >= 1);
    }

    #[test]
    fn test_write_report_to_file() {
        let (tables, results) = run();
        let report =
            ReportGenerator::build_report(&[], &AnalysisOptions::default(), &tables, results);

        let dir = std::env::temp_dir().join(format!("claims-engine-report-{}", std::process::id()));
        let path = ReportGenerator::new(dir.clone())
            .write_report_to_file(&report, "claims")
            .unwrap();

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("claims_report.json"));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["analysis_type"], "comprehensive");
        assert_eq!(written["tables"][0]["name"], "claims");

        fs::remove_dir_all(dir).ok();
    }
}
