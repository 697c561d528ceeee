//! CLI entry point for the claims analysis engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use claims_engine::quality::validate;
use claims_engine::reporting::{AnalysisReport, ReportGenerator};
use claims_engine::resolver::FieldConcept;
use claims_engine::utils::truncate_str;
use claims_engine::{
    AnalysisEngine, AnalysisOptions, AnalysisResult, AnalysisType, EngineConfig, Granularity,
    ProcessedTable, RawTable, source,
};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI-compatible analysis type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAnalysisType {
    /// Rejection and quality analysis per file
    Basic,
    /// Adds trends, pooled rejections, patterns and comparison
    Comprehensive,
}

impl From<CliAnalysisType> for AnalysisType {
    fn from(cli: CliAnalysisType) -> Self {
        match cli {
            CliAnalysisType::Basic => AnalysisType::Basic,
            CliAnalysisType::Comprehensive => AnalysisType::Comprehensive,
        }
    }
}

/// CLI-compatible granularity enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliGranularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl From<CliGranularity> for Granularity {
    fn from(cli: CliGranularity) -> Self {
        match cli {
            CliGranularity::Daily => Granularity::Daily,
            CliGranularity::Weekly => Granularity::Weekly,
            CliGranularity::Monthly => Granularity::Monthly,
            CliGranularity::Quarterly => Granularity::Quarterly,
            CliGranularity::Yearly => Granularity::Yearly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Heuristic analysis of healthcare claim spreadsheets",
    long_about = "Analyzes claim exports with unknown column naming: rejection \
                  statistics, trends, cross-file patterns and quality scores.\n\n\
                  EXAMPLES:\n  \
                  # Analyze one file\n  \
                  claims-engine -i claims.csv\n\n  \
                  # Compare two files and write a JSON report\n  \
                  claims-engine -i north.csv -i south.csv -o reports/\n\n  \
                  # Preview column resolution without analyzing\n  \
                  claims-engine -i claims.csv --dry-run\n\n  \
                  # Machine-readable output\n  \
                  claims-engine -i claims.csv --json | jq .insight_summary"
)]
struct Args {
    /// Input file (CSV or JSON grid); repeat for several files
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Which analyses to run
    #[arg(long, value_enum, default_value = "comprehensive")]
    analysis: CliAnalysisType,

    /// Period size for trend analysis
    #[arg(long, value_enum, default_value = "monthly")]
    granularity: CliGranularity,

    /// Pattern types, comma separated (default: all)
    ///
    /// rejection_reasons, rejection_categories, providers, specialties,
    /// amount_ranges, statuses, monthly_volume
    #[arg(long, value_delimiter = ',')]
    patterns: Vec<String>,

    /// Comparison metrics, comma separated (default: all)
    ///
    /// volume, quality, completeness, validity, consistency, rejection_rate,
    /// total_amount, average_amount, rejected_amount
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Trend metrics, comma separated (default: claims,rejections)
    #[arg(long, value_delimiter = ',')]
    trend_metrics: Vec<String>,

    /// Engine configuration file (JSON); missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Directory to write <first_input>_report.json into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Show ingestion and column resolution without running analyses
    #[arg(long)]
    dry_run: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, quiet))
        .with_target(false)
        .init();
}

/// `RUST_LOG` wins over the CLI level; `--quiet` lowers the CLI level to warn.
fn log_filter(level: &str, quiet: bool) -> EnvFilter {
    let effective_level = if quiet { "warn" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level))
}

fn main() -> Result<()> {
    // Load .env first so RUST_LOG from it reaches the log filter.
    dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = load_config(args.config.as_deref())?;
    let engine = AnalysisEngine::new(config)?;

    let mut raw_tables: Vec<RawTable> = Vec::new();
    for input in &args.inputs {
        if !input.exists() {
            return Err(anyhow!("Input file not found: {}", input.display()));
        }
        raw_tables.extend(source::load_path(input)?);
    }

    let tables: Vec<ProcessedTable> = raw_tables.iter().map(|raw| engine.process_table(raw)).collect();

    if args.dry_run {
        run_dry_run(&engine, &tables);
        return Ok(());
    }

    let options = build_options(&args);
    let results = engine.run(&tables, &options).map_err(|e| {
        error!("Analysis failed: {}", e);
        anyhow!("Analysis failed: {}", e)
    })?;

    let input_files: Vec<String> = args
        .inputs
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let report = ReportGenerator::build_report(&input_files, &options, &tables, results);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&report);
    }

    if let Some(dir) = &args.output {
        let base = args
            .inputs
            .first()
            .map(|p| source::source_name(p))
            .unwrap_or_else(|| "claims".to_string());
        let path = ReportGenerator::new(dir.clone()).write_report_to_file(&report, &base)?;
        info!("Report written to: {}", path.display());
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    info!("Loading engine configuration from: {}", path.display());
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read config {}: {}", path.display(), e))?;
    Ok(EngineConfig::from_json(&content)?)
}

fn build_options(args: &Args) -> AnalysisOptions {
    let mut options = AnalysisOptions {
        analysis_type: args.analysis.into(),
        granularity: args.granularity.into(),
        ..AnalysisOptions::default()
    };
    if !args.patterns.is_empty() {
        options.pattern_types = args.patterns.clone();
    }
    if !args.metrics.is_empty() {
        options.comparison_metrics = args.metrics.clone();
    }
    if !args.trend_metrics.is_empty() {
        options.trend_metrics = args.trend_metrics.clone();
    }
    options
}

/// Run dry-run mode: show how each sheet was read and resolved.
///
/// Uses `println!` on purpose: this output is the point of `--dry-run` and
/// must show regardless of log level.
fn run_dry_run(engine: &AnalysisEngine, tables: &[ProcessedTable]) {
    let aliases = &engine.config().aliases;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of ingestion and column resolution");
    println!("{}\n", "=".repeat(80));

    for table in tables {
        println!("SHEET: {}", table.name);
        println!("{}", "-".repeat(40));
        println!("  Records: {}", table.record_count);
        println!("  Columns: {}", table.column_count);
        println!("  Quality: {:.1}", table.quality.composite_score);
        println!();

        println!("  {:<30} {:<10}", "Column", "Type");
        println!("  {}", "-".repeat(42));
        for (header, inferred) in table.headers.iter().zip(&table.column_types) {
            println!("  {:<30} {:<10}", truncate_str(header, 29), inferred);
        }
        println!();

        println!("  RESOLVED FIELDS");
        for concept in FieldConcept::ALL {
            let matched = aliases
                .matching_header(concept, &table.headers)
                .unwrap_or("(not found)");
            println!("  {:<18} -> {}", concept, matched);
        }
        println!();

        let report = validate(table, aliases);
        println!("  Dataset kind: {}", report.dataset_kind);
        if report.issues.is_empty() && report.warnings.is_empty() {
            println!("  No validation issues detected");
        }
        for issue in &report.issues {
            println!("  - [issue] {}", issue);
        }
        for warning in &report.warnings {
            println!("  - [warning] {}", warning);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    println!("To run the analyses, run without --dry-run");
    println!("{}", "=".repeat(80));
}

/// Print a human-readable summary of the analysis results.
fn print_human_readable_summary(report: &AnalysisReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLAIMS ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    for table in &report.tables {
        println!(
            "{}: {} records x {} columns, quality {:.1} (completeness {:.1}, validity {:.1}, consistency {:.1})",
            table.name,
            table.record_count,
            table.column_count,
            table.quality.composite_score,
            table.quality.completeness,
            table.quality.validity,
            table.quality.consistency
        );
    }
    println!();

    for result in &report.results {
        match result {
            AnalysisResult::Rejection(r) => {
                println!(
                    "Rejections [{}]: {}/{} ({:.2}%), rejected amount {:.2}, potential recovery {:.2}",
                    r.source,
                    r.rejected_count,
                    r.total_count,
                    r.rejection_rate,
                    r.total_rejected_amount,
                    r.potential_recovery
                );
                for reason in r.top_reasons.iter().take(3) {
                    println!(
                        "  - {} ({}, {:.1}%)",
                        truncate_str(&reason.reason, 50),
                        reason.category,
                        reason.percentage
                    );
                }
            }
            AnalysisResult::Trend(t) => println!(
                "Trend [{}]: {} {} periods, direction {}",
                t.source,
                t.periods.len(),
                t.granularity,
                t.direction
            ),
            AnalysisResult::Quality(q) => println!(
                "Validation [{}]: {} issues, {} warnings, score {:.2}",
                q.source,
                q.validation.issues.len(),
                q.validation.warnings.len(),
                q.validation.quality_score
            ),
            AnalysisResult::Pattern(p) => println!(
                "Patterns: {} pattern types across {} tables",
                p.patterns.len(),
                p.table_count
            ),
            AnalysisResult::Comparison(c) => println!(
                "Comparison: {} metrics across {} tables",
                c.metrics.len(),
                c.table_count
            ),
        }
    }
    println!();

    let summary = &report.insight_summary;
    println!(
        "Insights: {} total ({} high, {} medium, {} low, {} actionable)",
        summary.total, summary.high, summary.medium, summary.low, summary.actionable
    );
    for insight in report
        .results
        .iter()
        .flat_map(|r| r.insights())
        .filter(|i| i.severity == claims_engine::Severity::High)
    {
        println!("  ! {}: {}", insight.title, insight.description);
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("Use -o <dir> to save a detailed JSON report");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_env_file_feeds_log_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(log_filter("debug", false).to_string(), "debug");
        assert_eq!(log_filter("debug", true).to_string(), "warn");

        let dir = std::env::temp_dir().join(format!("claims-engine-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let env_file = dir.join(".env");
        std::fs::write(&env_file, "RUST_LOG=trace\n").unwrap();

        dotenv::from_path(&env_file).unwrap();
        assert_eq!(log_filter("info", true).to_string(), "trace");

        std::fs::remove_dir_all(dir).ok();
    }
}
