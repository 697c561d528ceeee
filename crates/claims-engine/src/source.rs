//! Grid sources: turn files into [`RawTable`]s.
//!
//! The engine itself never touches the filesystem. These loaders sit in
//! front of it for the CLI and tests:
//! - CSV files, read through polars with every cell kept as text
//! - JSON grids, either one array of rows or an object of named sheets
//!
//! A source that is missing or cannot be parsed is an
//! [`AnalysisError::Ingestion`]; empty but well-formed sources are not.

use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{RawTable, Value};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Sheet name for a file: its stem, or "sheet" when there is none.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string()
}

/// Field count of the widest record, honouring quoted separators and newlines.
fn widest_record(content: &str) -> usize {
    let mut widest = 0;
    let mut fields = 1;
    let mut in_quotes = false;
    let mut line_has_content = false;

    for c in content.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                line_has_content = true;
            }
            ',' if !in_quotes => {
                fields += 1;
                line_has_content = true;
            }
            '\n' if !in_quotes => {
                if line_has_content {
                    widest = widest.max(fields);
                }
                fields = 1;
                line_has_content = false;
            }
            '\r' => {}
            _ => line_has_content = true,
        }
    }
    if line_has_content {
        widest = widest.max(fields);
    }
    widest
}

fn csv_options(width: usize) -> CsvReadOptions {
    // No header row and an all-string schema as wide as the widest record, so
    // a short preamble line cannot narrow the grid.
    let schema = Schema::from_iter(
        (1..=width).map(|idx| Field::new(format!("column_{}", idx).into(), DataType::String)),
    );

    CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Arc::new(schema)))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(true),
        )
}

/// Convert a string-typed frame into grid rows. Nulls and empty fields become `Null`.
pub fn grid_from_dataframe(df: &DataFrame) -> Result<Vec<Vec<Value>>> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| c.cast(&DataType::String))
        .collect::<PolarsResult<Vec<Column>>>()
        .context("Casting CSV columns to text")?;
    let strings = columns
        .iter()
        .map(|c| c.as_materialized_series().str())
        .collect::<PolarsResult<Vec<&StringChunked>>>()
        .context("Reading CSV text columns")?;

    let rows = (0..df.height())
        .map(|idx| {
            strings
                .iter()
                .map(|ca| match ca.get(idx) {
                    Some(s) if !s.is_empty() => Value::from(s),
                    _ => Value::Null,
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Read CSV text into a raw table.
pub fn read_csv_str(name: &str, content: &str) -> Result<RawTable> {
    if content.trim().is_empty() {
        return Ok(RawTable::new(name, Vec::new()));
    }

    let df = csv_options(widest_record(content))
        .into_reader_with_file_handle(Cursor::new(content.as_bytes().to_vec()))
        .finish()
        .map_err(|e| AnalysisError::ingestion(name, e.to_string()))?;

    Ok(RawTable::new(name, grid_from_dataframe(&df)?))
}

/// Read a CSV file into a raw table named after the file stem.
pub fn load_csv(path: &Path) -> Result<RawTable> {
    let name = source_name(path);
    let content = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::ingestion(&name, format!("{}: {}", path.display(), e)))?;

    let table = match read_csv_str(&name, &content) {
        Ok(table) => table,
        Err(e) => {
            debug!("Standard CSV read of '{}' failed: {}", name, e);
            read_csv_str(&name, &clean_csv_content(&content))?
        }
    };

    info!("Loaded '{}': {} rows", table.name, table.rows.len());
    Ok(table)
}

/// Collapse doubled quote runs left by some spreadsheet exports.
fn clean_csv_content(content: &str) -> String {
    content.replace("\"\"\"", "\"").replace("\"\"", "\"")
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum JsonGrid {
    Sheet(Vec<Vec<Value>>),
    Workbook(BTreeMap<String, Vec<Vec<Value>>>),
}

/// Parse a JSON grid.
///
/// An array of rows is one sheet called `name`; an object maps sheet names
/// to their rows and yields one table per sheet, in name order.
pub fn read_json_str(name: &str, content: &str) -> Result<Vec<RawTable>> {
    let grid: JsonGrid = serde_json::from_str(content)
        .map_err(|e| AnalysisError::ingestion(name, format!("malformed JSON grid: {}", e)))?;

    Ok(match grid {
        JsonGrid::Sheet(rows) => vec![RawTable::new(name, rows)],
        JsonGrid::Workbook(sheets) => sheets
            .into_iter()
            .map(|(sheet, rows)| RawTable::new(sheet, rows))
            .collect(),
    })
}

/// Read a JSON grid file.
pub fn load_json(path: &Path) -> Result<Vec<RawTable>> {
    let name = source_name(path);
    let content = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::ingestion(&name, format!("{}: {}", path.display(), e)))?;
    read_json_str(&name, &content)
}

/// Load any supported file, choosing the reader by extension.
pub fn load_path(path: &Path) -> Result<Vec<RawTable>> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
        Some(ext) if ext == "json" => load_json(path),
        Some(ext) if ext == "csv" || ext == "txt" => Ok(vec![load_csv(path)?]),
        other => Err(AnalysisError::ingestion(
            source_name(path),
            format!("unsupported file type: {}", other.unwrap_or_default()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_keeps_header_row_and_blanks() {
        let table = read_csv_str("claims", "Status,Amount\nRejected,150\n,\nApproved,\n").unwrap();
        assert_eq!(table.name, "claims");
        assert_eq!(
            table.rows,
            vec![
                vec![Value::from("Status"), Value::from("Amount")],
                vec![Value::from("Rejected"), Value::from("150")],
                vec![Value::Null, Value::Null],
                vec![Value::from("Approved"), Value::Null],
            ]
        );
    }

    #[test]
    fn test_csv_short_first_line_keeps_all_columns() {
        let table =
            read_csv_str("t", ",\nStatus,Amount,Reason\nRejected,150,Duplicate claim\n").unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![Value::Null, Value::Null, Value::Null],
                vec![Value::from("Status"), Value::from("Amount"), Value::from("Reason")],
                vec![
                    Value::from("Rejected"),
                    Value::from("150"),
                    Value::from("Duplicate claim")
                ],
            ]
        );

        let (schema, _) = crate::ingest::ingest(&table);
        assert_eq!(schema.headers, vec!["Status", "Amount", "Reason"]);
    }

    #[test]
    fn test_widest_record_ignores_quoted_commas() {
        assert_eq!(widest_record("a,b\n\"1,200\",x,y\n"), 3);
        assert_eq!(widest_record("\"multi\nline\",b\r\n"), 2);
        assert_eq!(widest_record(",\n"), 2);
        assert_eq!(widest_record(""), 0);
    }

    #[test]
    fn test_empty_csv_is_empty_table() {
        let table = read_csv_str("empty", "  \n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_json_sheet_and_workbook() {
        let tables = read_json_str("grid", r#"[["Status","Amount"],["Denied",12.5],[null,true]]"#)
            .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[1], vec![Value::from("Denied"), Value::from(12.5)]);
        assert_eq!(tables[0].rows[2], vec![Value::Null, Value::from(true)]);

        let tables =
            read_json_str("book", r#"{"q2": [["A"]], "q1": [["B"], ["1"]]}"#).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["q1", "q2"]);
    }

    #[test]
    fn test_malformed_json_is_ingestion_error() {
        let err = read_json_str("bad", "{not json").unwrap_err();
        assert!(err.is_ingestion());
        assert_eq!(err.error_code(), "INGESTION_FAILED");
    }

    #[test]
    fn test_missing_file_is_ingestion_error() {
        let err = load_path(Path::new("/nonexistent/claims.csv")).unwrap_err();
        assert!(err.is_ingestion());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_path(Path::new("claims.xlsx")).unwrap_err();
        assert!(err.to_string().contains("unsupported file type: xlsx"));
    }
}
