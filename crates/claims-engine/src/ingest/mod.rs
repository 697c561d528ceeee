//! Table ingestion and schema inference.
//!
//! This module turns a raw cell grid into header-keyed records:
//! - Leading blank rows are skipped and the first non-blank row becomes the schema
//! - Later blank rows are dropped
//! - Each remaining row is zipped against the headers
//!
//! Column types are then inferred from a sample of each column's filled values.

mod type_inference;

pub use type_inference::{InferenceRules, infer_column_types, infer_type, matches_type};

use crate::types::{RawTable, Record, Schema, Value};
use tracing::debug;

fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|cell| !cell.is_filled())
}

/// Split a raw grid into a schema and its records.
///
/// Missing trailing cells become `Null`; cells beyond the last header are
/// ignored. A repeated header label keeps its first position and takes the
/// later cell's value. Pure and deterministic.
pub fn ingest(raw: &RawTable) -> (Schema, Vec<Record>) {
    let mut rows = raw.rows.iter().skip_while(|row| is_blank_row(row));

    let Some(header_row) = rows.next() else {
        debug!("Sheet '{}' has no non-blank rows", raw.name);
        return (Schema::default(), Vec::new());
    };

    let schema = Schema::new(
        header_row
            .iter()
            .map(|cell| cell.to_text().trim().to_string())
            .collect(),
    );

    let records: Vec<Record> = rows
        .filter(|row| !is_blank_row(row))
        .map(|row| {
            let mut record = Record::new();
            for (idx, header) in schema.headers.iter().enumerate() {
                let value = row.get(idx).cloned().unwrap_or(Value::Null);
                record.insert(header.clone(), value);
            }
            record
        })
        .collect();

    debug!(
        "Ingested sheet '{}': {} columns, {} records",
        raw.name,
        schema.len(),
        records.len()
    );

    (schema, records)
}
