use crate::utils::{parse_date, parse_number};
use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Cell Values
// ============================================================================

/// A single spreadsheet cell as handed over by the upstream parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// A cell is filled unless it is null or the empty string.
    ///
    /// Whitespace-only text counts as filled.
    pub fn is_filled(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Finite numeric reading of the cell, if any.
    ///
    /// Text is parsed strictly (surrounding whitespace tolerated).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Calendar date reading of the cell, if any.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Text rendering of the cell. Null renders as an empty string.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Raw and Ingested Tables
// ============================================================================

/// One sheet exactly as the spreadsheet parser produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Opaque label (sheet or file name); never used as control input.
    pub name: String,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordered header labels taken from the first non-blank row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub headers: Vec<String>,
}

impl Schema {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }
}

/// One data row as an ordered header → value mapping.
///
/// Keys are unique and keep the order in which they were first inserted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value.into());
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header labels to cell values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    record.insert(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Column type assigned from a sample of filled values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Number,
    Date,
    Boolean,
    Text,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Number => "number",
            InferredType::Date => "date",
            InferredType::Boolean => "boolean",
            InferredType::Text => "text",
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Quality and Processed Tables
// ============================================================================

/// Quality dimensions for one table, each a percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f64,
    pub validity: f64,
    pub consistency: f64,
    /// Unweighted mean of the other three dimensions.
    pub composite_score: f64,
}

impl QualityMetrics {
    pub fn new(completeness: f64, validity: f64, consistency: f64) -> Self {
        Self {
            completeness,
            validity,
            consistency,
            composite_score: (completeness + validity + consistency) / 3.0,
        }
    }
}

/// A sheet after ingestion, type inference and quality scoring.
///
/// This is the unit persisted by external collaborators and handed back
/// to the analyzers on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTable {
    pub name: String,
    pub headers: Vec<String>,
    pub record_count: usize,
    pub column_count: usize,
    /// One entry per header, same order.
    pub column_types: Vec<InferredType>,
    pub records: Vec<Record>,
    pub quality: QualityMetrics,
}

impl ProcessedTable {
    pub fn schema(&self) -> Schema {
        Schema::new(self.headers.clone())
    }

    /// Inferred type of the first column carrying this exact label.
    pub fn column_type(&self, header: &str) -> Option<InferredType> {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|idx| self.column_types.get(idx).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Insights
// ============================================================================

/// Analysis family an insight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Rejection,
    Trend,
    Pattern,
    Quality,
    Comparison,
}

/// Impact level of an insight or a rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// A deterministic, rule-derived finding attached to an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub actionable: bool,
}

impl Insight {
    pub fn new(
        category: InsightCategory,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.into(),
            description: description.into(),
            confidence: 1.0,
            actionable: false,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn actionable(mut self) -> Self {
        self.actionable = true;
        self
    }
}

// ============================================================================
// Pattern Buckets
// ============================================================================

/// One label/count pair of a [`PatternBucket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub label: String,
    pub count: usize,
}

/// Category → count tally.
///
/// Labels are stored in first-seen order; [`PatternBucket::sorted`] reports them
/// descending by count with ties kept in first-seen order. Serializes as a map
/// in that sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternBucket {
    entries: Vec<BucketEntry>,
    index: HashMap<String, usize>,
}

impl PatternBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, label: impl Into<String>) {
        self.add(label, 1);
    }

    pub fn add(&mut self, label: impl Into<String>, count: usize) {
        let label = label.into();
        match self.index.get(&label) {
            Some(&idx) => self.entries[idx].count += count,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push(BucketEntry { label, count });
            }
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.index
            .get(label)
            .map(|&idx| self.entries[idx].count)
            .unwrap_or(0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label) > 0
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[BucketEntry] {
        &self.entries
    }

    /// Entries sorted descending by count; ties keep first-seen order.
    pub fn sorted(&self) -> Vec<BucketEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }

    /// Highest-count entry (first-seen wins ties).
    pub fn top(&self) -> Option<&BucketEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&BucketEntry>, entry| match best {
                Some(b) if b.count >= entry.count => Some(b),
                _ => Some(entry),
            })
    }

    /// Add every count of `other` into this bucket.
    pub fn merge(&mut self, other: &PatternBucket) {
        for entry in &other.entries {
            self.add(entry.label.clone(), entry.count);
        }
    }
}

impl Serialize for PatternBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted = self.sorted();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for entry in &sorted {
            map.serialize_entry(&entry.label, &entry.count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_is_filled() {
        assert!(!Value::Null.is_filled());
        assert!(!Value::from("").is_filled());
        assert!(Value::from("   ").is_filled());
        assert!(Value::from("x").is_filled());
        assert!(Value::from(0.0).is_filled());
        assert!(Value::from(false).is_filled());
    }

    #[test]
    fn test_value_display_integral_number() {
        assert_eq!(Value::from(150.0).to_text(), "150");
        assert_eq!(Value::from(250.5).to_text(), "250.5");
        assert_eq!(Value::Null.to_text(), "");
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::from(f64::NAN).as_number(), None);
        assert_eq!(Value::from(true).as_number(), None);
    }

    #[test]
    fn test_record_duplicate_key_keeps_first_position() {
        let mut record = Record::new();
        record.insert("a", Value::from(1.0));
        record.insert("b", Value::from(2.0));
        record.insert("a", Value::from(3.0));

        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::from(3.0)));
    }

    #[test]
    fn test_record_serializes_in_insertion_order() {
        let record: Record = vec![("Zeta", Value::from("z")), ("Alpha", Value::from(1.0))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Zeta":"z","Alpha":1.0}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_pattern_bucket_sorted_ties_keep_first_seen() {
        let mut bucket = PatternBucket::new();
        bucket.increment("b");
        bucket.increment("a");
        bucket.increment("c");
        bucket.increment("c");

        let labels: Vec<_> = bucket.sorted().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["c", "b", "a"]);
        assert_eq!(bucket.top().map(|e| e.label.as_str()), Some("c"));
        assert_eq!(bucket.total(), 4);
    }

    #[test]
    fn test_pattern_bucket_serializes_sorted() {
        let mut bucket = PatternBucket::new();
        bucket.increment("low");
        bucket.add("high", 3);
        let json = serde_json::to_string(&bucket).unwrap();
        assert_eq!(json, r#"{"high":3,"low":1}"#);
    }

    #[test]
    fn test_insight_confidence_is_clamped() {
        let insight = Insight::new(InsightCategory::Quality, Severity::Low, "t", "d")
            .with_confidence(1.7);
        assert_eq!(insight.confidence, 1.0);
    }

    #[test]
    fn test_quality_metrics_composite() {
        let metrics = QualityMetrics::new(75.0, 100.0, 100.0);
        assert!((metrics.composite_score - 91.666_666).abs() < 1e-3);
    }
}
