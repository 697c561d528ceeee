//! Sampling-based column type inference.

use crate::config::EngineConfig;
use crate::types::{InferredType, Record, Schema, Value};
use crate::utils::{is_boolean_token, parse_date, parse_number};

/// Thresholds and sample size used by inference, borrowed from the config.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRules {
    pub sample_size: usize,
    pub number_threshold: f64,
    pub date_threshold: f64,
    pub boolean_threshold: f64,
}

impl Default for InferenceRules {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for InferenceRules {
    fn from(config: &EngineConfig) -> Self {
        Self {
            sample_size: config.type_sample_size,
            number_threshold: config.number_threshold,
            date_threshold: config.date_threshold,
            boolean_threshold: config.boolean_threshold,
        }
    }
}

/// Whether a value reads as the given type.
pub fn matches_type(value: &Value, inferred: InferredType) -> bool {
    match inferred {
        InferredType::Number => is_numeric_value(value),
        InferredType::Date => is_date_value(value),
        InferredType::Boolean => is_boolean_value(value),
        InferredType::Text => value.is_filled(),
    }
}

fn is_numeric_value(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite(),
        Value::Text(s) => parse_number(s).is_some(),
        _ => false,
    }
}

fn is_date_value(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(s) => parse_date(s).is_some(),
        _ => false,
    }
}

fn is_boolean_value(value: &Value) -> bool {
    match value {
        Value::Boolean(_) => true,
        Value::Number(n) => *n == 0.0 || *n == 1.0,
        Value::Text(s) => is_boolean_token(s),
        _ => false,
    }
}

/// Infer one column's type from its values in record order.
///
/// Only filled values are sampled, up to `rules.sample_size`. Checks run in
/// the order number, date, boolean; each requires strictly more than its
/// threshold. An empty sample is text.
pub fn infer_type<'a, I>(values: I, rules: &InferenceRules) -> InferredType
where
    I: IntoIterator<Item = &'a Value>,
{
    let sample: Vec<&Value> = values
        .into_iter()
        .filter(|v| v.is_filled())
        .take(rules.sample_size)
        .collect();

    if sample.is_empty() {
        return InferredType::Text;
    }

    let share = |pred: fn(&Value) -> bool| {
        sample.iter().filter(|v| pred(v)).count() as f64 / sample.len() as f64
    };

    if share(is_numeric_value) > rules.number_threshold {
        InferredType::Number
    } else if share(is_date_value) > rules.date_threshold {
        InferredType::Date
    } else if share(is_boolean_value) > rules.boolean_threshold {
        InferredType::Boolean
    } else {
        InferredType::Text
    }
}

/// Infer every column of a table, one entry per header.
pub fn infer_column_types(
    schema: &Schema,
    records: &[Record],
    rules: &InferenceRules,
) -> Vec<InferredType> {
    schema
        .iter()
        .map(|header| infer_type(records.iter().filter_map(|r| r.get(header)), rules))
        .collect()
}
