//! Row normalization into canonical records
//!
//! Converts one raw source row (a JSON object, as decoded from a Parquet
//! shard) into one [`CanonicalRecord`] with the schema's declared types, or
//! signals that the row must be skipped.
//!
//! Coercion rules, reproduced exactly from the upstream dataset conventions:
//!
//! - Delimiter-separated categorical strings (`"Action-Drama-Comedy"`) are
//!   split into trimmed string arrays; integer-array fields additionally parse
//!   each element.
//! - Numeric fields presented as strings, floats, or integers are coerced to
//!   the declared numeric type; a null/NaN sentinel or coercion failure yields
//!   the default (`0` / `0.0`) rather than an error, unless the field is
//!   required.
//! - Date fields accept already-parsed timestamps or `YYYY-MM-DD` strings;
//!   parse failure yields null. All timestamps are normalized to UTC and
//!   zone-less timestamps are assumed to already be UTC.

use crate::schema::{FieldSpec, FieldType, Schema};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default separator for categorical list fields in the source data.
///
/// This is a convention of the upstream movie dataset, not a general format.
pub const DEFAULT_DELIMITER: char = '-';

/// One canonical field value in the schema's declared types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Number(f64),
    Date(DateTime<Utc>),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// A source row normalized into the agreed schema and types.
///
/// Constructed once per source row, immutable thereafter, consumed exactly
/// once by the batch loader. Fields are held in a sorted map so the record's
/// canonical serialization (and therefore its fingerprint) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    /// Schema fields in canonical (sorted) order
    pub fields: BTreeMap<String, FieldValue>,
    /// Precomputed named embedding vectors attached to the record, if any
    #[serde(skip)]
    pub vectors: HashMap<String, Vec<f32>>,
}

impl CanonicalRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Result of normalizing one raw row
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeOutcome {
    Record(CanonicalRecord),
    /// The row is unrecoverably missing a required field
    Skip { field: String },
}

/// Converts raw source rows to canonical records
///
/// Pure function of its inputs; holds no per-row state.
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Schema,
    delimiter: char,
}

impl Normalizer {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Override the categorical list separator
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Normalize one raw row into a canonical record, or skip it.
    ///
    /// Accepts both flat rows (one column per field) and pre-vectorized rows
    /// where the fields live under a `properties` object and named embedding
    /// vectors under a `vectors` object.
    pub fn normalize(&self, raw: &Value) -> NormalizeOutcome {
        let Value::Object(row) = raw else {
            return NormalizeOutcome::Skip {
                field: "<row>".to_string(),
            };
        };

        let props = match row.get("properties") {
            Some(Value::Object(inner)) => inner,
            _ => row,
        };

        let mut fields = BTreeMap::new();
        for spec in self.schema.fields() {
            let raw_value = props.get(spec.source_name()).unwrap_or(&Value::Null);

            match self.coerce(spec, raw_value) {
                Some(value) => {
                    fields.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    return NormalizeOutcome::Skip {
                        field: spec.name.clone(),
                    };
                }
                None => {
                    if !raw_value.is_null() {
                        debug!(field = %spec.name, "coercion defaulted");
                    }
                    fields.insert(spec.name.clone(), default_for(spec.field_type));
                }
            }
        }

        NormalizeOutcome::Record(CanonicalRecord {
            fields,
            vectors: extract_vectors(row),
        })
    }

    /// Coerce a raw value to the field's declared type.
    ///
    /// `None` means no usable value was present; the caller decides between
    /// skipping the row (required field) and defaulting (optional field).
    fn coerce(&self, spec: &FieldSpec, raw: &Value) -> Option<FieldValue> {
        match spec.field_type {
            FieldType::Text => coerce_text(raw).map(FieldValue::Text),
            FieldType::Int => coerce_int(raw).map(FieldValue::Int),
            FieldType::Number => coerce_number(raw).map(FieldValue::Number),
            FieldType::Date => coerce_date(raw).map(FieldValue::Date),
            FieldType::TextArray => {
                coerce_text_array(raw, self.delimiter).map(FieldValue::TextArray)
            }
            FieldType::IntArray => coerce_int_array(raw, self.delimiter).map(FieldValue::IntArray),
        }
    }
}

/// Default value for an optional field with no usable raw value
fn default_for(field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Int => FieldValue::Int(0),
        FieldType::Number => FieldValue::Number(0.0),
        _ => FieldValue::Null,
    }
}

fn coerce_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_date(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => parse_date_str(s.trim()),
        // Already-parsed timestamps surface as epoch milliseconds.
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    // Zone-less timestamps are assumed to already be UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn coerce_text_array(raw: &Value, delimiter: char) -> Option<Vec<String>> {
    match raw {
        Value::String(s) => Some(s.split(delimiter).map(|e| e.trim().to_string()).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.to_string()))
            .collect(),
        _ => None,
    }
}

fn coerce_int_array(raw: &Value, delimiter: char) -> Option<Vec<i64>> {
    match raw {
        // An element that fails to parse nulls the whole field.
        Value::String(s) => s
            .split(delimiter)
            .map(|e| e.trim().parse::<i64>().ok())
            .collect(),
        Value::Array(items) => items.iter().map(coerce_int).collect(),
        _ => None,
    }
}

/// Pull named embedding vectors out of a pre-vectorized row
fn extract_vectors(row: &serde_json::Map<String, Value>) -> HashMap<String, Vec<f32>> {
    let mut vectors = HashMap::new();
    if let Some(Value::Object(named)) = row.get("vectors") {
        for (name, value) in named {
            let Value::Array(items) = value else { continue };
            let parsed: Option<Vec<f32>> = items
                .iter()
                .map(|item| item.as_f64().map(|f| f as f32))
                .collect();
            if let Some(vector) = parsed {
                vectors.insert(name.clone(), vector);
            }
        }
    }
    vectors
}
