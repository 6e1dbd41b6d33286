//! Mutation result set flowing between the engine, the store and the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Mutant totals and the files that were mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutantSummary {
    /// Total mutants generated.
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    /// Mutated source files, in report order.
    #[serde(default, deserialize_with = "lenient_names")]
    pub mutated: Vec<String>,
}

/// One mutation-testing result set.
///
/// Only `score` is ever validated. Counts are an informational tally and
/// may disagree with each other. Every other field decodes leniently: a
/// null, negative or fractional count reads as 0, a non-list reads as an
/// empty list, and an unparseable timestamp reads as the Unix epoch. Fields
/// the engine emits beyond this shape are kept in `extra` and written back
/// unchanged on persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResultSet {
    /// Mutation kill percentage. Missing or non-numeric input decodes to NaN.
    #[serde(default = "missing_score", deserialize_with = "lenient_score")]
    pub score: f64,
    /// Killed mutants.
    #[serde(default, deserialize_with = "lenient_count")]
    pub killed: u64,
    /// Survived mutants.
    #[serde(default, deserialize_with = "lenient_count")]
    pub survived: u64,
    /// Timed-out mutants.
    #[serde(default, deserialize_with = "lenient_count")]
    pub timeout: u64,
    /// Mutants not covered by any test.
    #[serde(default, deserialize_with = "lenient_count")]
    pub no_coverage: u64,
    /// Mutant totals.
    #[serde(default, deserialize_with = "lenient_summary")]
    pub mutants: MutantSummary,
    /// Test files exercised.
    #[serde(default, deserialize_with = "lenient_names")]
    pub test_files: Vec<String>,
    /// Creation instant.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Unrecognised payload fields, carried through opaquely.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn missing_score() -> f64 {
    f64::NAN
}

fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(f64::NAN))
}

fn count_from(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0)
}

fn names_from(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from(&Value::deserialize(deserializer)?))
}

fn lenient_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(names_from(&Value::deserialize(deserializer)?))
}

fn lenient_summary<'de, D>(deserializer: D) -> Result<MutantSummary, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(MutantSummary {
        total: value.get("total").map_or(0, count_from),
        mutated: value.get("mutated").map_or_else(Vec::new, names_from),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl MutationResultSet {
    /// Zero-valued result set used when no baseline is available.
    pub fn zeroed(timestamp: DateTime<Utc>) -> Self {
        Self {
            score: 0.0,
            killed: 0,
            survived: 0,
            timeout: 0,
            no_coverage: 0,
            mutants: MutantSummary::default(),
            test_files: Vec::new(),
            timestamp,
            extra: Map::new(),
        }
    }

    /// Decode an untrusted engine payload and stamp it with `timestamp`.
    ///
    /// Any `timestamp` the engine emitted is discarded before decoding.
    pub fn from_engine_payload(
        payload: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let payload = match payload {
            Value::Object(mut object) => {
                object.remove("timestamp");
                Value::Object(object)
            }
            other => other,
        };
        let mut result: Self = serde_json::from_value(payload)?;
        result.timestamp = timestamp;
        Ok(result)
    }
}
