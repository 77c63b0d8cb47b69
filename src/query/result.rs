//! Result types for aggregate execution

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::spec::AggregateFunction;

/// A raw aggregate converted to its typed form: integer for COUNT,
/// floating point for everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Int(i64),
    Float(f64),
}

impl AggregateValue {
    /// Convert a driver value. Engines often return DECIMAL aggregates as
    /// text, so numeric strings are accepted alongside JSON numbers.
    pub fn from_raw(function: AggregateFunction, raw: &Value) -> QueryResult<Self> {
        let number = match raw {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| QueryError::unexpected_result(format!("'{}' is out of range", n)))?,
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                QueryError::unexpected_result(format!("'{}' is not numeric", s))
            })?,
            other => {
                return Err(QueryError::unexpected_result(format!(
                    "expected a number, got {}",
                    other
                )))
            }
        };

        if function.is_count() {
            let count = match raw.as_i64() {
                Some(i) => i,
                None => number.trunc() as i64,
            };
            Ok(AggregateValue::Int(count))
        } else {
            Ok(AggregateValue::Float(number))
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            AggregateValue::Int(i) => *i as f64,
            AggregateValue::Float(x) => *x,
        }
    }
}

impl fmt::Display for AggregateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateValue::Int(i) => write!(f, "{}", i),
            AggregateValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<AggregateValue> for Value {
    fn from(value: AggregateValue) -> Self {
        match value {
            AggregateValue::Int(i) => Value::from(i),
            AggregateValue::Float(x) => Value::from(x),
        }
    }
}

type FormatFn = dyn Fn(AggregateValue) -> Value + Send + Sync;

/// Named post-processing step applied to each aggregate.
///
/// The name takes part in the cache key, so two formatters must not share
/// a name unless they produce the same output.
#[derive(Clone)]
pub struct Formatter {
    name: String,
    func: Arc<FormatFn>,
}

impl Formatter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(AggregateValue) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: AggregateValue) -> Value {
        (self.func)(value)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter").field("name", &self.name).finish()
    }
}

/// Final value of an aggregate query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AggregateOutput {
    /// No matching rows (SQL NULL), distinct from zero
    Null,
    /// Ungrouped result, already formatted
    Scalar(Value),
    /// Group value → formatted aggregate; empty when no rows matched
    Grouped(BTreeMap<String, Value>),
}

impl AggregateOutput {
    pub fn is_null(&self) -> bool {
        matches!(self, AggregateOutput::Null)
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            AggregateOutput::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            AggregateOutput::Grouped(map) => Some(map),
            _ => None,
        }
    }
}

/// Shape one raw aggregate: convert, then format if a formatter is set.
/// SQL NULL stays null and is never formatted.
pub fn shape_value(
    function: AggregateFunction,
    raw: Option<&Value>,
    formatter: Option<&Formatter>,
) -> QueryResult<Value> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(Value::Null),
        Some(raw) => raw,
    };
    let value = AggregateValue::from_raw(function, raw)?;
    Ok(match formatter {
        Some(formatter) => formatter.apply(value),
        None => value.into(),
    })
}

/// Mapping key for rows whose group column is NULL
pub const NULL_GROUP_KEY: &str = "__null__";

/// Render a group column value as a mapping key. NULL gets its own key so
/// it never merges with an empty-string group.
pub fn group_key(value: &Value) -> String {
    match value {
        Value::Null => NULL_GROUP_KEY.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
