//! # Filter Values
//!
//! Ad-hoc column filters decoded once from loosely-typed JSON input into a
//! closed set of shapes. Every bind value carries its placeholder kind from
//! the moment it is parsed.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// Key suffix for set-membership filters
pub const IN_SUFFIX: &str = "__in";

/// Key suffix for set-exclusion filters
pub const NOT_IN_SUFFIX: &str = "__not_in";

/// Placeholder kind of a bind value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Int,
    Float,
    Text,
}

impl BindKind {
    /// Positional placeholder understood by the driver
    pub fn placeholder(&self) -> &'static str {
        match self {
            BindKind::Int => "%d",
            BindKind::Float => "%f",
            BindKind::Text => "%s",
        }
    }
}

/// A value substituted into a placeholder at execution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Decode a JSON scalar. Integers stay integers, other numbers become
    /// floats, strings and booleans become text. Null and containers are
    /// not scalars.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(BindValue::Int(i)),
                None => n.as_f64().map(BindValue::Float),
            },
            Value::String(s) => Some(BindValue::Text(s.clone())),
            Value::Bool(b) => Some(BindValue::Text(if *b { "1" } else { "0" }.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn kind(&self) -> BindKind {
        match self {
            BindValue::Int(_) => BindKind::Int,
            BindValue::Float(_) => BindKind::Float,
            BindValue::Text(_) => BindKind::Text,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        self.kind().placeholder()
    }

    /// Copy with text values reduced to plain text
    pub fn sanitized(&self) -> Self {
        match self {
            BindValue::Text(s) => BindValue::Text(sanitize_text(s)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Int(i) => write!(f, "{}", i),
            BindValue::Float(x) => write!(f, "{}", x),
            BindValue::Text(s) => write!(f, "{}", s),
        }
    }
}

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Strip markup tags and control characters, collapse whitespace, trim.
pub fn sanitize_text(input: &str) -> String {
    let tags = TAG_PATTERN
        .get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex"));
    let stripped = tags.replace_all(input, "");

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if c.is_control() {
            continue;
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Comparison operators accepted by `{value, compare}` filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "!=")]
    Neq,
}

impl CompareOp {
    /// Parse operator text; anything outside the fixed set is `None`
    pub fn parse(op: &str) -> Option<Self> {
        match op.trim() {
            "=" => Some(CompareOp::Eq),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            "!=" => Some(CompareOp::Neq),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Neq => "!=",
        }
    }
}

/// One ad-hoc column filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// `col = value`
    Scalar(BindValue),
    /// `col >= min`, `col <= max`, or both
    Range {
        min: Option<BindValue>,
        max: Option<BindValue>,
    },
    /// `col {op} value`
    Compare { value: BindValue, op: CompareOp },
    /// `col IN (...)`
    In(Vec<BindValue>),
    /// `col NOT IN (...)`
    NotIn(Vec<BindValue>),
}

impl FilterValue {
    pub fn eq(value: impl Into<BindValue>) -> Self {
        FilterValue::Scalar(value.into())
    }

    pub fn range(min: Option<BindValue>, max: Option<BindValue>) -> Self {
        FilterValue::Range { min, max }
    }

    pub fn compare(op: CompareOp, value: impl Into<BindValue>) -> Self {
        FilterValue::Compare {
            value: value.into(),
            op,
        }
    }

    pub fn in_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        FilterValue::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        FilterValue::NotIn(values.into_iter().map(Into::into).collect())
    }

    /// Request key this filter is spelled as for `column`
    pub fn request_key(&self, column: &str) -> String {
        match self {
            FilterValue::In(_) => format!("{}{}", column, IN_SUFFIX),
            FilterValue::NotIn(_) => format!("{}{}", column, NOT_IN_SUFFIX),
            _ => column.to_string(),
        }
    }

    /// Decode a request entry into `(column, filter)`.
    ///
    /// # Errors
    ///
    /// - `AGG_NOT_AN_ARRAY` when a `__in`/`__not_in` key has a non-array value
    /// - `AGG_INVALID_OPERATOR` for a `compare` outside the fixed set
    /// - `AGG_INVALID_FILTER_SHAPE` for null, nested containers, empty sets
    ///   and objects without `min`/`max` or `value`+`compare`
    pub fn parse(key: &str, raw: &Value) -> QueryResult<(String, FilterValue)> {
        if let Some(column) = key.strip_suffix(IN_SUFFIX) {
            let values = parse_set(key, raw)?;
            return Ok((column.to_string(), FilterValue::In(values)));
        }
        if let Some(column) = key.strip_suffix(NOT_IN_SUFFIX) {
            let values = parse_set(key, raw)?;
            return Ok((column.to_string(), FilterValue::NotIn(values)));
        }

        let filter = match raw {
            Value::Object(obj) => {
                let present = |name: &str| obj.get(name).filter(|v| !v.is_null());
                let min = present("min");
                let max = present("max");

                if min.is_some() || max.is_some() {
                    FilterValue::Range {
                        min: min.map(|v| parse_scalar(key, v)).transpose()?,
                        max: max.map(|v| parse_scalar(key, v)).transpose()?,
                    }
                } else if let (Some(value), Some(compare)) = (present("value"), present("compare")) {
                    let op_text = compare
                        .as_str()
                        .ok_or_else(|| QueryError::invalid_operator(key, &compare.to_string()))?;
                    let op = CompareOp::parse(op_text)
                        .ok_or_else(|| QueryError::invalid_operator(key, op_text))?;
                    FilterValue::Compare {
                        value: parse_scalar(key, value)?,
                        op,
                    }
                } else {
                    return Err(QueryError::invalid_filter_shape(
                        key,
                        "object needs 'min'/'max' or 'value' with 'compare'",
                    ));
                }
            }
            other => FilterValue::Scalar(parse_scalar(key, other)?),
        };

        Ok((key.to_string(), filter))
    }
}

fn parse_scalar(key: &str, raw: &Value) -> QueryResult<BindValue> {
    BindValue::from_json(raw).ok_or_else(|| {
        QueryError::invalid_filter_shape(key, format!("expected a scalar, got {}", json_type_name(raw)))
    })
}

fn parse_set(key: &str, raw: &Value) -> QueryResult<Vec<BindValue>> {
    let items = raw.as_array().ok_or_else(|| QueryError::not_an_array(key))?;
    if items.is_empty() {
        return Err(QueryError::invalid_filter_shape(key, "set must not be empty"));
    }
    items.iter().map(|item| parse_scalar(key, item)).collect()
}

/// JSON type name for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Int(i64::from(v))
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Float(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}
