//! # Query Specification
//!
//! The normalized aggregate request: a small fixed set of options plus an
//! ordered list of ad-hoc column filters. Raw JSON input is decoded here,
//! once; everything downstream works on typed values.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::config::QueryConfig;

use super::errors::{QueryError, QueryResult};
use super::filter::{json_type_name, FilterValue};
use super::result::Formatter;

/// Request keys that configure the query rather than filter a column
pub const FIXED_FIELDS: [&str; 12] = [
    "table",
    "column",
    "function",
    "date_column",
    "date_start",
    "date_end",
    "group_by",
    "formatter",
    "caching",
    "cache_group",
    "debug",
    "context",
];

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    /// Parse a function name, case-insensitively
    pub fn parse(name: &str) -> QueryResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SUM" => Ok(AggregateFunction::Sum),
            "AVG" => Ok(AggregateFunction::Avg),
            "MIN" => Ok(AggregateFunction::Min),
            "MAX" => Ok(AggregateFunction::Max),
            "COUNT" => Ok(AggregateFunction::Count),
            _ => Err(QueryError::invalid_function(name)),
        }
    }

    /// SQL keyword
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Count => "COUNT",
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, AggregateFunction::Count)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Normalized aggregate request.
///
/// Empty strings mean "unset" for the optional text options.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub table: String,
    /// Ignored for COUNT
    pub column: String,
    pub function: AggregateFunction,
    pub date_column: String,
    /// Inclusive lower bound
    pub date_start: String,
    /// Inclusive upper bound
    pub date_end: String,
    pub group_by: String,
    pub formatter: Option<Formatter>,
    pub caching: bool,
    pub cache_group: String,
    pub debug: bool,
    /// Opaque tag handed to the extension hook
    pub context: String,
    /// Ad-hoc filters as `(column, filter)`, in request order
    pub filters: Vec<(String, FilterValue)>,
}

impl QuerySpec {
    /// Start a spec with default options
    pub fn new(table: impl Into<String>, function: AggregateFunction) -> Self {
        Self::with_config(table, function, &QueryConfig::default())
    }

    /// Start a spec with options taken from `config`
    pub fn with_config(
        table: impl Into<String>,
        function: AggregateFunction,
        config: &QueryConfig,
    ) -> Self {
        Self {
            table: table.into(),
            column: String::new(),
            function,
            date_column: String::new(),
            date_start: String::new(),
            date_end: String::new(),
            group_by: String::new(),
            formatter: None,
            caching: config.caching_enabled,
            cache_group: config.cache_group.clone(),
            debug: config.debug,
            context: config.context.clone(),
            filters: Vec::new(),
        }
    }

    /// Decode a raw request object.
    ///
    /// Fixed keys are read with `config` supplying defaults; every other key
    /// becomes an ad-hoc filter in map iteration order.
    ///
    /// # Errors
    ///
    /// Type errors on fixed keys (`AGG_INVALID_TABLE`, `AGG_INVALID_FUNCTION`,
    /// `AGG_INVALID_CONTEXT`, ...) and filter-shape errors from
    /// [`FilterValue::parse`].
    pub fn from_raw(raw: &Map<String, Value>, config: &QueryConfig) -> QueryResult<Self> {
        let function = match raw.get("function") {
            None | Some(Value::Null) => AggregateFunction::Sum,
            Some(Value::String(name)) => AggregateFunction::parse(name)?,
            Some(other) => return Err(QueryError::invalid_function(&other.to_string())),
        };

        let table = text_option(raw, "table").map_err(|_| QueryError::invalid_table("<non-string>"))?;

        let column = match text_option(raw, "column") {
            Ok(column) => column,
            Err(_) if function.is_count() => String::new(),
            Err(found) => return Err(QueryError::unknown_column(&format!("<{}>", found))),
        };

        let date_column = text_option(raw, "date_column")
            .map_err(|found| QueryError::invalid_date_column("", format!("expected a string, got {}", found)))?;
        let date_start = text_option(raw, "date_start")
            .map_err(|found| QueryError::invalid_date_format(&format!("<{}>", found)))?;
        let date_end = text_option(raw, "date_end")
            .map_err(|found| QueryError::invalid_date_format(&format!("<{}>", found)))?;
        let group_by = text_option(raw, "group_by")
            .map_err(|found| QueryError::invalid_group_by("", format!("expected a string, got {}", found)))?;

        let context = match raw.get("context") {
            None | Some(Value::Null) => config.context.clone(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(QueryError::invalid_context(json_type_name(other))),
        };

        let caching = flag_option(raw, "caching")?.unwrap_or(config.caching_enabled);
        let debug = flag_option(raw, "debug")?.unwrap_or(config.debug);
        let cache_group = match raw.get("cache_group") {
            None | Some(Value::Null) => config.cache_group.clone(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => return Err(QueryError::invalid_option("cache_group", "a non-empty string")),
        };

        let mut filters = Vec::new();
        for (key, value) in raw {
            if FIXED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            filters.push(FilterValue::parse(key, value)?);
        }

        Ok(Self {
            table,
            column,
            function,
            date_column,
            date_start,
            date_end,
            group_by,
            formatter: None,
            caching,
            cache_group,
            debug,
            context,
            filters,
        })
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn date_range(
        mut self,
        date_column: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.date_column = date_column.into();
        self.date_start = start.into();
        self.date_end = end.into();
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = column.into();
        self
    }

    /// Append an ad-hoc filter
    pub fn filter(mut self, column: impl Into<String>, filter: FilterValue) -> Self {
        self.filters.push((column.into(), filter));
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    pub fn cache_group(mut self, group: impl Into<String>) -> Self {
        self.cache_group = group.into();
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Canonical JSON form of the whole request, defaults included.
    ///
    /// Filters become `[request_key, filter]` pairs sorted by key, then by
    /// filter text. Every filter is kept, repeats on one column included,
    /// and two requests with the same filters in a different order
    /// normalize identically.
    pub fn normalized(&self) -> Value {
        let mut pairs: Vec<(String, String, Value)> = self
            .filters
            .iter()
            .map(|(column, filter)| {
                let value = serde_json::to_value(filter).unwrap_or(Value::Null);
                (filter.request_key(column), value.to_string(), value)
            })
            .collect();
        pairs.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        let filters: Vec<Value> = pairs
            .into_iter()
            .map(|(key, _, value)| json!([key, value]))
            .collect();

        json!({
            "table": self.table,
            "column": self.column,
            "function": self.function.as_sql(),
            "date_column": self.date_column,
            "date_start": self.date_start,
            "date_end": self.date_end,
            "group_by": self.group_by,
            "formatter": self.formatter.as_ref().map(Formatter::name),
            "caching": self.caching,
            "cache_group": self.cache_group,
            "debug": self.debug,
            "context": self.context,
            "filters": filters,
        })
    }
}

/// Read an optional text option. Missing or null is empty; numbers are
/// taken in their display form. Any other JSON type is reported by name.
fn text_option(raw: &Map<String, Value>, key: &str) -> Result<String, &'static str> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(json_type_name(other)),
    }
}

fn flag_option(raw: &Map<String, Value>, key: &str) -> QueryResult<Option<bool>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(Some(false)),
        Some(Value::Number(n)) if n.as_i64() == Some(1) => Ok(Some(true)),
        Some(_) => Err(QueryError::invalid_option(key, "a boolean")),
    }
}
