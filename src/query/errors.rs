//! Aggregate query error types
//!
//! Error codes:
//! - AGG_INVALID_TABLE (REJECT)
//! - AGG_UNKNOWN_COLUMN (REJECT)
//! - AGG_INVALID_COLUMN_TYPE (REJECT)
//! - AGG_INVALID_DATE_COLUMN (REJECT)
//! - AGG_INVALID_DATE_FORMAT (REJECT)
//! - AGG_INVALID_GROUP_BY_COLUMN (REJECT)
//! - AGG_INVALID_CONTEXT (REJECT)
//! - AGG_INVALID_FUNCTION (REJECT)
//! - AGG_INVALID_OPERATOR (REJECT)
//! - AGG_INVALID_FILTER_SHAPE (REJECT)
//! - AGG_NOT_AN_ARRAY (REJECT)
//! - AGG_INVALID_OPTION (REJECT)
//! - AGG_DATABASE_QUERY_ERROR (ERROR)
//! - AGG_SCHEMA_LOAD_FAILURE (ERROR)

use std::fmt;

use crate::driver::DriverError;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller supplied an invalid request
    Reject,
    /// Database or catalog failed underneath a valid request
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Query error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Table missing or not named
    InvalidTable,
    /// Column not present in the table schema
    UnknownColumn,
    /// Non-numeric column used with SUM/AVG/MIN/MAX
    InvalidColumnType,
    /// Date column missing or not date/time typed
    InvalidDateColumn,
    /// Date bound is not a recognizable date
    InvalidDateFormat,
    /// Group-by column missing or not string typed
    InvalidGroupByColumn,
    /// Context tag is not a string
    InvalidContext,
    /// Aggregate function outside SUM/AVG/MIN/MAX/COUNT
    InvalidFunction,
    /// Comparison operator outside = > >= < <= !=
    InvalidOperator,
    /// Filter value has no recognized shape
    InvalidFilterShape,
    /// Set-membership filter value is not an array
    NotAnArray,
    /// Fixed request option has the wrong type
    InvalidOption,
    /// Database reported an error while executing
    DatabaseQueryError,
    /// Catalog introspection returned an unusable schema
    SchemaLoadFailure,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::InvalidTable => "AGG_INVALID_TABLE",
            QueryErrorCode::UnknownColumn => "AGG_UNKNOWN_COLUMN",
            QueryErrorCode::InvalidColumnType => "AGG_INVALID_COLUMN_TYPE",
            QueryErrorCode::InvalidDateColumn => "AGG_INVALID_DATE_COLUMN",
            QueryErrorCode::InvalidDateFormat => "AGG_INVALID_DATE_FORMAT",
            QueryErrorCode::InvalidGroupByColumn => "AGG_INVALID_GROUP_BY_COLUMN",
            QueryErrorCode::InvalidContext => "AGG_INVALID_CONTEXT",
            QueryErrorCode::InvalidFunction => "AGG_INVALID_FUNCTION",
            QueryErrorCode::InvalidOperator => "AGG_INVALID_OPERATOR",
            QueryErrorCode::InvalidFilterShape => "AGG_INVALID_FILTER_SHAPE",
            QueryErrorCode::NotAnArray => "AGG_NOT_AN_ARRAY",
            QueryErrorCode::InvalidOption => "AGG_INVALID_OPTION",
            QueryErrorCode::DatabaseQueryError => "AGG_DATABASE_QUERY_ERROR",
            QueryErrorCode::SchemaLoadFailure => "AGG_SCHEMA_LOAD_FAILURE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            QueryErrorCode::DatabaseQueryError | QueryErrorCode::SchemaLoadFailure => {
                Severity::Error
            }
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error type with full context
#[derive(Debug)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
    /// Offending column or filter key, if any
    column: Option<String>,
    /// Underlying driver failure, if any
    source: Option<DriverError>,
}

impl QueryError {
    fn new(code: QueryErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            column: None,
            source: None,
        }
    }

    fn for_column(code: QueryErrorCode, column: &str, message: String) -> Self {
        Self {
            code,
            message,
            column: Some(column.to_string()),
            source: None,
        }
    }

    /// Create an invalid table error
    pub fn invalid_table(table: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidTable,
            format!("Table '{}' does not exist", table),
        )
    }

    /// Create an unknown column error
    pub fn unknown_column(column: &str) -> Self {
        Self::for_column(
            QueryErrorCode::UnknownColumn,
            column,
            format!("Column '{}' does not exist", column),
        )
    }

    /// Create an invalid column type error
    pub fn invalid_column_type(column: &str, column_type: &str) -> Self {
        Self::for_column(
            QueryErrorCode::InvalidColumnType,
            column,
            format!(
                "Column '{}' has non-numeric type '{}' and cannot be aggregated",
                column, column_type
            ),
        )
    }

    /// Create an invalid date column error
    pub fn invalid_date_column(column: &str, reason: impl Into<String>) -> Self {
        Self::for_column(
            QueryErrorCode::InvalidDateColumn,
            column,
            format!("Date column '{}': {}", column, reason.into()),
        )
    }

    /// Create an invalid date format error
    pub fn invalid_date_format(value: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidDateFormat,
            format!("'{}' is not a valid date", value),
        )
    }

    /// Create an invalid group-by column error
    pub fn invalid_group_by(column: &str, reason: impl Into<String>) -> Self {
        Self::for_column(
            QueryErrorCode::InvalidGroupByColumn,
            column,
            format!("Group-by column '{}': {}", column, reason.into()),
        )
    }

    /// Create an invalid context error
    pub fn invalid_context(found: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidContext,
            format!("Context must be a string, got {}", found),
        )
    }

    /// Create an invalid function error
    pub fn invalid_function(function: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidFunction,
            format!(
                "Invalid aggregate function '{}', expected one of SUM, AVG, MIN, MAX, COUNT",
                function
            ),
        )
    }

    /// Create an invalid operator error
    pub fn invalid_operator(key: &str, operator: &str) -> Self {
        Self::for_column(
            QueryErrorCode::InvalidOperator,
            key,
            format!(
                "Invalid comparison operator '{}' for '{}', expected one of = > >= < <= !=",
                operator, key
            ),
        )
    }

    /// Create an invalid filter shape error
    pub fn invalid_filter_shape(key: &str, reason: impl Into<String>) -> Self {
        Self::for_column(
            QueryErrorCode::InvalidFilterShape,
            key,
            format!("Filter '{}': {}", key, reason.into()),
        )
    }

    /// Create a not-an-array error
    pub fn not_an_array(key: &str) -> Self {
        Self::for_column(
            QueryErrorCode::NotAnArray,
            key,
            format!("Filter '{}' requires an array value", key),
        )
    }

    /// Create an invalid option error
    pub fn invalid_option(option: &str, expected: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidOption,
            format!("Option '{}' must be {}", option, expected),
        )
    }

    /// Create a database query error
    pub fn database(source: DriverError) -> Self {
        Self {
            code: QueryErrorCode::DatabaseQueryError,
            message: format!("Database query failed: {}", source),
            column: None,
            source: Some(source),
        }
    }

    /// Create a database query error for an unusable result value
    pub fn unexpected_result(reason: impl Into<String>) -> Self {
        Self::new(
            QueryErrorCode::DatabaseQueryError,
            format!("Database returned an unusable result: {}", reason.into()),
        )
    }

    /// Create a schema load failure
    pub fn schema_load(table: &str, reason: impl Into<String>) -> Self {
        Self::new(
            QueryErrorCode::SchemaLoadFailure,
            format!("Failed to load schema for '{}': {}", table, reason.into()),
        )
    }

    /// Create a schema load failure caused by the driver
    pub fn schema_load_driver(table: &str, source: DriverError) -> Self {
        Self {
            code: QueryErrorCode::SchemaLoadFailure,
            message: format!("Failed to load schema for '{}': {}", table, source),
            column: None,
            source: Some(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending column or filter key, if any
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
