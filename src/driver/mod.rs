//! Database driver seam
//!
//! The aggregate engine never talks to a database directly. Connection
//! handling, statement preparation and table-prefix resolution belong to
//! the host's driver, reached only through [`DatabaseDriver`].
//!
//! Statements use positional placeholders: `%d` for integers, `%f` for
//! floats, `%s` for text. Bind values arrive in placeholder order.

mod errors;

pub use errors::{DriverError, DriverResult};

use serde_json::Value;

use crate::query::BindValue;

/// One column as reported by catalog introspection.
///
/// Either half may be missing when the catalog misbehaves; the schema
/// inspector refuses such entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column name
    pub name: Option<String>,
    /// Raw SQL type text, e.g. `varchar(255)` or `decimal(10,2)`
    pub column_type: Option<String>,
}

impl ColumnDescription {
    /// Create a fully populated description
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            column_type: Some(column_type.into()),
        }
    }
}

/// A result row, columns in SELECT order
pub type Row = Vec<Value>;

/// Narrow interface onto the host database.
///
/// Implementations are shared across requests; every method takes `&self`.
pub trait DatabaseDriver {
    /// Whether the table exists in the current database
    fn table_exists(&self, table: &str) -> DriverResult<bool>;

    /// Describe the table's columns
    fn describe_columns(&self, table: &str) -> DriverResult<Vec<ColumnDescription>>;

    /// Run a statement expected to yield one value. `None` is SQL NULL.
    fn query_scalar(&self, sql: &str, binds: &[BindValue]) -> DriverResult<Option<Value>>;

    /// Run a statement expected to yield a row set
    fn query_rows(&self, sql: &str, binds: &[BindValue]) -> DriverResult<Vec<Row>>;

    /// Fully qualified table name, with any installation prefix applied
    fn prefixed_name(&self, table: &str) -> String;

    /// Ask the driver to surface verbose errors. No-op by default.
    fn show_errors(&self, _enabled: bool) {}
}
