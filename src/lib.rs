//! aggquery - Schema-validated aggregate queries over a single table
//!
//! Given a table, an aggregate function, optional date range, ad-hoc column
//! filters and an optional GROUP BY, validates the request against the
//! table's live schema, assembles a parameterized statement, runs it through
//! the host's database driver and optionally memoizes the result.
//!
//! ```ignore
//! use aggquery::{AggregateQuery, MemoryCache};
//! use serde_json::json;
//!
//! let raw = json!({"table": "orders", "column": "total", "status__not_in": ["refunded"]});
//! let query = AggregateQuery::new(raw.as_object().unwrap(), &driver, &cache)?;
//! let total = query.get_result()?;
//! ```

pub mod cache;
pub mod config;
pub mod driver;
pub mod observability;
pub mod query;
pub mod schema;

pub use cache::{CacheStore, MemoryCache};
pub use config::QueryConfig;
pub use driver::{ColumnDescription, DatabaseDriver, DriverError, Row};
pub use query::{
    AggregateFunction, AggregateOutput, AggregateQuery, FilterValue, Formatter, QueryError,
    QueryErrorCode, QueryResult, QuerySpec,
};
pub use schema::{Schema, SchemaInspector};
