//! Schema inspector
//!
//! Loads the live column/type mapping for one table through the driver.
//! A table that does not exist is an error, never an empty schema, and a
//! catalog entry missing its name or type fails the whole load.

use crate::driver::DatabaseDriver;
use crate::query::{QueryError, QueryResult};

use super::types::Schema;

/// Reads table schemas from the database catalog.
pub struct SchemaInspector<'a, D: DatabaseDriver> {
    driver: &'a D,
}

impl<'a, D: DatabaseDriver> SchemaInspector<'a, D> {
    /// Creates an inspector backed by the given driver.
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Existence probe.
    ///
    /// # Errors
    ///
    /// `AGG_INVALID_TABLE` for an empty name or a table the database does
    /// not know; `AGG_SCHEMA_LOAD_FAILURE` if the probe itself fails.
    pub fn ensure_table(&self, table: &str) -> QueryResult<()> {
        if table.trim().is_empty() {
            return Err(QueryError::invalid_table(table));
        }
        let exists = self
            .driver
            .table_exists(table)
            .map_err(|e| QueryError::schema_load_driver(table, e))?;
        if !exists {
            return Err(QueryError::invalid_table(table));
        }
        Ok(())
    }

    /// Loads the schema for `table`.
    ///
    /// # Errors
    ///
    /// - `AGG_INVALID_TABLE` if the table does not exist
    /// - `AGG_SCHEMA_LOAD_FAILURE` if describing fails, returns no columns,
    ///   or returns an entry without a name or type
    pub fn load(&self, table: &str) -> QueryResult<Schema> {
        self.ensure_table(table)?;

        let described = self
            .driver
            .describe_columns(table)
            .map_err(|e| QueryError::schema_load_driver(table, e))?;

        if described.is_empty() {
            return Err(QueryError::schema_load(table, "catalog returned no columns"));
        }

        let mut columns = Vec::with_capacity(described.len());
        for (position, column) in described.into_iter().enumerate() {
            let name = column.name.filter(|n| !n.is_empty()).ok_or_else(|| {
                QueryError::schema_load(table, format!("column #{} has no name", position))
            })?;
            let column_type = column.column_type.filter(|t| !t.is_empty()).ok_or_else(|| {
                QueryError::schema_load(table, format!("column '{}' has no type", name))
            })?;
            columns.push((name, column_type));
        }

        Ok(Schema::new(table, columns))
    }
}
