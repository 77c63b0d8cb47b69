//! Request validation against the live table schema
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. schema belongs to the requested table
//! 2. aggregate column (skipped for COUNT)
//! 3. date column
//! 4. date bounds
//! 5. group-by column
//!
//! Context typing is settled when the raw request is decoded. Ad-hoc
//! filter columns are checked by the condition compiler.

use crate::schema::{Schema, TypeClass};

use super::dates::check_date;
use super::errors::{QueryError, QueryResult};
use super::spec::QuerySpec;

/// Validate a spec against the schema of its table.
pub fn validate(spec: &QuerySpec, schema: &Schema) -> QueryResult<()> {
    if spec.table.is_empty() || spec.table != schema.table() {
        return Err(QueryError::invalid_table(&spec.table));
    }

    if !spec.function.is_count() {
        let column_type = schema
            .column_type(&spec.column)
            .ok_or_else(|| QueryError::unknown_column(&spec.column))?;
        if TypeClass::classify(column_type) != TypeClass::Numeric {
            return Err(QueryError::invalid_column_type(&spec.column, column_type));
        }
    }

    if !spec.date_column.is_empty() {
        match schema.class(&spec.date_column) {
            None => return Err(QueryError::invalid_date_column(&spec.date_column, "no such column")),
            Some(TypeClass::Date) => {}
            Some(class) => {
                return Err(QueryError::invalid_date_column(
                    &spec.date_column,
                    format!("expected a date/time column, found {}", class.name()),
                ))
            }
        }
    }

    check_date(&spec.date_start)?;
    check_date(&spec.date_end)?;

    if !spec.group_by.is_empty() {
        match schema.class(&spec.group_by) {
            None => return Err(QueryError::invalid_group_by(&spec.group_by, "no such column")),
            // TODO: confirm whether numeric/date grouping should be allowed before relaxing this
            Some(TypeClass::String) => {}
            Some(class) => {
                return Err(QueryError::invalid_group_by(
                    &spec.group_by,
                    format!("only string columns can be grouped, found {}", class.name()),
                ))
            }
        }
    }

    Ok(())
}
