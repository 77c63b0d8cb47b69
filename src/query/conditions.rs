//! Condition compiler
//!
//! Turns ad-hoc column filters into WHERE fragments. Fragment order is the
//! filter order; SQL AND makes that order irrelevant to the result.

use crate::schema::Schema;

use super::errors::{QueryError, QueryResult};
use super::filter::{BindValue, FilterValue};
use super::predicate::Predicate;

/// Compile every filter into a predicate.
///
/// # Errors
///
/// `AGG_UNKNOWN_COLUMN` for any filter on a column the schema does not
/// have; the COUNT column bypass does not apply to filters.
pub fn compile_conditions(
    filters: &[(String, FilterValue)],
    schema: &Schema,
) -> QueryResult<Vec<Predicate>> {
    filters
        .iter()
        .map(|(column, filter)| compile_filter(column, filter, schema))
        .collect()
}

fn compile_filter(column: &str, filter: &FilterValue, schema: &Schema) -> QueryResult<Predicate> {
    if !schema.has_column(column) {
        return Err(QueryError::unknown_column(column));
    }

    let predicate = match filter {
        FilterValue::In(values) => membership(column, "IN", values),
        FilterValue::NotIn(values) => membership(column, "NOT IN", values),
        FilterValue::Range { min, max } => match (min, max) {
            (Some(min), Some(max)) => Predicate::new(
                format!(
                    "{col} >= {} AND {col} <= {}",
                    min.placeholder(),
                    max.placeholder(),
                    col = column
                ),
                vec![min.clone(), max.clone()],
            ),
            (Some(min), None) => Predicate::new(
                format!("{} >= {}", column, min.placeholder()),
                vec![min.clone()],
            ),
            (None, Some(max)) => Predicate::new(
                format!("{} <= {}", column, max.placeholder()),
                vec![max.clone()],
            ),
            (None, None) => {
                return Err(QueryError::invalid_filter_shape(
                    column,
                    "range needs 'min' or 'max'",
                ))
            }
        },
        FilterValue::Compare { value, op } => Predicate::new(
            format!("{} {} {}", column, op.as_sql(), value.placeholder()),
            vec![value.clone()],
        ),
        FilterValue::Scalar(value) => Predicate::new(
            format!("{} = {}", column, value.placeholder()),
            vec![value.clone()],
        ),
    };

    Ok(predicate)
}

fn membership(column: &str, keyword: &str, values: &[BindValue]) -> Predicate {
    let placeholders: Vec<&str> = values.iter().map(BindValue::placeholder).collect();
    Predicate::new(
        format!("{} {} ({})", column, keyword, placeholders.join(",")),
        values.to_vec(),
    )
}
