//! Query assembler
//!
//! Builds the final parameterized statement:
//!
//! ```text
//! SELECT {FN}({column})[, {group_by}] FROM {table}
//!     [WHERE {filters...} AND {date range}]
//!     [GROUP BY {group_by}]
//! ```
//!
//! Bind values follow fragment order: ad-hoc filters first, then the date
//! range bounds. Text binds are reduced to plain text here.

use super::errors::{QueryError, QueryResult};
use super::filter::BindValue;
use super::predicate::Predicate;
use super::spec::{AggregateFunction, QuerySpec};

/// A statement ready for the driver
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Assemble a statement from a validated spec and its compiled predicates.
///
/// `table_name` is the driver-qualified table name.
pub fn assemble(
    spec: &QuerySpec,
    table_name: &str,
    predicates: &[Predicate],
    date_range: Option<&Predicate>,
) -> QueryResult<Statement> {
    let aggregate = match spec.function {
        AggregateFunction::Count => "COUNT(*)".to_string(),
        AggregateFunction::Sum
        | AggregateFunction::Avg
        | AggregateFunction::Min
        | AggregateFunction::Max => {
            if spec.column.is_empty() {
                return Err(QueryError::unknown_column(&spec.column));
            }
            format!("{}({})", spec.function.as_sql(), spec.column)
        }
    };

    let mut sql = format!("SELECT {}", aggregate);
    if spec.is_grouped() {
        sql.push_str(", ");
        sql.push_str(&spec.group_by);
    }
    sql.push_str(" FROM ");
    sql.push_str(table_name);

    let fragments: Vec<&Predicate> = predicates.iter().chain(date_range).collect();
    let mut binds = Vec::new();
    if !fragments.is_empty() {
        let clauses: Vec<&str> = fragments.iter().map(|p| p.sql()).collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        binds.extend(
            fragments
                .iter()
                .flat_map(|p| p.binds())
                .map(BindValue::sanitized),
        );
    }

    if spec.is_grouped() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&spec.group_by);
    }

    Ok(Statement { sql, binds })
}
