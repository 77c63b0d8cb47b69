//! Date bounds
//!
//! Bounds are accepted only when they parse cleanly as a calendar date or
//! date-time. `2023-02-30` or `2023-13-40` never reach the database.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::errors::{QueryError, QueryResult};
use super::filter::BindValue;
use super::predicate::Predicate;

const DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a date bound, or `None` if it is not a recognizable date.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Some(parsed) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(parsed);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Reject a non-empty bound that does not parse.
pub fn check_date(value: &str) -> QueryResult<()> {
    if value.is_empty() || parse_date(value).is_some() {
        Ok(())
    } else {
        Err(QueryError::invalid_date_format(value))
    }
}

/// Compile `(date_column, start, end)` into one merged predicate.
///
/// Returns `None` unless the column is set and at least one bound is
/// non-empty. Bounds are re-checked here so a malformed bound can never
/// reach the driver, whatever path built the spec.
pub fn compile_date_range(
    date_column: &str,
    start: &str,
    end: &str,
) -> QueryResult<Option<Predicate>> {
    if date_column.is_empty() || (start.is_empty() && end.is_empty()) {
        return Ok(None);
    }

    let mut clauses = Vec::with_capacity(2);
    let mut binds = Vec::with_capacity(2);

    if !start.is_empty() {
        check_date(start)?;
        clauses.push(format!("{} >= %s", date_column));
        binds.push(BindValue::Text(start.to_string()));
    }
    if !end.is_empty() {
        check_date(end)?;
        clauses.push(format!("{} <= %s", date_column));
        binds.push(BindValue::Text(end.to_string()));
    }

    Ok(Some(Predicate::new(clauses.join(" AND "), binds)))
}
