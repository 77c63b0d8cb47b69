//! Compiled WHERE fragments

use super::filter::BindValue;

/// One WHERE fragment with its bind values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    binds: Vec<BindValue>,
}

impl Predicate {
    /// Creates a predicate. Placeholder count must equal `binds.len()`.
    pub fn new(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        let predicate = Self {
            sql: sql.into(),
            binds,
        };
        debug_assert_eq!(predicate.placeholder_count(), predicate.binds.len());
        predicate
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// Number of `%d`/`%f`/`%s` placeholders in the fragment
    pub fn placeholder_count(&self) -> usize {
        ["%d", "%f", "%s"]
            .iter()
            .map(|p| self.sql.matches(p).count())
            .sum()
    }
}
