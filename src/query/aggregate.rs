//! Aggregate query execution
//!
//! Execution flow (strict order):
//! 1. Decode the raw request and apply the extension hook (construction)
//! 2. Load the table schema and validate the spec (construction)
//! 3. Compile filters and the date range, assemble the statement
//! 4. Return a cached result if caching is on and the key is present
//! 5. Execute, shape the result, store it if non-null
//!
//! Every documented error is raised before SQL reaches the driver.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::cache::{cache_key, CacheStore};
use crate::config::QueryConfig;
use crate::driver::DatabaseDriver;
use crate::observability::{Event, Logger};
use crate::schema::{Schema, SchemaInspector};

use super::assembler::{assemble, Statement};
use super::conditions::compile_conditions;
use super::dates::compile_date_range;
use super::errors::{QueryError, QueryResult};
use super::result::{group_key, shape_value, AggregateOutput, Formatter};
use super::spec::QuerySpec;
use super::validator::validate;

/// Event name passed to the extension hook
pub const SPEC_HOOK_EVENT: &str = "aggregate_query_spec";

/// Extension point that may rewrite a decoded spec before validation.
///
/// Must be free of side effects; it runs once per construction.
pub trait QueryHook {
    fn apply(&self, event: &str, spec: QuerySpec, raw: &Map<String, Value>) -> QuerySpec;
}

impl<F> QueryHook for F
where
    F: Fn(QuerySpec, &Map<String, Value>) -> QuerySpec,
{
    fn apply(&self, _event: &str, spec: QuerySpec, raw: &Map<String, Value>) -> QuerySpec {
        self(spec, raw)
    }
}

/// Builder for [`AggregateQuery`].
pub struct AggregateQueryBuilder<'a, D: DatabaseDriver, C: CacheStore> {
    driver: &'a D,
    cache: &'a C,
    config: QueryConfig,
    hook: Option<&'a dyn QueryHook>,
    formatter: Option<Formatter>,
}

impl<'a, D: DatabaseDriver, C: CacheStore> AggregateQueryBuilder<'a, D, C> {
    /// Defaults for options the request leaves unset
    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hook(mut self, hook: &'a dyn QueryHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Decode, hook, load schema and validate a raw request.
    pub fn build(self, raw: &Map<String, Value>) -> QueryResult<AggregateQuery<'a, D, C>> {
        let mut spec = QuerySpec::from_raw(raw, &self.config)?;
        if self.formatter.is_some() {
            spec.formatter = self.formatter.clone();
        }
        self.finish(spec, raw)
    }

    /// Same as [`build`](Self::build) for a spec constructed in code. The
    /// hook sees an empty raw map.
    pub fn build_spec(self, mut spec: QuerySpec) -> QueryResult<AggregateQuery<'a, D, C>> {
        if self.formatter.is_some() {
            spec.formatter = self.formatter.clone();
        }
        self.finish(spec, &Map::new())
    }

    fn finish(self, spec: QuerySpec, raw: &Map<String, Value>) -> QueryResult<AggregateQuery<'a, D, C>> {
        let spec = match self.hook {
            Some(hook) => hook.apply(SPEC_HOOK_EVENT, spec, raw),
            None => spec,
        };

        if spec.debug {
            self.driver.show_errors(true);
        }

        let schema = SchemaInspector::new(self.driver)
            .load(&spec.table)
            .and_then(|schema| validate(&spec, &schema).map(|_| schema));
        let schema = match schema {
            Ok(schema) => schema,
            Err(e) => {
                if spec.debug {
                    Logger::event(
                        Event::QueryRejected,
                        &[("code", e.code().code()), ("reason", e.message())],
                    );
                }
                return Err(e);
            }
        };

        if spec.debug {
            let columns = schema.len().to_string();
            Logger::event(
                Event::SchemaLoaded,
                &[("table", spec.table.as_str()), ("columns", columns.as_str())],
            );
        }

        Ok(AggregateQuery {
            spec,
            schema,
            driver: self.driver,
            cache: self.cache,
        })
    }
}

/// One validated aggregate request bound to its driver and cache.
pub struct AggregateQuery<'a, D: DatabaseDriver, C: CacheStore> {
    spec: QuerySpec,
    schema: Schema,
    driver: &'a D,
    cache: &'a C,
}

impl<'a, D: DatabaseDriver, C: CacheStore> AggregateQuery<'a, D, C> {
    /// Start building a query against `driver` and `cache`
    pub fn builder(driver: &'a D, cache: &'a C) -> AggregateQueryBuilder<'a, D, C> {
        AggregateQueryBuilder {
            driver,
            cache,
            config: QueryConfig::default(),
            hook: None,
            formatter: None,
        }
    }

    /// Build from a raw request with default configuration
    pub fn new(raw: &Map<String, Value>, driver: &'a D, cache: &'a C) -> QueryResult<Self> {
        Self::builder(driver, cache).build(raw)
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Compile and assemble the statement without executing it.
    pub fn statement(&self) -> QueryResult<Statement> {
        let predicates = compile_conditions(&self.spec.filters, &self.schema)?;
        let date_range = compile_date_range(
            &self.spec.date_column,
            &self.spec.date_start,
            &self.spec.date_end,
        )?;
        let table_name = self.driver.prefixed_name(&self.spec.table);
        assemble(&self.spec, &table_name, &predicates, date_range.as_ref())
    }

    /// Cache key for this request
    pub fn cache_key(&self) -> String {
        cache_key(&self.spec.cache_group, &self.spec.normalized())
    }

    /// Run the aggregate.
    ///
    /// Returns a scalar, a group mapping (possibly empty) or `Null` when no
    /// rows matched an ungrouped aggregate.
    pub fn get_result(&self) -> QueryResult<AggregateOutput> {
        let statement = self.statement()?;
        self.trace(Event::QueryBuilt, &[("sql", statement.sql.as_str())]);

        let key = if self.spec.caching {
            let key = self.cache_key();
            if let Some(cached) = self.lookup(&key) {
                return Ok(cached);
            }
            Some(key)
        } else {
            None
        };

        let output = self.execute(&statement)?;

        if let Some(key) = key {
            self.store(&key, &output);
        }
        Ok(output)
    }

    fn lookup(&self, key: &str) -> Option<AggregateOutput> {
        let stored = match self.cache.get(key, &self.spec.cache_group) {
            Some(stored) => stored,
            None => {
                self.trace(Event::CacheMiss, &[("cache_key", key)]);
                return None;
            }
        };
        match serde_json::from_value::<AggregateOutput>(stored) {
            Ok(output) => {
                self.trace(Event::CacheHit, &[("cache_key", key)]);
                Some(output)
            }
            Err(e) => {
                let reason = e.to_string();
                self.trace(
                    Event::CacheDecodeFailed,
                    &[("cache_key", key), ("reason", reason.as_str())],
                );
                None
            }
        }
    }

    fn store(&self, key: &str, output: &AggregateOutput) {
        if output.is_null() {
            return;
        }
        match serde_json::to_value(output) {
            Ok(value) => {
                self.cache.set(key, value, &self.spec.cache_group);
                self.trace(Event::CacheStored, &[("cache_key", key)]);
            }
            Err(e) => {
                let reason = e.to_string();
                self.trace(
                    Event::CacheDecodeFailed,
                    &[("cache_key", key), ("reason", reason.as_str())],
                );
            }
        }
    }

    fn execute(&self, statement: &Statement) -> QueryResult<AggregateOutput> {
        let function = self.spec.function;
        let formatter = self.spec.formatter.as_ref();

        let output = if self.spec.is_grouped() {
            let rows = self
                .driver
                .query_rows(&statement.sql, &statement.binds)
                .map_err(|e| self.failed(QueryError::database(e)))?;

            let mut groups: BTreeMap<String, Value> = BTreeMap::new();
            for row in &rows {
                let (aggregate, group) = match row.as_slice() {
                    [aggregate, group, ..] => (aggregate, group),
                    _ => {
                        return Err(self.failed(QueryError::unexpected_result(format!(
                            "grouped row has {} columns, expected 2",
                            row.len()
                        ))))
                    }
                };
                let value = shape_value(function, Some(aggregate), formatter)
                    .map_err(|e| self.failed(e))?;
                let key = group_key(group);
                if groups.contains_key(&key) {
                    return Err(self.failed(QueryError::unexpected_result(format!(
                        "group '{}' returned more than once",
                        key
                    ))));
                }
                groups.insert(key, value);
            }
            AggregateOutput::Grouped(groups)
        } else {
            let scalar = self
                .driver
                .query_scalar(&statement.sql, &statement.binds)
                .map_err(|e| self.failed(QueryError::database(e)))?;
            match shape_value(function, scalar.as_ref(), formatter).map_err(|e| self.failed(e))? {
                Value::Null => AggregateOutput::Null,
                value => AggregateOutput::Scalar(value),
            }
        };

        self.trace(Event::QueryExecuted, &[("table", self.spec.table.as_str())]);
        Ok(output)
    }

    fn failed(&self, error: QueryError) -> QueryError {
        self.trace(
            Event::QueryFailed,
            &[("code", error.code().code()), ("reason", error.message())],
        );
        error
    }

    fn trace(&self, event: Event, fields: &[(&str, &str)]) {
        if self.spec.debug {
            Logger::event(event, fields);
        }
    }
}
