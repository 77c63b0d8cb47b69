//! Aggregate query subsystem
//!
//! Builds, validates and runs one read-only aggregate (SUM, AVG, MIN, MAX,
//! COUNT) over a single table, with optional date range, ad-hoc column
//! filters and GROUP BY.
//!
//! # Flow
//!
//! 1. Decode the raw request into a [`QuerySpec`]
//! 2. Apply the extension hook
//! 3. Load the table schema and validate
//! 4. Compile filters and date range into predicates
//! 5. Assemble the parameterized statement
//! 6. Check the cache, execute on miss, shape and store the result
//!
//! # Invariants
//!
//! - Placeholder count always equals bind count
//! - Every referenced column exists in the live schema
//! - No SQL reaches the driver for an invalid request
//! - NULL results are never coerced to zero and never cached

mod aggregate;
mod assembler;
mod conditions;
mod dates;
mod errors;
mod filter;
mod predicate;
mod result;
mod spec;
mod validator;

pub use aggregate::{AggregateQuery, AggregateQueryBuilder, QueryHook, SPEC_HOOK_EVENT};
pub use assembler::{assemble, Statement};
pub use conditions::compile_conditions;
pub use dates::{check_date, compile_date_range, parse_date};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use filter::{sanitize_text, BindKind, BindValue, CompareOp, FilterValue, IN_SUFFIX, NOT_IN_SUFFIX};
pub use predicate::Predicate;
pub use result::{AggregateOutput, AggregateValue, Formatter, NULL_GROUP_KEY};
pub use spec::{AggregateFunction, QuerySpec, FIXED_FIELDS};
pub use validator::validate;
