//! Schema inspection subsystem
//!
//! Fetches the live column → SQL type mapping for a table and classifies
//! the raw type text as numeric, string or date/time.
//!
//! # Design Principles
//!
//! - Schema is loaded once per query and is immutable afterwards
//! - Missing tables and partial catalogs are errors
//! - Classification is pattern based over free-text type names

mod inspector;
mod types;

pub use inspector::SchemaInspector;
pub use types::{is_date_type, is_numeric_type, is_string_type, Schema, TypeClass};
