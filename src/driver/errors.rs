//! # Driver Errors
//!
//! Failures reported by the database driver collaborator.

use thiserror::Error;

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by a database driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Statement was rejected or failed while running
    #[error("Query failed: {0}")]
    Query(String),

    /// Catalog introspection failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// No usable connection
    #[error("Connection unavailable: {0}")]
    Connection(String),
}
