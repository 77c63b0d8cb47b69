//! Observability for aggregate queries
//!
//! Structured JSON logging over a typed event set. The query engine is
//! silent unless a request runs in debug mode.
//!
//! # Usage
//!
//! ```ignore
//! use aggquery::observability::{Event, Logger};
//!
//! Logger::event(Event::CacheHit, &[("cache_key", &key)]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
