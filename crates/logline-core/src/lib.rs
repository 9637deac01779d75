//! # logline-core
//!
//! Storage and query core for the logline ingestion service.
//!
//! This crate provides:
//!
//! - [`LogRecord`] - Immutable structured log record
//! - [`LogLevel`] - Severity levels (error, warn, info, debug)
//! - [`QueryFilter`] - Optional predicates for narrowing a query
//! - [`validate_candidate`] - Field-by-field validation of untyped input
//! - [`LogStore`] - Whole-collection store abstraction
//! - [`JsonFileStore`] - Single JSON document store with atomic replace
//! - [`MemoryLogStore`] - In-memory store with the same contract
//! - [`query`] - Filter and newest-first ordering over a store
//!
//! ## Example
//!
//! ```rust
//! use logline_core::{LogLevel, LogRecord, QueryFilter, apply_filter};
//! use chrono::{TimeZone, Utc};
//!
//! let record = LogRecord::builder()
//!     .level(LogLevel::Error)
//!     .message("Failed to connect to database")
//!     .resource_id("server-1234")
//!     .timestamp(Utc.with_ymd_and_hms(2023, 9, 15, 8, 0, 0).unwrap())
//!     .trace_id("abc-xyz-123")
//!     .span_id("span-456")
//!     .commit("5e5342f")
//!     .build()
//!     .unwrap();
//!
//! let filter = QueryFilter::new().with_message("FAILED");
//! assert_eq!(apply_filter(vec![record], &filter).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod query;
pub mod store;
pub mod types;
pub mod validation;

// Re-export main types
pub use error::{StoreError, StoreResult};
pub use query::{ParsedQuery, QueryParams, apply_filter, parse_time_bound, query};
pub use store::{JsonFileStore, LogStore, MemoryLogStore, SharedLogStore};
pub use types::{
    LEVEL_ALL, LevelFilter, LogCollection, LogLevel, LogRecord, LogRecordBuilder, QueryFilter,
    TimeRange,
};
pub use validation::{FieldViolation, validate_candidate};
