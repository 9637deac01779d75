//! Core types for log records and queries.
//!
//! This module provides:
//! - [`LogLevel`] - Severity levels accepted by the ingestion path
//! - [`LogRecord`] - Structured, immutable log record
//! - [`LogCollection`] - The persisted `{ "logs": [...] }` document
//! - [`QueryFilter`] - Optional predicates for narrowing a query
//! - [`TimeRange`] - Inclusive timestamp bounds

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::FieldViolation;

/// Level filter value that disables level filtering.
pub const LEVEL_ALL: &str = "all";

/// Log severity levels, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debugging information
    Debug = 0,
    /// General information
    Info = 1,
    /// Warning conditions
    Warn = 2,
    /// Error conditions
    Error = 3,
}

impl LogLevel {
    /// Every accepted level, most severe first.
    pub const ALL: [Self; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    /// Returns the wire representation of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parses a wire level. Matching is exact (lowercase only).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == value)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured log record.
///
/// Records are created once by the ingestion path and never mutated
/// afterwards. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Severity level
    pub level: LogLevel,
    /// The log message
    pub message: String,
    /// Identifier of the emitting resource
    pub resource_id: String,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Trace correlation identifier
    pub trace_id: String,
    /// Span correlation identifier
    pub span_id: String,
    /// Build or version identifier
    pub commit: String,
    /// Open key/value metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl LogRecord {
    /// Creates a new record builder.
    #[must_use]
    pub fn builder() -> LogRecordBuilder {
        LogRecordBuilder::default()
    }

    /// Checks if this record matches the given filter.
    #[must_use]
    pub fn matches(&self, filter: &QueryFilter) -> bool {
        if let Some(ref level) = filter.level {
            if !level.matches(self.level) {
                return false;
            }
        }

        let substrings = [
            (&filter.message, &self.message),
            (&filter.resource_id, &self.resource_id),
            (&filter.trace_id, &self.trace_id),
            (&filter.span_id, &self.span_id),
            (&filter.commit, &self.commit),
        ];
        for (needle, haystack) in substrings {
            if let Some(needle) = needle {
                if !contains_ignore_case(haystack, needle) {
                    return false;
                }
            }
        }

        filter.time_range.contains(self.timestamp)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The persisted document: `{ "logs": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogCollection {
    /// Every stored record in append order.
    #[serde(default)]
    pub logs: Vec<LogRecord>,
}

/// Level predicate of a [`QueryFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelFilter {
    /// The special `all` value: no level filtering.
    All,
    /// Exactly this level.
    Only(LogLevel),
    /// A value naming no known level. Matches nothing.
    Unknown(String),
}

impl LevelFilter {
    /// Interprets a query-string level value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == LEVEL_ALL {
            return Self::All;
        }
        LogLevel::parse(value).map_or_else(|| Self::Unknown(value.to_string()), Self::Only)
    }

    /// Checks a record level against this predicate.
    #[must_use]
    pub fn matches(&self, level: LogLevel) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == level,
            Self::Unknown(_) => false,
        }
    }
}

/// Inclusive time range for filtering records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Lower bound (inclusive)
    pub start: Option<DateTime<Utc>>,
    /// Upper bound (inclusive)
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a new time range with the given bounds.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Checks if a timestamp falls within this range, bounds included.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Filter criteria for querying logs. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Level predicate
    pub level: Option<LevelFilter>,
    /// Case-insensitive substring of the message
    pub message: Option<String>,
    /// Case-insensitive substring of the resource id
    pub resource_id: Option<String>,
    /// Case-insensitive substring of the trace id
    pub trace_id: Option<String>,
    /// Case-insensitive substring of the span id
    pub span_id: Option<String>,
    /// Case-insensitive substring of the commit
    pub commit: Option<String>,
    /// Timestamp bounds
    pub time_range: TimeRange,
}

impl QueryFilter {
    /// Creates a new empty filter that matches all records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Filters on exactly one level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(LevelFilter::Only(level));
        self
    }

    /// Sets the level predicate from its query-string form.
    #[must_use]
    pub fn with_level_str(mut self, level: &str) -> Self {
        self.level = Some(LevelFilter::parse(level));
        self
    }

    /// Adds a message substring filter.
    #[must_use]
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }

    /// Adds a resource id substring filter.
    #[must_use]
    pub fn with_resource_id(mut self, text: impl Into<String>) -> Self {
        self.resource_id = Some(text.into());
        self
    }

    /// Adds a trace id substring filter.
    #[must_use]
    pub fn with_trace_id(mut self, text: impl Into<String>) -> Self {
        self.trace_id = Some(text.into());
        self
    }

    /// Adds a span id substring filter.
    #[must_use]
    pub fn with_span_id(mut self, text: impl Into<String>) -> Self {
        self.span_id = Some(text.into());
        self
    }

    /// Adds a commit substring filter.
    #[must_use]
    pub fn with_commit(mut self, text: impl Into<String>) -> Self {
        self.commit = Some(text.into());
        self
    }

    /// Sets the timestamp bounds.
    #[must_use]
    pub const fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }
}

/// Builder for constructing log records.
#[derive(Debug, Default)]
pub struct LogRecordBuilder {
    level: Option<LogLevel>,
    message: Option<String>,
    resource_id: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    trace_id: Option<String>,
    span_id: Option<String>,
    commit: Option<String>,
    metadata: Map<String, Value>,
}

impl LogRecordBuilder {
    /// Sets the level.
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the resource id.
    #[must_use]
    pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the span id.
    #[must_use]
    pub fn span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Sets the commit.
    #[must_use]
    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the record.
    ///
    /// # Errors
    ///
    /// Returns the first missing or empty required field.
    pub fn build(self) -> Result<LogRecord, FieldViolation> {
        let level = self.level.ok_or_else(|| FieldViolation::required("level"))?;
        let timestamp = self
            .timestamp
            .ok_or_else(|| FieldViolation::required("timestamp"))?;

        Ok(LogRecord {
            level,
            message: required_text("message", self.message)?,
            resource_id: required_text("resourceId", self.resource_id)?,
            timestamp,
            trace_id: required_text("traceId", self.trace_id)?,
            span_id: required_text("spanId", self.span_id)?,
            commit: required_text("commit", self.commit)?,
            metadata: self.metadata,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, FieldViolation> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(FieldViolation::empty(field)),
        None => Err(FieldViolation::required(field)),
    }
}
