//! Validation of untyped log candidates.
//!
//! Incoming request bodies are checked field by field against the record
//! schema. Every violation is collected so a caller sees all problems in one
//! response rather than fixing them one at a time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{LogLevel, LogRecord};

/// One violated constraint on a candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    /// Wire name of the offending field (empty for the body itself).
    pub field: String,
    /// Human readable reason.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field is absent.
    #[must_use]
    pub fn required(field: &str) -> Self {
        Self::new(field, "Required")
    }

    /// The field is present but an empty string.
    #[must_use]
    pub fn empty(field: &str) -> Self {
        Self::new(field, empty_message(field))
    }
}

fn empty_message(field: &str) -> String {
    let label = match field {
        "message" => "Message",
        "resourceId" => "Resource ID",
        "traceId" => "Trace ID",
        "spanId" => "Span ID",
        "commit" => "Commit",
        other => other,
    };
    format!("{label} is required")
}

/// Collects violations while pulling typed values out of a JSON object.
struct CandidateReader<'a> {
    object: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> CandidateReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            violations: Vec::new(),
        }
    }

    fn string(&mut self, field: &str) -> Option<&'a str> {
        match self.object.get(field) {
            None | Some(Value::Null) => {
                self.violations.push(FieldViolation::required(field));
                None
            }
            Some(Value::String(text)) => Some(text.as_str()),
            Some(other) => {
                self.violations.push(FieldViolation::new(
                    field,
                    format!("Expected string, received {}", json_type(other)),
                ));
                None
            }
        }
    }

    fn non_empty(&mut self, field: &str) -> Option<String> {
        let text = self.string(field)?;
        if text.is_empty() {
            self.violations.push(FieldViolation::empty(field));
            return None;
        }
        Some(text.to_string())
    }

    fn level(&mut self) -> Option<LogLevel> {
        let text = self.string("level")?;
        let level = LogLevel::parse(text);
        if level.is_none() {
            let expected = LogLevel::ALL
                .iter()
                .map(|l| format!("'{l}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            self.violations.push(FieldViolation::new(
                "level",
                format!("Invalid enum value. Expected {expected}, received '{text}'"),
            ));
        }
        level
    }

    fn timestamp(&mut self) -> Option<DateTime<Utc>> {
        let text = self.string("timestamp")?;
        match DateTime::parse_from_rfc3339(text) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => {
                self.violations
                    .push(FieldViolation::new("timestamp", "Invalid timestamp format"));
                None
            }
        }
    }

    fn metadata(&mut self) -> Map<String, Value> {
        match self.object.get("metadata") {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                self.violations.push(FieldViolation::new(
                    "metadata",
                    format!("Expected object, received {}", json_type(other)),
                ));
                Map::new()
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates an untyped candidate and builds a [`LogRecord`] from it.
///
/// Unknown keys are ignored. `metadata` defaults to an empty object.
///
/// # Errors
///
/// Returns every violated constraint if the candidate is not a valid record.
pub fn validate_candidate(candidate: &Value) -> Result<LogRecord, Vec<FieldViolation>> {
    let Value::Object(object) = candidate else {
        return Err(vec![FieldViolation::new(
            "",
            format!("Expected object, received {}", json_type(candidate)),
        )]);
    };

    let mut reader = CandidateReader::new(object);
    let level = reader.level();
    let message = reader.non_empty("message");
    let resource_id = reader.non_empty("resourceId");
    let timestamp = reader.timestamp();
    let trace_id = reader.non_empty("traceId");
    let span_id = reader.non_empty("spanId");
    let commit = reader.non_empty("commit");
    let metadata = reader.metadata();

    match (level, message, resource_id, timestamp, trace_id, span_id, commit) {
        (
            Some(level),
            Some(message),
            Some(resource_id),
            Some(timestamp),
            Some(trace_id),
            Some(span_id),
            Some(commit),
        ) if reader.violations.is_empty() => Ok(LogRecord {
            level,
            message,
            resource_id,
            timestamp,
            trace_id,
            span_id,
            commit,
            metadata,
        }),
        _ => Err(reader.violations),
    }
}
