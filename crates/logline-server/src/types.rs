//! API response and live update types.

use chrono::{DateTime, Utc};
use logline_core::LogRecord;
use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "log-ingestion-api";

/// Real-time update pushed to every WebSocket viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum LiveUpdate {
    /// A record was ingested.
    #[serde(rename = "NEW_LOG")]
    NewLog(LogRecord),
}

impl LiveUpdate {
    /// Returns the wire tag of this update.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewLog(_) => "NEW_LOG",
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `OK` while the server answers.
    pub status: String,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Service name.
    pub service: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Body of the 404 response for unknown routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteNotFound {
    /// Fixed error text.
    pub error: String,
    /// Requested path.
    pub path: String,
    /// Requested method.
    pub method: String,
    /// Time of the request.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use logline_core::LogLevel;

    fn make_record() -> LogRecord {
        LogRecord::builder()
            .level(LogLevel::Warn)
            .message("High memory usage detected")
            .resource_id("server-5678")
            .timestamp(Utc.with_ymd_and_hms(2023, 9, 15, 7, 55, 0).unwrap())
            .trace_id("def-uvw-456")
            .span_id("span-789")
            .commit("3a1b2c4")
            .build()
            .unwrap()
    }

    #[test]
    fn test_live_update_wire_shape() {
        let update = LiveUpdate::NewLog(make_record());

        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["type"], "NEW_LOG");
        assert_eq!(json["payload"]["level"], "warn");
        assert_eq!(json["payload"]["resourceId"], "server-5678");
        assert_eq!(update.kind(), "NEW_LOG");
    }

    #[test]
    fn test_live_update_deserialization() {
        let json = serde_json::to_string(&LiveUpdate::NewLog(make_record())).unwrap();
        let parsed: LiveUpdate = serde_json::from_str(&json).unwrap();

        let LiveUpdate::NewLog(record) = parsed;
        assert_eq!(record, make_record());
    }
}
