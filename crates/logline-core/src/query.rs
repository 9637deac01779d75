//! Query engine: filtering and newest-first ordering.
//!
//! A query reads the whole collection from the store, keeps the records that
//! match every present predicate, then sorts them by timestamp descending.
//! The sort is stable, so records with equal timestamps keep append order.
//! There is no limit or pagination.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::LogStore;
use crate::types::{LevelFilter, LogRecord, QueryFilter, TimeRange};

/// Query-string parameters of a log query, as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    /// Level, or `all`
    pub level: Option<String>,
    /// Message substring
    pub message: Option<String>,
    /// Resource id substring
    #[serde(rename = "resourceId")]
    pub resource_id: Option<String>,
    /// Lower timestamp bound
    pub timestamp_start: Option<String>,
    /// Upper timestamp bound
    pub timestamp_end: Option<String>,
    /// Trace id substring
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
    /// Span id substring
    #[serde(rename = "spanId")]
    pub span_id: Option<String>,
    /// Commit substring
    pub commit: Option<String>,
}

/// A filter built from [`QueryParams`], plus the parameters that were
/// dropped because they could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// The filter to apply
    pub filter: QueryFilter,
    /// Names of timestamp parameters ignored as unparsable
    pub ignored: Vec<&'static str>,
}

impl QueryParams {
    /// Converts raw parameters into a filter.
    ///
    /// Empty strings count as absent. An unparsable timestamp bound is
    /// dropped rather than failing the query, and its name is reported in
    /// [`ParsedQuery::ignored`] so callers can surface it.
    #[must_use]
    pub fn to_filter(&self) -> ParsedQuery {
        let mut ignored = Vec::new();
        let mut bound = |name: &'static str, value: Option<&str>| {
            let value = value?;
            let parsed = parse_time_bound(value);
            if parsed.is_none() {
                ignored.push(name);
            }
            parsed
        };

        let start = bound("timestamp_start", present(self.timestamp_start.as_ref()));
        let end = bound("timestamp_end", present(self.timestamp_end.as_ref()));

        let filter = QueryFilter {
            level: present(self.level.as_ref()).map(LevelFilter::parse),
            message: present(self.message.as_ref()).map(str::to_string),
            resource_id: present(self.resource_id.as_ref()).map(str::to_string),
            trace_id: present(self.trace_id.as_ref()).map(str::to_string),
            span_id: present(self.span_id.as_ref()).map(str::to_string),
            commit: present(self.commit.as_ref()).map(str::to_string),
            time_range: TimeRange::new(start, end),
        };

        ParsedQuery { filter, ignored }
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Parses a timestamp bound.
///
/// Accepts RFC 3339 date-times, naive date-times (read as UTC) and bare
/// dates (midnight UTC). Returns `None` for anything else.
#[must_use]
pub fn parse_time_bound(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Filters records and orders them newest first.
#[must_use]
pub fn apply_filter(mut records: Vec<LogRecord>, filter: &QueryFilter) -> Vec<LogRecord> {
    if !filter.is_empty() {
        records.retain(|record| record.matches(filter));
    }
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

/// Runs a query against a store.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn query(store: &dyn LogStore, filter: &QueryFilter) -> StoreResult<Vec<LogRecord>> {
    let records = store.read_all().await?;
    let total = records.len();
    let results = apply_filter(records, filter);
    debug!(total, matched = results.len(), "Query evaluated");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;
    use crate::types::LogLevel;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 15, hour, minute, 0).unwrap()
    }

    fn make_record(level: LogLevel, message: &str, timestamp: DateTime<Utc>) -> LogRecord {
        LogRecord::builder()
            .level(level)
            .message(message)
            .resource_id("server-1234")
            .timestamp(timestamp)
            .trace_id("abc-xyz-123")
            .span_id("span-456")
            .commit("5e5342f")
            .build()
            .unwrap()
    }

    fn scenario() -> Vec<LogRecord> {
        vec![
            make_record(LogLevel::Error, "A", ts(8, 0)),
            make_record(LogLevel::Info, "B", ts(7, 55)),
        ]
    }

    fn messages(records: &[LogRecord]) -> Vec<&str> {
        records.iter().map(|r| r.message.as_str()).collect()
    }

    #[test]
    fn level_filter_scenario() {
        let results = apply_filter(scenario(), &QueryFilter::new().with_level(LogLevel::Error));
        assert_eq!(messages(&results), vec!["A"]);
    }

    #[test]
    fn empty_filter_returns_all_newest_first() {
        let results = apply_filter(scenario(), &QueryFilter::new());
        assert_eq!(messages(&results), vec!["A", "B"]);
    }

    #[test]
    fn results_are_sorted_descending() {
        let records = vec![
            make_record(LogLevel::Info, "T1", ts(7, 0)),
            make_record(LogLevel::Info, "T3", ts(9, 0)),
            make_record(LogLevel::Info, "T2", ts(8, 0)),
        ];
        let results = apply_filter(records, &QueryFilter::new());
        assert_eq!(messages(&results), vec!["T3", "T2", "T1"]);
    }

    #[test]
    fn equal_timestamps_keep_append_order() {
        let records = vec![
            make_record(LogLevel::Info, "first", ts(8, 0)),
            make_record(LogLevel::Info, "second", ts(8, 0)),
        ];
        let results = apply_filter(records, &QueryFilter::new());
        assert_eq!(messages(&results), vec!["first", "second"]);
    }

    #[test]
    fn level_all_returns_every_level() {
        let records: Vec<LogRecord> = LogLevel::ALL
            .iter()
            .map(|level| make_record(*level, level.as_str(), ts(8, 0)))
            .collect();
        let results = apply_filter(records, &QueryFilter::new().with_level_str("all"));
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn message_filter_is_case_insensitive() {
        let records = vec![make_record(LogLevel::Error, "Failed to connect", ts(8, 0))];
        let results = apply_filter(records, &QueryFilter::new().with_message("FAILED"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let records = vec![
            make_record(LogLevel::Info, "before", ts(7, 0)),
            make_record(LogLevel::Info, "start", ts(7, 30)),
            make_record(LogLevel::Info, "end", ts(8, 30)),
            make_record(LogLevel::Info, "after", ts(9, 0)),
        ];
        let filter =
            QueryFilter::new().with_time_range(TimeRange::new(Some(ts(7, 30)), Some(ts(8, 30))));

        let results = apply_filter(records, &filter);
        assert_eq!(messages(&results), vec!["end", "start"]);
    }

    #[test]
    fn params_convert_to_filter() {
        let params = QueryParams {
            level: Some("error".into()),
            message: Some("db".into()),
            resource_id: Some(String::new()),
            timestamp_start: Some("2023-09-15T07:00:00Z".into()),
            ..Default::default()
        };

        let parsed = params.to_filter();

        assert!(parsed.ignored.is_empty());
        assert_eq!(parsed.filter.level, Some(LevelFilter::Only(LogLevel::Error)));
        assert_eq!(parsed.filter.message.as_deref(), Some("db"));
        assert_eq!(parsed.filter.resource_id, None);
        assert_eq!(parsed.filter.time_range.start, Some(ts(7, 0)));
        assert_eq!(parsed.filter.time_range.end, None);
    }

    #[test]
    fn unparsable_bound_is_ignored_and_reported() {
        let params = QueryParams {
            timestamp_start: Some("last tuesday".into()),
            timestamp_end: Some("2023-09-15T08:00:00Z".into()),
            ..Default::default()
        };

        let parsed = params.to_filter();

        assert_eq!(parsed.ignored, vec!["timestamp_start"]);
        assert_eq!(parsed.filter.time_range.start, None);
        assert_eq!(parsed.filter.time_range.end, Some(ts(8, 0)));
    }

    #[test]
    fn params_deserialize_from_query_names() {
        let params: QueryParams = serde_json::from_value(serde_json::json!({
            "resourceId": "srv",
            "traceId": "t",
            "spanId": "s",
            "timestamp_end": "2023-09-15"
        }))
        .unwrap();

        assert_eq!(params.resource_id.as_deref(), Some("srv"));
        assert_eq!(params.trace_id.as_deref(), Some("t"));
        assert_eq!(params.span_id.as_deref(), Some("s"));
        assert_eq!(params.timestamp_end.as_deref(), Some("2023-09-15"));
    }

    #[test]
    fn time_bound_formats() {
        assert_eq!(parse_time_bound("2023-09-15T08:00:00Z"), Some(ts(8, 0)));
        assert_eq!(parse_time_bound("2023-09-15T10:00:00+02:00"), Some(ts(8, 0)));
        assert_eq!(parse_time_bound("2023-09-15T08:00:00.000"), Some(ts(8, 0)));
        assert_eq!(parse_time_bound("2023-09-15T08:00"), Some(ts(8, 0)));
        assert_eq!(parse_time_bound("2023-09-15"), Some(ts(0, 0)));
        assert_eq!(parse_time_bound("15/09/2023"), None);
        assert_eq!(parse_time_bound(""), None);
    }

    #[tokio::test]
    async fn query_reads_through_store() {
        let store = MemoryLogStore::with_records(scenario());

        let results = query(&store, &QueryFilter::new()).await.unwrap();
        assert_eq!(messages(&results), vec!["A", "B"]);

        let results = query(&store, &QueryFilter::new().with_level(LogLevel::Error))
            .await
            .unwrap();
        assert_eq!(messages(&results), vec!["A"]);
    }

    fn arb_level() -> impl Strategy<Value = LogLevel> {
        prop::sample::select(LogLevel::ALL.to_vec())
    }

    fn arb_records() -> impl Strategy<Value = Vec<LogRecord>> {
        prop::collection::vec((arb_level(), 0i64..10_000, "[a-zA-Z ]{1,12}"), 0..40).prop_map(
            |items| {
                items
                    .into_iter()
                    .map(|(level, offset, message)| {
                        make_record(level, &message, ts(0, 0) + Duration::seconds(offset))
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn output_is_sorted_newest_first(records in arb_records()) {
            let results = apply_filter(records, &QueryFilter::new());
            for pair in results.windows(2) {
                prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            }
        }

        #[test]
        fn empty_filter_keeps_every_record(records in arb_records()) {
            let len = records.len();
            prop_assert_eq!(apply_filter(records, &QueryFilter::new()).len(), len);
        }

        #[test]
        fn level_filter_returns_exactly_that_level(records in arb_records(), level in arb_level()) {
            let expected = records.iter().filter(|r| r.level == level).count();
            let results = apply_filter(records, &QueryFilter::new().with_level(level));
            prop_assert_eq!(results.len(), expected);
            prop_assert!(results.iter().all(|r| r.level == level));
        }

        #[test]
        fn message_filter_ignores_case(records in arb_records(), needle in "[a-z]{1,3}") {
            let upper = apply_filter(records.clone(), &QueryFilter::new().with_message(needle.to_uppercase()));
            let lower = apply_filter(records, &QueryFilter::new().with_message(needle));
            prop_assert_eq!(upper, lower);
        }
    }
}
