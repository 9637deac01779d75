//! Shared state for the ingestion server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use logline_core::{JsonFileStore, LogRecord, QueryFilter, SharedLogStore, StoreResult, query};
use serde_json::Value;

use crate::config::ServerConfig;
use crate::fanout::{SubscriberRegistry, Subscription, SubscriptionId};
use crate::ingest::{IngestError, Ingestor};

/// Shared state for the ingestion server.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Log collection backend.
    store: SharedLogStore,
    /// Live update subscribers.
    subscribers: Arc<SubscriberRegistry>,
    /// Validate, persist, notify.
    ingestor: Ingestor,
    /// Number of active WebSocket connections.
    ws_connections: AtomicUsize,
    /// Server start time.
    start_time: Instant,
}

impl AppState {
    /// Create state backed by the JSON file named in the configuration.
    pub fn new(config: ServerConfig) -> Self {
        let store: SharedLogStore = Arc::new(JsonFileStore::new(config.data_file.clone()));
        Self::with_store(config, store)
    }

    /// Create state over an explicit store backend.
    pub fn with_store(config: ServerConfig, store: SharedLogStore) -> Self {
        let subscribers = Arc::new(SubscriberRegistry::new(config.subscriber_buffer));
        let ingestor = Ingestor::new(store.clone(), subscribers.clone());
        Self {
            config: Arc::new(config),
            store,
            subscribers,
            ingestor,
            ws_connections: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a handle to the store.
    #[must_use]
    pub fn store(&self) -> SharedLogStore {
        self.store.clone()
    }

    /// Get the subscriber registry.
    #[must_use]
    pub fn subscribers(&self) -> Arc<SubscriberRegistry> {
        self.subscribers.clone()
    }

    /// Ingest one candidate record.
    pub async fn ingest(&self, candidate: &Value) -> Result<LogRecord, IngestError> {
        self.ingestor.ingest(candidate).await
    }

    /// Run a query against the store.
    pub async fn query(&self, filter: &QueryFilter) -> StoreResult<Vec<LogRecord>> {
        query(self.store.as_ref(), filter).await
    }

    /// Subscribe to live updates.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    /// Drop a live update subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Get the number of active WebSocket connections.
    #[must_use]
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Relaxed)
    }

    /// Increment the WebSocket connection count.
    ///
    /// Returns `true` if the connection was allowed, `false` if limit reached.
    pub fn add_ws_connection(&self) -> bool {
        let current = self.ws_connections.fetch_add(1, Ordering::Relaxed);
        if current >= self.config.max_ws_connections {
            self.ws_connections.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Decrement the WebSocket connection count.
    pub fn remove_ws_connection(&self) {
        self.ws_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiveUpdate;
    use logline_core::{LogLevel, MemoryLogStore};
    use serde_json::json;

    fn make_test_state() -> AppState {
        AppState::with_store(ServerConfig::default(), Arc::new(MemoryLogStore::new()))
    }

    fn candidate(level: &str, message: &str, timestamp: &str) -> Value {
        json!({
            "level": level,
            "message": message,
            "resourceId": "payment-service",
            "timestamp": timestamp,
            "traceId": "mno-tuv-345",
            "spanId": "span-678",
            "commit": "9e8d7c6",
            "metadata": { "parentResourceId": "api-gateway" }
        })
    }

    #[tokio::test]
    async fn test_state_creation() {
        let state = make_test_state();

        assert_eq!(state.ws_connection_count(), 0);
        assert!(state.subscribers().is_empty());
        assert!(state.uptime_secs() < 2);
    }

    #[tokio::test]
    async fn test_ws_connection_limit() {
        let config = ServerConfig::default().with_max_ws_connections(2);
        let state = AppState::with_store(config, Arc::new(MemoryLogStore::new()));

        assert!(state.add_ws_connection());
        assert!(state.add_ws_connection());
        assert!(!state.add_ws_connection());
        assert_eq!(state.ws_connection_count(), 2);

        state.remove_ws_connection();
        assert!(state.add_ws_connection());
    }

    #[tokio::test]
    async fn test_scenario_query_order() {
        let state = make_test_state();

        state
            .ingest(&candidate("info", "B", "2023-09-15T07:55:00Z"))
            .await
            .unwrap();
        state
            .ingest(&candidate("error", "A", "2023-09-15T08:00:00Z"))
            .await
            .unwrap();

        let all = state.query(&QueryFilter::new()).await.unwrap();
        let messages: Vec<&str> = all.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["A", "B"]);

        let errors = state
            .query(&QueryFilter::new().with_level(LogLevel::Error))
            .await
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "A");
    }

    #[tokio::test]
    async fn test_ingest_notifies_subscribers() {
        let state = make_test_state();
        let mut sub = state.subscribe();

        let stored = state
            .ingest(&candidate("debug", "Cache hit", "2023-09-15T07:45:00Z"))
            .await
            .unwrap();

        assert_eq!(sub.recv().await, Some(LiveUpdate::NewLog(stored)));
        assert!(state.unsubscribe(sub.id()));
    }

    #[tokio::test]
    async fn test_file_backed_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig::default().with_data_file(dir.path().join("logs.json"));
        let state = AppState::new(config);
        state.store().initialize().await.unwrap();

        state
            .ingest(&candidate("warn", "persisted", "2023-09-15T07:55:00Z"))
            .await
            .unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("logs.json")).unwrap();
        assert!(on_disk.contains("\"message\": \"persisted\""));
    }
}
