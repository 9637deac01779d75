//! Ingestion path: validate, persist, notify.

use std::sync::Arc;

use logline_core::{FieldViolation, LogRecord, SharedLogStore, StoreError, validate_candidate};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::fanout::SubscriberRegistry;
use crate::types::LiveUpdate;

/// Why a candidate was not ingested.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The candidate failed validation. The store was not touched.
    #[error("candidate rejected with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The record was valid but could not be persisted.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Validates candidates, appends them to the store and broadcasts them.
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: SharedLogStore,
    subscribers: Arc<SubscriberRegistry>,
}

impl Ingestor {
    /// Creates an ingestor over a store and a subscriber registry.
    #[must_use]
    pub fn new(store: SharedLogStore, subscribers: Arc<SubscriberRegistry>) -> Self {
        Self { store, subscribers }
    }

    /// Ingests one candidate record.
    ///
    /// Subscribers are notified only after the record has been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] with every violation if the
    /// candidate is invalid, or [`IngestError::Storage`] if persisting fails.
    pub async fn ingest(&self, candidate: &Value) -> Result<LogRecord, IngestError> {
        let record = validate_candidate(candidate).map_err(|violations| {
            debug!(count = violations.len(), "Rejected log candidate");
            IngestError::Validation(violations)
        })?;

        let stored = self.store.append(record).await?;
        let notified = self
            .subscribers
            .broadcast(&LiveUpdate::NewLog(stored.clone()));

        info!(
            level = %stored.level,
            resource_id = %stored.resource_id,
            trace_id = %stored.trace_id,
            notified,
            "Ingested log record"
        );
        Ok(stored)
    }
}
