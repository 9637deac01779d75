//! HTTP request handlers for the ingestion API.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{OriginalUri, Query, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use logline_core::{LogRecord, QueryParams};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{HealthResponse, RouteNotFound, SERVICE_NAME};

/// Response header naming query parameters that were dropped as unparsable.
pub const IGNORED_FILTERS_HEADER: HeaderName = HeaderName::from_static("x-logline-ignored-filters");

/// Handle POST /logs - validate, persist and broadcast one record.
pub async fn ingest_log(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LogRecord>)> {
    let Json(candidate) = body.map_err(|rejection| ApiError::InvalidRequest {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let stored = state.ingest(&candidate).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Handle GET /logs - filtered query, newest first.
pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params.map_err(|rejection| ApiError::InvalidRequest {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let parsed = params.to_filter();
    let records = state.query(&parsed.filter).await?;
    debug!(count = records.len(), "Log query served");

    if parsed.ignored.is_empty() {
        return Ok(Json(records).into_response());
    }

    let ignored = parsed.ignored.join(",");
    warn!(ignored = %ignored, "Ignoring unparsable timestamp filter");
    let value = HeaderValue::from_str(&ignored).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(IGNORED_FILTERS_HEADER, value)], Json(records)).into_response())
}

/// Handle GET /health - liveness check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Fallback for unknown routes and unsupported methods.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFound {
            error: "Route not found".to_string(),
            path: uri.path().to_string(),
            method: method.to_string(),
            timestamp: Utc::now(),
        }),
    )
}
