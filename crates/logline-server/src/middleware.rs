//! Error reporting middleware.
//!
//! Every 4xx and 5xx response is logged with the method and path that
//! produced it. Responses marked with [`InternalFailure`] have their detail
//! logged and their body replaced by the generic 500 body, which now also
//! names the request path.

use std::any::Any;

use axum::Json;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::error::{InternalErrorBody, InternalFailure, internal_response};

/// Logs failed responses and finishes internal error bodies.
pub async fn report_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();

    if let Some(InternalFailure(detail)) = response.extensions().get::<InternalFailure>() {
        error!(%method, %path, status = status.as_u16(), error = %detail, "Request failed");
        return (status, Json(InternalErrorBody::new(Some(path)))).into_response();
    }

    if status.is_server_error() {
        error!(%method, %path, status = status.as_u16(), "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = status.as_u16(), "Request rejected");
    }

    response
}

/// Converts a handler panic into a 500 response.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    };
    internal_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
}
