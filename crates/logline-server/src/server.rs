//! Ingestion server implementation.

use std::future::Future;
use std::sync::Arc;

use logline_core::SharedLogStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::AppState;

/// Log ingestion server.
///
/// Accepts records over HTTP, answers filtered queries and pushes every
/// accepted record to connected WebSocket viewers.
#[derive(Debug, Clone)]
pub struct LoglineServer {
    state: Arc<AppState>,
}

impl LoglineServer {
    /// Create a server persisting to the configured data file.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Create a server over an explicit store backend.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: SharedLogStore) -> Self {
        Self {
            state: Arc::new(AppState::with_store(config, store)),
        }
    }

    /// Get the server state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Prepare the store so the first request finds a valid collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be created.
    pub async fn initialize(&self) -> ApiResult<()> {
        self.state.store().initialize().await?;
        info!(data_file = %self.state.config().data_file.display(), "Log store ready");
        Ok(())
    }

    /// Start the server on the configured address.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self) -> ApiResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server on the configured address with graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        info!(addr = %local, "Log ingestion server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("Log ingestion server shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}
