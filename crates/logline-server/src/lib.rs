//! # logline-server
//!
//! HTTP ingestion API and live WebSocket feed for structured logs.
//!
//! Records are validated, appended to a single JSON file and pushed to every
//! connected viewer. Queries filter the whole collection and return it
//! newest first.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logline_server::{LoglineServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default().with_data_file("logs.json");
//!     let server = LoglineServer::new(config);
//!     // server.initialize().await.unwrap();
//!     // server.serve().await.unwrap();
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/logs` | POST | Validate and store one record (201) |
//! | `/logs` | GET | Filtered query, newest first |
//! | `/health` | GET | Liveness check |
//! | `/ws`, `/` | GET | WebSocket feed of `NEW_LOG` updates |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;
pub mod websocket;

// Re-export main types
pub use cli::{Cli, LogFormat};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use fanout::{SubscriberRegistry, Subscription, SubscriptionId};
pub use ingest::{IngestError, Ingestor};
pub use server::LoglineServer;
pub use state::AppState;
pub use types::{HealthResponse, LiveUpdate, RouteNotFound};
