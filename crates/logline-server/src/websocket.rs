//! WebSocket handler for the live log feed.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{OriginalUri, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::fanout::Subscription;
use crate::handlers::not_found;
use crate::state::AppState;

/// Handle a WebSocket upgrade on `/ws` or `/`.
pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if !state.add_ws_connection() {
        let current = state.ws_connection_count();
        let max = state.config().max_ws_connections;
        return Err(ApiError::TooManyConnections(current, max));
    }

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(socket, state)))
}

/// Handle `/`: a WebSocket upgrade if requested, otherwise an unknown route.
pub async fn root(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: OriginalUri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws_upgrade(State(state), ws).await.into_response(),
        Err(_) => not_found(method, uri).await.into_response(),
    }
}

/// Serve one viewer until either side goes away.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let subscription = state.subscribe();
    let id = subscription.id();
    let ping_interval = state.config().ws_ping_interval;
    info!(subscription = %id, active = state.ws_connection_count(), "Viewer connected");

    let mut send_task = tokio::spawn(async move {
        forward_updates_to_ws(&mut sender, subscription, ping_interval).await;
    });
    let mut recv_task = tokio::spawn(async move {
        handle_incoming_messages(&mut receiver).await;
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("WebSocket send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("WebSocket receive task completed");
            send_task.abort();
        }
    }

    state.unsubscribe(id);
    state.remove_ws_connection();
    info!(subscription = %id, "Viewer disconnected");
}

/// Push every live update to the socket, pinging between them.
async fn forward_updates_to_ws<S>(
    sender: &mut S,
    mut subscription: Subscription,
    ping_interval: Duration,
) where
    S: Sink<Message> + Unpin,
{
    let mut ping_timer = interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            update = subscription.recv() => {
                let Some(update) = update else { break };
                match serde_json::to_string(&update) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, kind = update.kind(), "Failed to serialize update");
                    }
                }
            }

            _ = ping_timer.tick() => {
                if sender.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Drain client frames. Viewers only listen; anything they send is ignored.
async fn handle_incoming_messages<R>(receiver: &mut R)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Ok(Message::Pong(_)) => {}
            Ok(other) => {
                debug!(?other, "Ignoring client frame");
            }
            Err(e) => {
                warn!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }
}
