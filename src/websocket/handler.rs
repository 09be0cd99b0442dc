//! WebSocket Handler
//!
//! Upgrades `/ws` requests and pumps hub events to the dashboard.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use super::hub::{BroadcastHub, Subscription};
use crate::api::{ApiError, ApiResult, AppState};

/// WebSocket upgrade handler
///
/// The subscriber is attached before the upgrade so a full hub is
/// reported as a plain HTTP error.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let hub = Arc::clone(&state.hub);
    let subscription = hub
        .attach()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, subscription)))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>, subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();
    let Subscription {
        id,
        receiver: mut events,
        ..
    } = subscription;

    let conn_id_for_send = id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = events.recv().await {
            if sender.send(Message::Text(text.to_string())).await.is_err() {
                tracing::debug!(
                    subscriber_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
        let _ = sender.close().await;
    });

    let conn_id_for_recv = id.clone();
    let mut recv_task = tokio::spawn(async move {
        // Dashboards never send anything meaningful.
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    tracing::debug!(subscriber_id = %conn_id_for_recv, "Client requested close");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        subscriber_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.detach(&id).await;
}
