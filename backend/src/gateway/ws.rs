//! WebSocket handler for client connections.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use hivemind_common::{ClientMessage, ServerEvent};

use crate::AppState;

/// Events queued per connection before `push` starts reporting failure.
const SESSION_CHANNEL_CAPACITY: usize = 64;

/// WebSocket upgrade handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_client(socket, state))
}

/// Handle an individual client connection.
///
/// Mints the session id, registers the session, and runs the connection loop
/// until the client goes away. Events pushed through the registry are
/// serialized and forwarded here; the dispatch engine never touches the
/// socket directly.
async fn handle_client(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let session_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(SESSION_CHANNEL_CAPACITY);
    state.session_registry.register(session_id.clone(), tx).await;

    tracing::info!(
        "Client connected: {} (total: {})",
        session_id,
        state.session_registry.count().await
    );

    // The client needs its session id before it can submit a question.
    let connected = ServerEvent::Connected {
        session_id: session_id.clone(),
    };
    if let Err(e) = send_event(&mut ws_tx, &connected).await {
        tracing::warn!("Failed to send connected event to {}: {}", session_id, e);
        state.session_registry.unregister(&session_id).await;
        return;
    }

    loop {
        tokio::select! {
            // Outbound events (dispatch results routed via the registry)
            Some(event) = rx.recv() => {
                if let Err(e) = send_event(&mut ws_tx, &event).await {
                    tracing::warn!("Failed to send event to {}: {}", session_id, e);
                    break;
                }
            }

            // Inbound control frames from the client
            Some(result) = ws_rx.next() => {
                match result {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) => {
                                if let Err(e) = send_event(&mut ws_tx, &ServerEvent::Pong).await {
                                    tracing::warn!("Failed to send pong to {}: {}", session_id, e);
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(
                                    "Ignoring unparseable message from {}: {}",
                                    session_id,
                                    e
                                );
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // Ignore binary, pong, etc.
                    Err(e) => {
                        tracing::warn!("WebSocket error from {}: {}", session_id, e);
                        break;
                    }
                }
            }

            else => break,
        }
    }

    state.session_registry.unregister(&session_id).await;
    tracing::info!(
        "Client disconnected: {} (total: {})",
        session_id,
        state.session_registry.count().await
    );
}

/// Serialize a ServerEvent and send it over the socket.
async fn send_event<S>(
    sink: &mut S,
    event: &ServerEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(event)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
