use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use super::AppState;
use crate::store::{ConversationStore, StoreEvent};

/// GET `/ws/events`: upgrades to a WebSocket that streams store changes.
pub async fn ws_events_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state.store))
}

/// Client connection as seen by [`forward_events`].
#[async_trait]
trait EventSocket: Send {
    /// Resolves once the client has gone away. Must be cancel-safe.
    async fn closed(&mut self);

    /// Sends one text frame. Returns `false` once the client is gone.
    async fn send_text(&mut self, text: String) -> bool;
}

#[async_trait]
impl EventSocket for WebSocket {
    async fn closed(&mut self) {
        loop {
            match self.recv().await {
                Some(Ok(Message::Close(_))) | None => return,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {e}");
                    return;
                }
            }
        }
    }

    async fn send_text(&mut self, text: String) -> bool {
        self.send(Message::Text(text.into())).await.is_ok()
    }
}

async fn handle_socket(mut socket: WebSocket, store: ConversationStore) {
    info!("WebSocket client connected");
    forward_events(&mut socket, store.subscribe()).await;
    info!("WebSocket client disconnected");
}

/// Forwards every [`StoreEvent`] to the client as JSON until either side closes.
///
/// Events are internally tagged, e.g.
/// `{ "type": "response_completed", "conversation_id": "...", "message": {...}, "title": "..." }`.
/// Anything the client sends besides a close frame is ignored.
async fn forward_events<S: EventSocket>(
    socket: &mut S,
    mut events: broadcast::Receiver<StoreEvent>,
) {
    loop {
        tokio::select! {
            () = socket.closed() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if !send_event(socket, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client fell behind, {skipped} events skipped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Serializes and sends one event. Returns `false` once the socket is gone.
async fn send_event<S: EventSocket>(socket: &mut S, event: &StoreEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send_text(json).await,
        Err(e) => {
            error!("Failed to serialize store event: {e}");
            true
        }
    }
}
