//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! The read loop only parses frames; actions go to the connection's `ActionQueue`
//! and replies come back through an outbox drained by a writer task.

use crate::web::{
    action_queue::ActionQueue,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, SessionHandle},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use counsel_core::personas::Persona;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, session))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, session: SessionHandle) {
    let email = session
        .state
        .lock()
        .await
        .user_email()
        .unwrap_or_default()
        .to_string();
    info!("New WebSocket connection established for user: {}", email);

    let (sender, mut receiver) = socket.split();
    let (outbox, outgoing) = mpsc::unbounded_channel::<ServerMessage>();
    let writer = tokio::spawn(write_outgoing(sender, outgoing));

    let ready = ServerMessage::Ready {
        email,
        counselors: Persona::names().map(str::to_string).collect(),
    };
    if outbox.send(ready).is_err() {
        error!("Failed to queue ready message.");
        return;
    }

    let queue = ActionQueue::spawn(app_state, session.clone(), outbox);

    loop {
        tokio::select! {
            _ = session.shutdown.cancelled() => {
                info!("Session ended; closing WebSocket.");
                break;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_text_message(text.as_str(), &queue).await;
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            }
        }
    }

    // --- Cleanup ---
    // The writer stops once the worker has dropped the last outbox handle.
    queue.close();
    drop(queue);
    if let Err(e) = writer.await {
        error!("WebSocket writer task failed: {}", e);
    }
    info!("WebSocket connection closed.");
}

/// Helper function to dispatch the different `ClientMessage` variants.
async fn handle_text_message(text: &str, queue: &ActionQueue) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return;
        }
    };

    if let ClientMessage::Cancel = client_msg {
        info!("Cancel message received.");
        queue.cancel_current().await;
        return;
    }

    if !queue.submit(client_msg) {
        warn!("Action worker has stopped; dropping message.");
    }
}

/// Sends every queued server message, then closes the socket.
async fn write_outgoing(
    mut sender: SplitSink<WebSocket, Message>,
    mut outgoing: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = outgoing.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            warn!("Failed to send reply. Client may have disconnected.");
            return;
        }
    }
    let _ = sender.send(Message::Close(None)).await;
}
