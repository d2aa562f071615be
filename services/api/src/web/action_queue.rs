//! services/api/src/web/action_queue.rs
//!
//! Runs the actions of one connection in the order they arrived. A single worker
//! task drains the queue, so an action finishes before the next one starts.
//! Replies go out through the connection's outbox.

use crate::{
    error::InteractionError,
    web::{
        conversation_task::send_message,
        journal_task::{history, record_entry},
        protocol::{ClientMessage, ServerMessage},
        rest::build_trend_response,
        state::{AppState, SessionHandle},
    },
};
use counsel_core::personas::Persona;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

pub struct ActionQueue {
    actions: mpsc::UnboundedSender<ClientMessage>,
    /// Token of the action the worker is running now.
    current: Arc<Mutex<CancellationToken>>,
    /// Parent of every action token; cancelled when the connection goes away.
    closed: CancellationToken,
}

impl ActionQueue {
    /// Starts the worker for `session`. Replies are sent to `outbox`.
    pub fn spawn(app_state: Arc<AppState>, session: SessionHandle, outbox: Outbox) -> Self {
        let (actions, mut inbox) = mpsc::unbounded_channel::<ClientMessage>();
        let closed = session.shutdown.child_token();
        let current = Arc::new(Mutex::new(closed.child_token()));

        let worker_closed = closed.clone();
        let worker_current = current.clone();
        tokio::spawn(async move {
            while let Some(action) = inbox.recv().await {
                if worker_closed.is_cancelled() {
                    break;
                }
                let token = worker_closed.child_token();
                *worker_current.lock().await = token.clone();

                let reply = run_action(&app_state, &session, &outbox, action, &token).await;
                if outbox.send(reply).is_err() {
                    warn!("Outbox closed; stopping the action worker.");
                    break;
                }
            }
            info!("Action worker finished.");
        });

        Self {
            actions,
            current,
            closed,
        }
    }

    /// Queues `action` behind everything already submitted.
    /// Returns `false` once the worker has stopped.
    pub fn submit(&self, action: ClientMessage) -> bool {
        self.actions.send(action).is_ok()
    }

    /// Abandons the action that is running now. Queued actions still run.
    pub async fn cancel_current(&self) {
        self.current.lock().await.cancel();
    }

    /// Abandons the running action and everything still queued.
    pub fn close(&self) {
        self.closed.cancel();
    }
}

/// Runs one action against the session and produces the message to send back.
async fn run_action(
    app_state: &AppState,
    session: &SessionHandle,
    outbox: &Outbox,
    action: ClientMessage,
    token: &CancellationToken,
) -> ServerMessage {
    let Some(mut state) = session.lock(token).await else {
        return interaction_error(InteractionError::Cancelled);
    };

    let result = match action {
        ClientMessage::SendMessage { counselor, text } => {
            // Rejected input never reaches the "thinking" state.
            if !text.trim().is_empty() && Persona::find(&counselor).is_some() {
                let _ = outbox.send(ServerMessage::GenerationStarted {
                    counselor: counselor.clone(),
                });
            }
            send_message(app_state, &mut state, &counselor, &text, token)
                .await
                .map(|sent| ServerMessage::ConversationTurn {
                    saved: sent.save.is_saved(),
                    counselor: sent.turn.counselor,
                    user_message: sent.turn.user_message,
                    ai_response: sent.turn.ai_response,
                })
        }
        // Not cancellable once the session is held, so an issued append is never abandoned.
        ClientMessage::RecordEntry { text } => record_entry(app_state, &mut state, &text)
            .await
            .map(|entry| ServerMessage::MoodLogged {
                mood: entry.mood.label().to_string(),
                sentiment: entry.sentiment,
            }),
        ClientMessage::RequestTrend => {
            tokio::select! {
                _ = token.cancelled() => Err(InteractionError::Cancelled),
                result = history(app_state, &mut state) => result.map(|logs| {
                    let trend = build_trend_response(&logs);
                    ServerMessage::Trend { svg: trend.svg, message: trend.message }
                }),
            }
        }
        ClientMessage::Cancel => Err(InteractionError::Cancelled),
    };

    result.unwrap_or_else(interaction_error)
}

fn interaction_error(e: InteractionError) -> ServerMessage {
    match e {
        InteractionError::Validation(message) => ServerMessage::Warning { message },
        other => {
            let body = other.to_body();
            ServerMessage::Error {
                kind: body.kind,
                message: body.message,
                retryable: body.retryable,
                pending_input: body.pending_input,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_core::ports::PortError;

    #[test]
    fn validation_becomes_a_warning() {
        let msg = interaction_error(InteractionError::Validation("Please enter a message.".into()));
        assert!(matches!(msg, ServerMessage::Warning { message } if message == "Please enter a message."));
    }

    #[test]
    fn generation_failure_offers_the_text_back() {
        let msg = interaction_error(InteractionError::Generation {
            source: PortError::Unavailable("503".into()),
            pending_input: "I feel stuck".into(),
        });
        match msg {
            ServerMessage::Error { kind, retryable, pending_input, .. } => {
                assert_eq!(kind, "generation_failed");
                assert!(retryable);
                assert_eq!(pending_input.as_deref(), Some("I feel stuck"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
