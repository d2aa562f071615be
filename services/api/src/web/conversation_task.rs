//! services/api/src/web/conversation_task.rs
//!
//! This module contains the worker responsible for a single counselor exchange:
//! prompt, generate, show, persist.

use crate::{
    error::InteractionError,
    web::{
        journal_task::profile_not_found,
        state::{AppState, ProfileAppend, SessionState},
    },
};
use counsel_core::{
    domain::ConversationTurn,
    personas::Persona,
    ports::{AppendOutcome, PortError, PortResult},
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Whether the exchange made it into the user's stored `conversations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    ProfileNotFound,
    Failed(String),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

/// A completed exchange. The turn is already in the session history whatever `save` says.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub turn: ConversationTurn,
    pub save: SaveStatus,
}

/// Sends `user_text` to `counselor` on behalf of the session.
///
/// Validation failures and generation failures leave the session untouched; a
/// generation failure hands `user_text` back so the client can retry it.
pub async fn send_message(
    app_state: &AppState,
    session: &mut SessionState,
    counselor: &str,
    user_text: &str,
    cancel: &CancellationToken,
) -> Result<SentMessage, InteractionError> {
    if user_text.trim().is_empty() {
        return Err(InteractionError::Validation("Please enter a message.".to_string()));
    }
    let persona = Persona::find(counselor).ok_or_else(|| {
        InteractionError::Validation(format!("Unknown counselor: {}", counselor))
    })?;

    let prompt = persona.build_prompt(user_text);

    let llm_start = Instant::now();
    let reply = match generate_reply(app_state, &prompt, cancel).await {
        Ok(reply) => reply,
        Err(PortError::Cancelled) => {
            info!("Generation for {} was cancelled.", persona.name);
            return Err(InteractionError::Cancelled);
        }
        Err(e) => {
            error!("Generation for {} failed: {}", persona.name, e);
            return Err(InteractionError::Generation {
                source: e,
                pending_input: user_text.to_string(),
            });
        }
    };
    info!("⏱️ Generation took: {:?}", llm_start.elapsed());

    session.push_exchange(persona.name, user_text, &reply);

    let turn = ConversationTurn {
        counselor: persona.name.to_string(),
        user_message: user_text.to_string(),
        ai_response: reply,
    };

    let save = match session
        .append_to_profile(app_state.store.as_ref(), ProfileAppend::Conversation(&turn))
        .await
    {
        Ok(AppendOutcome::Appended) => SaveStatus::Saved,
        Ok(AppendOutcome::NotFound) => {
            warn!(
                "No profile found for {:?}; conversation turn was not saved.",
                session.user_email()
            );
            SaveStatus::ProfileNotFound
        }
        Err(e) => {
            error!("Failed to save conversation turn: {}", e);
            SaveStatus::Failed(e.to_string())
        }
    };

    Ok(SentMessage { turn, save })
}

/// Every exchange saved to the user's profile, oldest first.
pub async fn past_conversations(
    app_state: &AppState,
    session: &mut SessionState,
) -> Result<Vec<ConversationTurn>, InteractionError> {
    match session.load_conversations(app_state.store.as_ref()).await {
        Ok(Some(turns)) => Ok(turns),
        Ok(None) => Err(profile_not_found(session)),
        Err(e) => {
            error!("Failed to load saved conversations: {}", e);
            Err(InteractionError::Persistence {
                source: e,
                pending_input: None,
            })
        }
    }
}

/// Calls the generation port, bounded by the configured timeout and the cancel token.
async fn generate_reply(
    app_state: &AppState,
    prompt: &str,
    cancel: &CancellationToken,
) -> PortResult<String> {
    let timeout = app_state.config.generation_timeout;
    tokio::select! {
        _ = cancel.cancelled() => Err(PortError::Cancelled),
        result = tokio::time::timeout(timeout, app_state.generator.generate(prompt)) => {
            let text = result.map_err(|_| PortError::Timeout(timeout.as_secs()))??;
            let text = text.trim();
            if text.is_empty() {
                return Err(PortError::MalformedResponse("Generation returned no text.".to_string()));
            }
            Ok(text.to_string())
        }
    }
}
