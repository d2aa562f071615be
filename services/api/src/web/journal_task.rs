//! services/api/src/web/journal_task.rs
//!
//! Journal entries: score, persist, and read back the mood history.

use crate::{
    error::InteractionError,
    web::state::{AppState, ProfileAppend, SessionState},
};
use counsel_core::{
    domain::MoodLogEntry,
    mood::classify,
    ports::AppendOutcome,
};
use tracing::{error, info, warn};

/// Scores `text` and appends it to the user's `mood_logs`.
pub async fn record_entry(
    app_state: &AppState,
    session: &mut SessionState,
    text: &str,
) -> Result<MoodLogEntry, InteractionError> {
    if text.trim().is_empty() {
        return Err(InteractionError::Validation(
            "Please enter some text before analyzing.".to_string(),
        ));
    }

    let (mood, sentiment) = classify(app_state.sentiment.as_ref(), text);
    let entry = MoodLogEntry {
        mood,
        sentiment,
        entry: text.to_string(),
    };

    match session
        .append_to_profile(app_state.store.as_ref(), ProfileAppend::MoodLog(&entry))
        .await
    {
        Ok(AppendOutcome::Appended) => {
            info!("Mood logged as: {} ({:.4})", entry.mood, entry.sentiment);
            Ok(entry)
        }
        Ok(AppendOutcome::NotFound) => Err(profile_not_found(session)),
        Err(e) => {
            error!("Failed to save journal entry: {}", e);
            Err(InteractionError::Persistence {
                source: e,
                pending_input: Some(text.to_string()),
            })
        }
    }
}

/// The user's whole mood log in storage order, oldest first.
pub async fn history(
    app_state: &AppState,
    session: &mut SessionState,
) -> Result<Vec<MoodLogEntry>, InteractionError> {
    match session.load_mood_logs(app_state.store.as_ref()).await {
        Ok(Some(logs)) => Ok(logs),
        Ok(None) => Err(profile_not_found(session)),
        Err(e) => {
            error!("Failed to load mood history: {}", e);
            Err(InteractionError::Persistence {
                source: e,
                pending_input: None,
            })
        }
    }
}

/// Past journal entries for listing, most recent first.
pub async fn past_entries(
    app_state: &AppState,
    session: &mut SessionState,
) -> Result<Vec<MoodLogEntry>, InteractionError> {
    let mut logs = history(app_state, session).await?;
    logs.reverse();
    Ok(logs)
}

pub(crate) fn profile_not_found(session: &SessionState) -> InteractionError {
    let email = session.user_email().unwrap_or_default().to_string();
    warn!("No profile found for '{}'.", email);
    InteractionError::ProfileNotFound(email)
}
