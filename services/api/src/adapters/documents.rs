//! services/api/src/adapters/documents.rs
//!
//! The stored shape of the elements of a profile's `conversations` and
//! `mood_logs` arrays. Both store adapters read and write these records.

use counsel_core::domain::{ConversationTurn, Mood, MoodLogEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub counselor: String,
    pub user_message: String,
    pub ai_response: String,
}

impl ConversationRecord {
    pub fn from_domain(turn: &ConversationTurn) -> Self {
        Self {
            counselor: turn.counselor.clone(),
            user_message: turn.user_message.clone(),
            ai_response: turn.ai_response.clone(),
        }
    }

    pub fn to_domain(self) -> ConversationTurn {
        ConversationTurn {
            counselor: self.counselor,
            user_message: self.user_message,
            ai_response: self.ai_response,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodLogRecord {
    /// Display label, e.g. "Happy 😊".
    pub mood: String,
    pub sentiment: f64,
    pub entry: String,
}

impl MoodLogRecord {
    pub fn from_domain(entry: &MoodLogEntry) -> Self {
        Self {
            mood: entry.mood.label().to_string(),
            sentiment: entry.sentiment,
            entry: entry.entry.clone(),
        }
    }

    /// An unreadable label falls back to the mood implied by the stored score.
    pub fn to_domain(self) -> MoodLogEntry {
        let mood = Mood::from_label(&self.mood).unwrap_or_else(|| Mood::from_score(self.sentiment));
        MoodLogEntry {
            mood,
            sentiment: self.sentiment,
            entry: self.entry,
        }
    }
}
