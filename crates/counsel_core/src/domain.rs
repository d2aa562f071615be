//! crates/counsel_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use std::fmt;
use uuid::Uuid;

// Represents a user's persisted document - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub profile_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A single exchange with a counselor, appended to the user's `conversations`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub counselor: String,
    pub user_message: String,
    pub ai_response: String,
}

/// The three mood buckets a journal entry can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
    Neutral,
}

impl Mood {
    /// The label shown to the user and written to storage.
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy 😊",
            Mood::Sad => "Sad 😢",
            Mood::Neutral => "Neutral 😐",
        }
    }

    /// Parses a stored label. Accepts both the decorated label and the bare name.
    pub fn from_label(label: &str) -> Option<Self> {
        let name = label.split_whitespace().next()?;
        match name.to_ascii_lowercase().as_str() {
            "happy" => Some(Mood::Happy),
            "sad" => Some(Mood::Sad),
            "neutral" => Some(Mood::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scored journal entry, appended to the user's `mood_logs`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodLogEntry {
    pub mood: Mood,
    /// Compound score of `entry`, computed once when the entry was written.
    pub sentiment: f64,
    pub entry: String,
}

/// One line of the in-session conversation display, e.g. `("User", "hi")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub role: String,
    pub message: String,
}

impl ChatLine {
    pub fn new(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_labels_parse_back() {
        for mood in [Mood::Happy, Mood::Sad, Mood::Neutral] {
            assert_eq!(Mood::from_label(mood.label()), Some(mood));
        }
        assert_eq!(Mood::from_label("sad"), Some(Mood::Sad));
        assert_eq!(Mood::from_label("Furious"), None);
        assert_eq!(Mood::from_label(""), None);
    }
}
