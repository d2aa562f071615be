//! crates/counsel_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the document store, the generation API and the sentiment model.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ConversationTurn, MoodLogEntry, UserCredentials, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    Conflict(String),
    /// The service could not be reached or refused the request.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The service answered, but not with anything usable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Timed out after {0}s")]
    Timeout(u64),
    #[error("Cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Result of appending to one of a profile's arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// No document matched the given handle; nothing was written.
    NotFound,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The per-user document store. Each profile owns two append-only arrays,
/// `conversations` and `mood_logs`, ordered by insertion.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    // --- Auth Methods ---
    async fn create_profile(&self, email: &str, hashed_password: &str) -> PortResult<UserProfile>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Document Lookup ---
    /// Zero-or-one lookup by email.
    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>>;

    // --- Append-only Arrays ---
    async fn append_conversation(
        &self,
        profile_id: Uuid,
        turn: &ConversationTurn,
    ) -> PortResult<AppendOutcome>;

    async fn append_mood_log(
        &self,
        profile_id: Uuid,
        entry: &MoodLogEntry,
    ) -> PortResult<AppendOutcome>;

    /// Returns `None` when the profile does not exist, otherwise the log oldest first.
    async fn get_mood_logs(&self, profile_id: Uuid) -> PortResult<Option<Vec<MoodLogEntry>>>;

    async fn get_conversations(
        &self,
        profile_id: Uuid,
    ) -> PortResult<Option<Vec<ConversationTurn>>>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Generates a reply to a single, self-contained prompt.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

/// A local lexicon-based scorer. Cheap enough to call inline.
pub trait SentimentScorer: Send + Sync {
    /// Compound polarity of `text` in `[-1, 1]`.
    fn compound(&self, text: &str) -> f64;
}
