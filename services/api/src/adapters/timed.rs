//! services/api/src/adapters/timed.rs
//!
//! Wraps any `ProfileStore` so that no single call can hang an interaction.
//! An expired call surfaces as `PortError::Timeout`.

use async_trait::async_trait;
use counsel_core::domain::{ConversationTurn, MoodLogEntry, UserCredentials, UserProfile};
use counsel_core::ports::{AppendOutcome, PortError, PortResult, ProfileStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub struct TimedProfileStore {
    inner: Arc<dyn ProfileStore>,
    timeout: Duration,
}

impl TimedProfileStore {
    pub fn new(inner: Arc<dyn ProfileStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = PortResult<T>>,
    ) -> PortResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Profile store {} timed out after {:?}", operation, self.timeout);
                Err(PortError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl ProfileStore for TimedProfileStore {
    async fn create_profile(&self, email: &str, hashed_password: &str) -> PortResult<UserProfile> {
        self.bounded("create_profile", self.inner.create_profile(email, hashed_password))
            .await
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.bounded("get_credentials_by_email", self.inner.get_credentials_by_email(email))
            .await
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        self.bounded("find_profile_by_email", self.inner.find_profile_by_email(email))
            .await
    }

    async fn append_conversation(
        &self,
        profile_id: Uuid,
        turn: &ConversationTurn,
    ) -> PortResult<AppendOutcome> {
        self.bounded("append_conversation", self.inner.append_conversation(profile_id, turn))
            .await
    }

    async fn append_mood_log(
        &self,
        profile_id: Uuid,
        entry: &MoodLogEntry,
    ) -> PortResult<AppendOutcome> {
        self.bounded("append_mood_log", self.inner.append_mood_log(profile_id, entry))
            .await
    }

    async fn get_mood_logs(&self, profile_id: Uuid) -> PortResult<Option<Vec<MoodLogEntry>>> {
        self.bounded("get_mood_logs", self.inner.get_mood_logs(profile_id))
            .await
    }

    async fn get_conversations(
        &self,
        profile_id: Uuid,
    ) -> PortResult<Option<Vec<ConversationTurn>>> {
        self.bounded("get_conversations", self.inner.get_conversations(profile_id))
            .await
    }
}
