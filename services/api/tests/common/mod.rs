//! Fakes shared by the integration tests.
#![allow(dead_code)]

use api_lib::{adapters::InMemoryProfileStore, config::Config, web::state::AppState};
use async_trait::async_trait;
use counsel_core::{
    domain::{ConversationTurn, MoodLogEntry, UserCredentials, UserProfile},
    ports::{
        AppendOutcome, PortError, PortResult, ProfileStore, SentimentScorer,
        TextGenerationService,
    },
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Replies from a script and records every prompt it was given.
pub struct ScriptedGenerator {
    pub replies: Mutex<Vec<PortResult<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn with(replies: Vec<PortResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerationService for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(PortError::Unavailable("script exhausted".to_string())))
    }
}

/// Never replies.
pub struct StalledGenerator;

#[async_trait]
impl TextGenerationService for StalledGenerator {
    async fn generate(&self, _prompt: &str) -> PortResult<String> {
        std::future::pending().await
    }
}

pub struct TableScorer(pub HashMap<&'static str, f64>);

impl SentimentScorer for TableScorer {
    fn compound(&self, text: &str) -> f64 {
        self.0.get(text).copied().unwrap_or(0.0)
    }
}

/// Scores for the journal entries the tests use. Anything else is neutral.
pub fn journal_scorer() -> TableScorer {
    TableScorer(HashMap::from([
        ("Today was amazing, I got a promotion!", 0.8516),
        ("ok", 0.0),
        ("terrible day", -0.4767),
    ]))
}

/// An in-memory store whose mood-log appends take `append_delay` to land.
pub struct SlowStore {
    pub inner: InMemoryProfileStore,
    pub append_delay: Duration,
}

impl SlowStore {
    pub fn new(append_delay: Duration) -> Self {
        Self {
            inner: InMemoryProfileStore::new(),
            append_delay,
        }
    }
}

#[async_trait]
impl ProfileStore for SlowStore {
    async fn create_profile(&self, email: &str, hashed_password: &str) -> PortResult<UserProfile> {
        self.inner.create_profile(email, hashed_password).await
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.inner.get_credentials_by_email(email).await
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        self.inner.find_profile_by_email(email).await
    }

    async fn append_conversation(
        &self,
        profile_id: Uuid,
        turn: &ConversationTurn,
    ) -> PortResult<AppendOutcome> {
        self.inner.append_conversation(profile_id, turn).await
    }

    async fn append_mood_log(
        &self,
        profile_id: Uuid,
        entry: &MoodLogEntry,
    ) -> PortResult<AppendOutcome> {
        tokio::time::sleep(self.append_delay).await;
        self.inner.append_mood_log(profile_id, entry).await
    }

    async fn get_mood_logs(&self, profile_id: Uuid) -> PortResult<Option<Vec<MoodLogEntry>>> {
        self.inner.get_mood_logs(profile_id).await
    }

    async fn get_conversations(
        &self,
        profile_id: Uuid,
    ) -> PortResult<Option<Vec<ConversationTurn>>> {
        self.inner.get_conversations(profile_id).await
    }
}

pub fn app_state(
    store: Arc<dyn ProfileStore>,
    generator: Arc<dyn TextGenerationService>,
    config: Config,
) -> AppState {
    AppState::new(store, Arc::new(config), generator, Arc::new(journal_scorer()))
}
