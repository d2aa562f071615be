//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-session context that every
//! counselling and journaling handler receives.

use crate::adapters::TimedProfileStore;
use crate::config::Config;
use chrono::{DateTime, Duration, Utc};
use counsel_core::domain::{ChatLine, ConversationTurn, MoodLogEntry};
use counsel_core::ports::{
    AppendOutcome, PortResult, ProfileStore, SentimentScorer, TextGenerationService,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerationService>,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        config: Arc<Config>,
        generator: Arc<dyn TextGenerationService>,
        sentiment: Arc<dyn SentimentScorer>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(Duration::days(
            config.session_max_age_days,
        )));
        let store: Arc<dyn ProfileStore> =
            Arc::new(TimedProfileStore::new(store, config.store_timeout));
        Self {
            store,
            config,
            generator,
            sentiment,
            sessions,
        }
    }
}

//=========================================================================================
// SessionState (Specific to One Logged-in Client)
//=========================================================================================

/// Which of the profile's arrays an append targets.
#[derive(Debug, Clone, Copy)]
pub enum ProfileAppend<'a> {
    Conversation(&'a ConversationTurn),
    MoodLog(&'a MoodLogEntry),
}

/// The session context. Lives only in this process and is never persisted.
#[derive(Debug, Default)]
pub struct SessionState {
    authenticated: bool,
    user_email: Option<String>,
    conversation_history: Vec<ChatLine>,
    /// Cached id of the user's stored document.
    profile_handle: Option<Uuid>,
}

impl SessionState {
    /// An unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A freshly authenticated session with an empty conversation history.
    pub fn login(email: &str) -> Self {
        Self {
            authenticated: true,
            user_email: Some(email.to_string()),
            conversation_history: Vec::new(),
            profile_handle: None,
        }
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
        self.user_email = None;
        self.conversation_history.clear();
        self.profile_handle = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    pub fn conversation_history(&self) -> &[ChatLine] {
        &self.conversation_history
    }

    /// Records a completed exchange for display: the user line, then the counselor line.
    pub fn push_exchange(&mut self, counselor: &str, user_text: &str, reply: &str) {
        self.conversation_history.push(ChatLine::new("User", user_text));
        self.conversation_history.push(ChatLine::new(counselor, reply));
    }

    #[cfg(test)]
    pub fn profile_handle(&self) -> Option<Uuid> {
        self.profile_handle
    }

    /// Returns the cached profile id, looking it up by email on a miss.
    pub async fn resolve_profile(&mut self, store: &dyn ProfileStore) -> PortResult<Option<Uuid>> {
        if let Some(id) = self.profile_handle {
            return Ok(Some(id));
        }
        let Some(email) = self.user_email.as_deref() else {
            return Ok(None);
        };
        let found = store.find_profile_by_email(email).await?.map(|p| p.id);
        self.profile_handle = found;
        Ok(found)
    }

    /// Appends to the user's document.
    ///
    /// A `NotFound` through a cached handle drops the handle and retries once
    /// after a fresh lookup by email.
    pub async fn append_to_profile(
        &mut self,
        store: &dyn ProfileStore,
        item: ProfileAppend<'_>,
    ) -> PortResult<AppendOutcome> {
        let was_cached = self.profile_handle.is_some();
        let Some(id) = self.resolve_profile(store).await? else {
            return Ok(AppendOutcome::NotFound);
        };

        match append(store, id, item).await? {
            AppendOutcome::Appended => Ok(AppendOutcome::Appended),
            AppendOutcome::NotFound => {
                self.profile_handle = None;
                if !was_cached {
                    return Ok(AppendOutcome::NotFound);
                }
                warn!("Cached profile handle {} is stale, looking the profile up again.", id);
                match self.resolve_profile(store).await? {
                    Some(fresh) => append(store, fresh, item).await,
                    None => Ok(AppendOutcome::NotFound),
                }
            }
        }
    }

    /// Reads the user's mood log, oldest first, with the same stale-handle fallback.
    pub async fn load_mood_logs(
        &mut self,
        store: &dyn ProfileStore,
    ) -> PortResult<Option<Vec<MoodLogEntry>>> {
        let was_cached = self.profile_handle.is_some();
        let Some(id) = self.resolve_profile(store).await? else {
            return Ok(None);
        };
        if let Some(logs) = store.get_mood_logs(id).await? {
            return Ok(Some(logs));
        }
        self.profile_handle = None;
        if !was_cached {
            return Ok(None);
        }
        match self.resolve_profile(store).await? {
            Some(fresh) => store.get_mood_logs(fresh).await,
            None => Ok(None),
        }
    }

    /// Reads the user's saved conversations, oldest first.
    pub async fn load_conversations(
        &mut self,
        store: &dyn ProfileStore,
    ) -> PortResult<Option<Vec<ConversationTurn>>> {
        let was_cached = self.profile_handle.is_some();
        let Some(id) = self.resolve_profile(store).await? else {
            return Ok(None);
        };
        if let Some(turns) = store.get_conversations(id).await? {
            return Ok(Some(turns));
        }
        self.profile_handle = None;
        if !was_cached {
            return Ok(None);
        }
        match self.resolve_profile(store).await? {
            Some(fresh) => store.get_conversations(fresh).await,
            None => Ok(None),
        }
    }
}

async fn append(
    store: &dyn ProfileStore,
    id: Uuid,
    item: ProfileAppend<'_>,
) -> PortResult<AppendOutcome> {
    match item {
        ProfileAppend::Conversation(turn) => store.append_conversation(id, turn).await,
        ProfileAppend::MoodLog(entry) => store.append_mood_log(id, entry).await,
    }
}

//=========================================================================================
// Session Registry
//=========================================================================================

/// A live session: its state plus the token that cancels work started on its behalf.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: String,
    pub state: Arc<Mutex<SessionState>>,
    pub shutdown: CancellationToken,
    pub expires_at: DateTime<Utc>,
}

impl SessionHandle {
    /// Waits for the session state, giving up if `cancel` fires first.
    pub async fn lock(&self, cancel: &CancellationToken) -> Option<MutexGuard<'_, SessionState>> {
        tokio::select! {
            _ = cancel.cancelled() => None,
            state = self.state.lock() => Some(state),
        }
    }
}

/// All logged-in sessions in this process, keyed by the session cookie value.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    max_age: Duration,
}

impl SessionRegistry {
    pub fn new(max_age: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Creates and registers a new authenticated session for `email`.
    /// Sessions that have expired since the last login are dropped first.
    pub async fn login(&self, email: &str) -> SessionHandle {
        let now = Utc::now();
        let handle = SessionHandle {
            id: Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(SessionState::login(email))),
            shutdown: CancellationToken::new(),
            expires_at: now + self.max_age,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| {
            let live = existing.expires_at > now;
            if !live {
                existing.shutdown.cancel();
            }
            live
        });
        if sessions.len() < before {
            info!("Dropped {} expired sessions", before - sessions.len());
        }
        sessions.insert(handle.id.clone(), handle.clone());
        info!("Session started for {}", email);
        handle
    }

    /// Returns the session if it exists and has not expired. Expired sessions are torn down.
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        if handle.expires_at <= Utc::now() {
            self.logout(session_id).await;
            return None;
        }
        Some(handle)
    }

    /// Tears a session down: cancels in-flight work, clears its state, forgets it.
    pub async fn logout(&self, session_id: &str) -> bool {
        let Some(handle) = self.sessions.write().await.remove(session_id) else {
            return false;
        };
        handle.shutdown.cancel();
        let mut state = handle.state.lock().await;
        if let Some(email) = state.user_email() {
            info!("Session ended for {}", email);
        }
        state.logout();
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryProfileStore;
    use counsel_core::domain::Mood;

    fn entry(text: &str) -> MoodLogEntry {
        MoodLogEntry {
            mood: Mood::Neutral,
            sentiment: 0.0,
            entry: text.to_string(),
        }
    }

    #[test]
    fn login_and_logout_reset_everything() {
        let mut state = SessionState::login("a@x.com");
        assert!(state.is_authenticated());
        assert_eq!(state.user_email(), Some("a@x.com"));
        assert!(state.conversation_history().is_empty());

        state.push_exchange("CBT Therapist", "hi", "hello");
        assert_eq!(
            state.conversation_history(),
            &[ChatLine::new("User", "hi"), ChatLine::new("CBT Therapist", "hello")]
        );

        state.logout();
        assert!(!state.is_authenticated());
        assert_eq!(state.user_email(), None);
        assert!(state.conversation_history().is_empty());
        assert_eq!(state.profile_handle(), None);
    }

    #[tokio::test]
    async fn registry_logout_cancels_and_forgets() {
        let registry = SessionRegistry::new(Duration::days(1));
        let handle = registry.login("a@x.com").await;
        assert!(registry.get(&handle.id).await.is_some());

        assert!(registry.logout(&handle.id).await);
        assert!(handle.shutdown.is_cancelled());
        assert!(!handle.state.lock().await.is_authenticated());
        assert!(registry.get(&handle.id).await.is_none());
        assert!(!registry.logout(&handle.id).await);
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped_on_login() {
        let registry = SessionRegistry::new(Duration::seconds(-1));
        let first = registry.login("a@x.com").await;
        for _ in 0..5 {
            registry.login("a@x.com").await;
        }
        assert_eq!(registry.len().await, 1);
        assert!(first.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn live_sessions_survive_other_logins() {
        let registry = SessionRegistry::new(Duration::days(1));
        let first = registry.login("a@x.com").await;
        registry.login("b@x.com").await;
        assert_eq!(registry.len().await, 2);
        assert!(!first.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn lock_gives_up_when_cancelled() {
        let registry = SessionRegistry::new(Duration::days(1));
        let handle = registry.login("a@x.com").await;
        let _held = handle.state.lock().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(handle.lock(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_not_returned() {
        let registry = SessionRegistry::new(Duration::seconds(-1));
        let handle = registry.login("a@x.com").await;
        assert!(registry.get(&handle.id).await.is_none());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn stale_handle_falls_back_to_lookup_by_email() {
        let store = InMemoryProfileStore::new();
        let first = store.create_profile("a@x.com", "hash").await.unwrap();

        let mut state = SessionState::login("a@x.com");
        let outcome = state
            .append_to_profile(&store, ProfileAppend::MoodLog(&entry("one")))
            .await
            .unwrap();
        assert_eq!(outcome, AppendOutcome::Appended);
        assert_eq!(state.profile_handle(), Some(first.id));

        // The document is recreated under a new id behind the session's back.
        store.delete_profile("a@x.com").await;
        let second = store.create_profile("a@x.com", "hash").await.unwrap();

        let outcome = state
            .append_to_profile(&store, ProfileAppend::MoodLog(&entry("two")))
            .await
            .unwrap();
        assert_eq!(outcome, AppendOutcome::Appended);
        assert_eq!(state.profile_handle(), Some(second.id));

        let logs = state.load_mood_logs(&store).await.unwrap().unwrap();
        assert_eq!(logs, vec![entry("two")]);
    }

    #[tokio::test]
    async fn missing_profile_reports_not_found() {
        let store = InMemoryProfileStore::new();
        let mut state = SessionState::login("ghost@x.com");
        let outcome = state
            .append_to_profile(&store, ProfileAppend::MoodLog(&entry("hello")))
            .await
            .unwrap();
        assert_eq!(outcome, AppendOutcome::NotFound);
        assert!(state.load_mood_logs(&store).await.unwrap().is_none());
    }
}
