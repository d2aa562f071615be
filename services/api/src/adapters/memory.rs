//! services/api/src/adapters/memory.rs
//!
//! A process-local `ProfileStore` used when no `DATABASE_URL` is configured.
//! Array elements are kept as serialized JSON so reads go through the same
//! record mapping as the database adapter.

use async_trait::async_trait;
use counsel_core::domain::{ConversationTurn, MoodLogEntry, UserCredentials, UserProfile};
use counsel_core::ports::{AppendOutcome, PortError, PortResult, ProfileStore};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::adapters::documents::{ConversationRecord, MoodLogRecord};

struct ProfileDocument {
    email: String,
    password_hash: String,
    conversations: Vec<Value>,
    mood_logs: Vec<Value>,
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    documents: RwLock<HashMap<Uuid, ProfileDocument>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a profile document. Returns whether one existed.
    pub async fn delete_profile(&self, email: &str) -> bool {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, doc| doc.email != email);
        documents.len() != before
    }
}

fn to_value<T: serde::Serialize>(record: &T) -> PortResult<Value> {
    serde_json::to_value(record).map_err(|e| PortError::Unexpected(e.to_string()))
}

fn from_values<T: serde::de::DeserializeOwned>(values: &[Value]) -> PortResult<Vec<T>> {
    values
        .iter()
        .map(|v| serde_json::from_value(v.clone()).map_err(|e| PortError::Unexpected(e.to_string())))
        .collect()
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn create_profile(&self, email: &str, hashed_password: &str) -> PortResult<UserProfile> {
        let mut documents = self.documents.write().await;
        if documents.values().any(|doc| doc.email == email) {
            return Err(PortError::Conflict(format!("A profile for {} already exists", email)));
        }
        let id = Uuid::new_v4();
        documents.insert(
            id,
            ProfileDocument {
                email: email.to_string(),
                password_hash: hashed_password.to_string(),
                conversations: Vec::new(),
                mood_logs: Vec::new(),
            },
        );
        Ok(UserProfile {
            id,
            email: email.to_string(),
        })
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|(_, doc)| doc.email == email)
            .map(|(id, doc)| UserCredentials {
                profile_id: *id,
                email: doc.email.clone(),
                hashed_password: doc.password_hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|(_, doc)| doc.email == email)
            .map(|(id, doc)| UserProfile {
                id: *id,
                email: doc.email.clone(),
            }))
    }

    async fn append_conversation(
        &self,
        profile_id: Uuid,
        turn: &ConversationTurn,
    ) -> PortResult<AppendOutcome> {
        let value = to_value(&ConversationRecord::from_domain(turn))?;
        let mut documents = self.documents.write().await;
        match documents.get_mut(&profile_id) {
            Some(doc) => {
                doc.conversations.push(value);
                Ok(AppendOutcome::Appended)
            }
            None => Ok(AppendOutcome::NotFound),
        }
    }

    async fn append_mood_log(
        &self,
        profile_id: Uuid,
        entry: &MoodLogEntry,
    ) -> PortResult<AppendOutcome> {
        let value = to_value(&MoodLogRecord::from_domain(entry))?;
        let mut documents = self.documents.write().await;
        match documents.get_mut(&profile_id) {
            Some(doc) => {
                doc.mood_logs.push(value);
                Ok(AppendOutcome::Appended)
            }
            None => Ok(AppendOutcome::NotFound),
        }
    }

    async fn get_mood_logs(&self, profile_id: Uuid) -> PortResult<Option<Vec<MoodLogEntry>>> {
        let documents = self.documents.read().await;
        match documents.get(&profile_id) {
            Some(doc) => {
                let records: Vec<MoodLogRecord> = from_values(&doc.mood_logs)?;
                Ok(Some(records.into_iter().map(MoodLogRecord::to_domain).collect()))
            }
            None => Ok(None),
        }
    }

    async fn get_conversations(
        &self,
        profile_id: Uuid,
    ) -> PortResult<Option<Vec<ConversationTurn>>> {
        let documents = self.documents.read().await;
        match documents.get(&profile_id) {
            Some(doc) => {
                let records: Vec<ConversationRecord> = from_values(&doc.conversations)?;
                Ok(Some(records.into_iter().map(ConversationRecord::to_domain).collect()))
            }
            None => Ok(None),
        }
    }
}
