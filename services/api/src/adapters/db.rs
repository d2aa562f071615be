//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ProfileStore` port from the `core` crate. Each user is one row whose
//! `conversations` and `mood_logs` columns are JSONB arrays, appended in place.

use async_trait::async_trait;
use counsel_core::domain::{ConversationTurn, MoodLogEntry, UserCredentials, UserProfile};
use counsel_core::ports::{AppendOutcome, PortError, PortResult, ProfileStore};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::adapters::documents::{ConversationRecord, MoodLogRecord};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ProfileStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    email: String,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            profile_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct MoodLogsRecord {
    mood_logs: Json<Vec<MoodLogRecord>>,
}

#[derive(FromRow)]
struct ConversationsRecord {
    conversations: Json<Vec<ConversationRecord>>,
}

fn append_outcome(rows_affected: u64) -> AppendOutcome {
    if rows_affected == 0 {
        AppendOutcome::NotFound
    } else {
        AppendOutcome::Appended
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbAdapter {
    async fn create_profile(&self, email: &str, hashed_password: &str) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("A profile for {} already exists", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        let record = sqlx::query_as::<_, ProfileRecord>("SELECT id, email FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn append_conversation(
        &self,
        profile_id: Uuid,
        turn: &ConversationTurn,
    ) -> PortResult<AppendOutcome> {
        let result = sqlx::query(
            "UPDATE users SET conversations = conversations || jsonb_build_array($1::jsonb) WHERE id = $2",
        )
        .bind(Json(ConversationRecord::from_domain(turn)))
        .bind(profile_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(append_outcome(result.rows_affected()))
    }

    async fn append_mood_log(
        &self,
        profile_id: Uuid,
        entry: &MoodLogEntry,
    ) -> PortResult<AppendOutcome> {
        let result = sqlx::query(
            "UPDATE users SET mood_logs = mood_logs || jsonb_build_array($1::jsonb) WHERE id = $2",
        )
        .bind(Json(MoodLogRecord::from_domain(entry)))
        .bind(profile_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(append_outcome(result.rows_affected()))
    }

    async fn get_mood_logs(&self, profile_id: Uuid) -> PortResult<Option<Vec<MoodLogEntry>>> {
        let record = sqlx::query_as::<_, MoodLogsRecord>("SELECT mood_logs FROM users WHERE id = $1")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(record.map(|r| r.mood_logs.0.into_iter().map(MoodLogRecord::to_domain).collect()))
    }

    async fn get_conversations(
        &self,
        profile_id: Uuid,
    ) -> PortResult<Option<Vec<ConversationTurn>>> {
        let record = sqlx::query_as::<_, ConversationsRecord>(
            "SELECT conversations FROM users WHERE id = $1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(|r| {
            r.conversations
                .0
                .into_iter()
                .map(ConversationRecord::to_domain)
                .collect()
        }))
    }
}
