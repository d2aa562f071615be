//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::{InteractionError, InteractionErrorBody},
    web::{
        auth::{AuthResponse, LoginRequest, SignupRequest},
        conversation_task::{past_conversations, send_message, SaveStatus},
        journal_task::{history, past_entries, record_entry},
        state::{AppState, SessionHandle},
        trend::{render_trend, trend_points, TrendChart},
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use counsel_core::{
    domain::{ChatLine, ConversationTurn, MoodLogEntry},
    personas::PERSONAS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        list_counselors_handler,
        session_handler,
        chat_handler,
        list_conversations_handler,
        record_entry_handler,
        list_entries_handler,
        trend_handler,
    ),
    components(
        schemas(
            SignupRequest, LoginRequest, AuthResponse, CounselorResponse, ChatLineResponse,
            SessionResponse, ChatRequest, ChatResponse, ConversationTurnResponse, JournalRequest, MoodLogResponse,
            TrendPointResponse, TrendResponse, InteractionErrorBody
        )
    ),
    tags(
        (name = "AI Counselor API", description = "Counselor chat, mood journaling and mood trends.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CounselorResponse {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatLineResponse {
    pub role: String,
    pub message: String,
}

impl From<&ChatLine> for ChatLineResponse {
    fn from(line: &ChatLine) -> Self {
        Self {
            role: line.role.clone(),
            message: line.message.clone(),
        }
    }
}

/// The logged-in user and the conversation shown in this session.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub email: Option<String>,
    pub conversation_history: Vec<ChatLineResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub counselor: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub counselor: String,
    pub user_message: String,
    pub ai_response: String,
    /// False when the exchange is shown but could not be stored.
    pub saved: bool,
    pub save_warning: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationTurnResponse {
    pub counselor: String,
    pub user_message: String,
    pub ai_response: String,
}

impl From<&ConversationTurn> for ConversationTurnResponse {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            counselor: turn.counselor.clone(),
            user_message: turn.user_message.clone(),
            ai_response: turn.ai_response.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct JournalRequest {
    pub entry: String,
}

#[derive(Serialize, ToSchema)]
pub struct MoodLogResponse {
    pub mood: String,
    pub sentiment: f64,
    pub entry: String,
}

impl From<&MoodLogEntry> for MoodLogResponse {
    fn from(entry: &MoodLogEntry) -> Self {
        Self {
            mood: entry.mood.label().to_string(),
            sentiment: entry.sentiment,
            entry: entry.entry.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TrendPointResponse {
    pub entry: u32,
    pub sentiment: f64,
}

/// Either `svg` is set, or `message` explains why there is no chart.
#[derive(Serialize, ToSchema)]
pub struct TrendResponse {
    pub points: Vec<TrendPointResponse>,
    pub svg: Option<String>,
    pub message: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the counselors a user can talk to.
#[utoipa::path(
    get,
    path = "/counselors",
    responses((status = 200, description = "Available counselors", body = [CounselorResponse]))
)]
pub async fn list_counselors_handler() -> Json<Vec<CounselorResponse>> {
    Json(
        PERSONAS
            .iter()
            .map(|p| CounselorResponse {
                name: p.name.to_string(),
                description: p.description.to_string(),
            })
            .collect(),
    )
}

/// The current session's user and conversation history.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn session_handler(Extension(session): Extension<SessionHandle>) -> Json<SessionResponse> {
    let state = session.state.lock().await;
    Json(SessionResponse {
        email: state.user_email().map(str::to_string),
        conversation_history: state.conversation_history().iter().map(Into::into).collect(),
    })
}

/// Send a message to a counselor.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Counselor replied", body = ChatResponse),
        (status = 401, description = "Not logged in"),
        (status = 422, description = "Empty message or unknown counselor", body = InteractionErrorBody),
        (status = 502, description = "Generation failed; retry with pending_input", body = InteractionErrorBody),
        (status = 504, description = "Generation timed out; retry with pending_input", body = InteractionErrorBody)
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, InteractionError> {
    let cancel = session.shutdown.child_token();
    let mut state = session.lock(&cancel).await.ok_or(InteractionError::Cancelled)?;
    let sent = send_message(&app_state, &mut state, &req.counselor, &req.message, &cancel).await?;

    let save_warning = match &sent.save {
        SaveStatus::Saved => None,
        SaveStatus::ProfileNotFound => Some("Profile not found; this conversation was not saved.".to_string()),
        SaveStatus::Failed(reason) => Some(format!("This conversation was not saved: {}", reason)),
    };

    Ok(Json(ChatResponse {
        counselor: sent.turn.counselor,
        user_message: sent.turn.user_message,
        ai_response: sent.turn.ai_response,
        saved: sent.save.is_saved(),
        save_warning,
    }))
}

/// Every conversation turn saved to the user's profile, oldest first.
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "Saved conversation turns, oldest first", body = [ConversationTurnResponse]),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Profile not found", body = InteractionErrorBody),
        (status = 503, description = "Loading failed", body = InteractionErrorBody)
    )
)]
pub async fn list_conversations_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Json<Vec<ConversationTurnResponse>>, InteractionError> {
    let cancel = session.shutdown.child_token();
    let mut state = session.lock(&cancel).await.ok_or(InteractionError::Cancelled)?;
    let turns = tokio::select! {
        _ = cancel.cancelled() => return Err(InteractionError::Cancelled),
        turns = past_conversations(&app_state, &mut state) => turns?,
    };
    Ok(Json(turns.iter().map(ConversationTurnResponse::from).collect()))
}

/// Analyze the mood of a journal entry and save it.
#[utoipa::path(
    post,
    path = "/journal",
    request_body = JournalRequest,
    responses(
        (status = 201, description = "Entry saved", body = MoodLogResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Profile not found", body = InteractionErrorBody),
        (status = 422, description = "Empty entry", body = InteractionErrorBody),
        (status = 503, description = "Saving failed or timed out; retry with pending_input", body = InteractionErrorBody)
    )
)]
pub async fn record_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Json(req): Json<JournalRequest>,
) -> Result<impl IntoResponse, InteractionError> {
    // Cancellable only while waiting for the session; the append itself is bounded by the store timeout.
    let cancel = session.shutdown.child_token();
    let mut state = session.lock(&cancel).await.ok_or(InteractionError::Cancelled)?;
    let entry = record_entry(&app_state, &mut state, &req.entry).await?;
    Ok((StatusCode::CREATED, Json(MoodLogResponse::from(&entry))))
}

/// Past journal entries, most recent first.
#[utoipa::path(
    get,
    path = "/journal",
    responses(
        (status = 200, description = "Journal entries, newest first", body = [MoodLogResponse]),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Profile not found", body = InteractionErrorBody)
    )
)]
pub async fn list_entries_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Json<Vec<MoodLogResponse>>, InteractionError> {
    let cancel = session.shutdown.child_token();
    let mut state = session.lock(&cancel).await.ok_or(InteractionError::Cancelled)?;
    let entries = tokio::select! {
        _ = cancel.cancelled() => return Err(InteractionError::Cancelled),
        entries = past_entries(&app_state, &mut state) => entries?,
    };
    Ok(Json(entries.iter().map(MoodLogResponse::from).collect()))
}

/// The mood sentiment trend as an SVG chart.
#[utoipa::path(
    get,
    path = "/mood/trend",
    responses(
        (status = 200, description = "Trend points and chart, or a placeholder message", body = TrendResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Profile not found", body = InteractionErrorBody)
    )
)]
pub async fn trend_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Json<TrendResponse>, InteractionError> {
    let cancel = session.shutdown.child_token();
    let logs = {
        let mut state = session.lock(&cancel).await.ok_or(InteractionError::Cancelled)?;
        tokio::select! {
            _ = cancel.cancelled() => return Err(InteractionError::Cancelled),
            logs = history(&app_state, &mut state) => logs?,
        }
    };
    Ok(Json(build_trend_response(&logs)))
}

/// Builds the trend payload. A render failure still returns the points.
pub fn build_trend_response(logs: &[MoodLogEntry]) -> TrendResponse {
    let scores: Vec<f64> = logs.iter().map(|e| e.sentiment).collect();
    let points = trend_points(&scores)
        .into_iter()
        .map(|(x, y)| TrendPointResponse {
            entry: x as u32,
            sentiment: y,
        })
        .collect();

    match render_trend(&scores) {
        Ok(TrendChart::Svg(svg)) => TrendResponse {
            points,
            svg: Some(svg),
            message: None,
        },
        Ok(TrendChart::Empty { message }) => TrendResponse {
            points,
            svg: None,
            message: Some(message.to_string()),
        },
        Err(e) => {
            error!("{}", e);
            TrendResponse {
                points,
                svg: None,
                message: Some("The mood chart could not be drawn.".to_string()),
            }
        }
    }
}
