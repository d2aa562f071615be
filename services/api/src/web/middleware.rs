//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Extracts the `session` cookie value, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Middleware that resolves the session cookie to a live, authenticated session.
///
/// If valid, inserts the `SessionHandle` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized and the handler never runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = session_id_from_headers(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state.sessions.get(session_id).await.ok_or_else(|| {
        warn!("Request with an unknown or expired session.");
        StatusCode::UNAUTHORIZED
    })?;

    if !session.state.lock().await.is_authenticated() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
