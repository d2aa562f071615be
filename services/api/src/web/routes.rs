//! services/api/src/web/routes.rs
//!
//! The API router: public auth and counselor routes, plus the session-protected ones.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    middleware::require_auth,
    rest::{
        chat_handler, list_conversations_handler, list_counselors_handler, list_entries_handler,
        record_entry_handler, session_handler, trend_handler,
    },
    state::AppState,
    ws_handler::ws_handler,
};

/// Builds every API route with `app_state` attached. CORS and docs are layered on by the binary.
pub fn api_routes(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/counselors", get(list_counselors_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/session", get(session_handler))
        .route("/chat", post(chat_handler))
        .route("/conversations", get(list_conversations_handler))
        .route("/journal", get(list_entries_handler).post(record_entry_handler))
        .route("/mood/trend", get(trend_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
