pub mod action_queue;
pub mod auth;
pub mod conversation_task;
pub mod journal_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod routes;
pub mod state;
pub mod trend;
pub mod ws_handler;

// Re-export the handlers the binary needs to build the web server router.
pub use ws_handler::ws_handler;
pub use rest::{
    chat_handler, list_conversations_handler, list_counselors_handler, list_entries_handler,
    record_entry_handler, session_handler, trend_handler,
};
pub use middleware::require_auth;
pub use routes::api_routes;
