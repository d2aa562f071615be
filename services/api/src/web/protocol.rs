//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server.
//! Every action the REST endpoints offer can also be sent over the socket, so the
//! page stays responsive while a reply is generated.

use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Send a message to the chosen counselor.
    SendMessage { counselor: String, text: String },

    /// Analyze and save a journal entry.
    RecordEntry { text: String },

    /// Ask for the current mood trend.
    RequestTrend,

    /// Abandon the action that is currently in flight.
    Cancel,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once the connection is bound to the session.
    Ready { email: String, counselors: Vec<String> },

    /// The counselor is composing a reply. The UI can show a "thinking..." state.
    GenerationStarted { counselor: String },

    /// Two new history lines: the user's message and the counselor's reply.
    ConversationTurn {
        counselor: String,
        user_message: String,
        ai_response: String,
        saved: bool,
    },

    MoodLogged { mood: String, sentiment: f64 },

    /// Trend chart, or a placeholder `message` when there is no history.
    Trend {
        svg: Option<String>,
        message: Option<String>,
    },

    /// Non-blocking notice, e.g. empty input. Nothing changed.
    Warning { message: String },

    /// An action failed. `pending_input` carries text the client should offer to resend.
    Error {
        kind: String,
        message: String,
        retryable: bool,
        pending_input: Option<String>,
    },
}
