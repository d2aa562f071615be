pub mod domain;
pub mod mood;
pub mod personas;
pub mod ports;

pub use domain::{ChatLine, ConversationTurn, Mood, MoodLogEntry, UserCredentials, UserProfile};
pub use mood::{classify, HAPPY_THRESHOLD, SAD_THRESHOLD};
pub use personas::{Persona, PERSONAS};
pub use ports::{
    AppendOutcome, PortError, PortResult, ProfileStore, SentimentScorer, TextGenerationService,
};
