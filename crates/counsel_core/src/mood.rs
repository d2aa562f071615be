//! crates/counsel_core/src/mood.rs
//!
//! Maps a compound sentiment score onto a `Mood`.

use crate::domain::Mood;
use crate::ports::SentimentScorer;

/// Scores at or above this value are `Happy`.
pub const HAPPY_THRESHOLD: f64 = 0.05;
/// Scores at or below this value are `Sad`.
pub const SAD_THRESHOLD: f64 = -0.05;

impl Mood {
    /// Both thresholds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= HAPPY_THRESHOLD {
            Mood::Happy
        } else if score <= SAD_THRESHOLD {
            Mood::Sad
        } else {
            Mood::Neutral
        }
    }
}

/// Scores `text` and derives its mood label.
///
/// The caller is responsible for rejecting empty text. The score is clamped to
/// `[-1, 1]` so a misbehaving scorer can never produce an out-of-range record.
pub fn classify(scorer: &dyn SentimentScorer, text: &str) -> (Mood, f64) {
    let raw = scorer.compound(text);
    let score = if raw.is_nan() { 0.0 } else { raw.clamp(-1.0, 1.0) };
    (Mood::from_score(score), score)
}
