//! services/api/src/adapters/sentiment.rs
//!
//! Implements the `SentimentScorer` port with the VADER lexicon scorer.

use counsel_core::ports::SentimentScorer;
use vader_sentiment::SentimentIntensityAnalyzer;

/// VADER compound scoring. The lexicon is static, so the analyzer is built per call.
#[derive(Clone, Copy, Debug, Default)]
pub struct VaderSentimentAdapter;

impl VaderSentimentAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderSentimentAdapter {
    fn compound(&self, text: &str) -> f64 {
        let analyzer = SentimentIntensityAnalyzer::new();
        analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}
