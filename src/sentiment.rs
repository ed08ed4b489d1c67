//! Keyword sentiment scoring for wish text.
//!
//! Deterministic and model-free. `score` never fails: anything that goes
//! wrong while scoring yields [`Sentiment::FALLBACK`] so a wish is never
//! blocked by the scorer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only this many characters of a wish are scored.
pub const MAX_SCORED_CHARS: usize = 512;

const BASE_CONFIDENCE: f64 = 0.5;
const STARTER_BONUS: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.05;
const KEYWORD_CAP: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

const WISH_STARTERS: &[&str] = &[
    "i wish",
    "i hope",
    "i want",
    "my dream",
    "i would love",
    "i'd love",
    "i aspire",
];

const POSITIVE_WORDS: &[&str] = &[
    "learn", "travel", "improve", "achieve", "success", "successful", "happy", "happiness",
    "health", "healthy", "love", "peace", "balance", "promotion", "grow", "growth", "find",
    "build", "create", "start", "finish", "win", "joy", "family", "friends", "better", "new",
    "dream", "explore", "help", "kind", "together", "strong", "confident", "graduate",
];

const NEGATIVE_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "can't", "cant", "won't", "wont", "hate", "bad",
    "sad", "fail", "failure", "lose", "lost", "stress", "stressed", "angry", "worse", "worst",
    "sick", "die", "kill", "revenge", "hurt", "pain", "lonely", "poor",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Negative => "NEGATIVE",
        }
    }

    fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.6 {
            SentimentLabel::Positive
        } else if confidence >= 0.4 {
            SentimentLabel::Neutral
        } else {
            SentimentLabel::Negative
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl Sentiment {
    pub const FALLBACK: Sentiment = Sentiment {
        label: SentimentLabel::Positive,
        confidence: 0.7,
    };

    pub fn is_positive(&self) -> bool {
        self.label == SentimentLabel::Positive
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("no words to score")]
    NoWords,
}

/// Score wish text, falling back to [`Sentiment::FALLBACK`] on failure.
pub fn score(text: &str) -> Sentiment {
    match try_score(text) {
        Ok(sentiment) => sentiment,
        Err(err) => {
            tracing::debug!(error = %err, "sentiment scoring failed, using fallback");
            Sentiment::FALLBACK
        }
    }
}

pub fn try_score(text: &str) -> Result<Sentiment, ScoreError> {
    let normalized: String = text.chars().take(MAX_SCORED_CHARS).collect::<String>().to_lowercase();
    let words = words(&normalized);
    if words.is_empty() {
        return Err(ScoreError::NoWords);
    }

    let mut confidence = BASE_CONFIDENCE;
    if WISH_STARTERS.iter().any(|starter| normalized.contains(starter)) {
        confidence += STARTER_BONUS;
    }
    let positives = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count();
    let negatives = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count();
    confidence += keyword_weight(positives);
    confidence -= keyword_weight(negatives);

    let confidence = confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    Ok(Sentiment {
        label: SentimentLabel::from_confidence(confidence),
        confidence,
    })
}

fn keyword_weight(count: usize) -> f64 {
    (count as f64 * KEYWORD_WEIGHT).min(KEYWORD_CAP)
}

fn words(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect()
}
