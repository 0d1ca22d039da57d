//! Capability traits for the external text classifiers.
//!
//! The pipeline only ever talks to these traits. Production wires in the HTTP
//! clients from [`crate::inference`]; tests wire in deterministic stubs.

use async_trait::async_trait;
use tweetscope_core::Sentiment;

use crate::error::LabelError;

/// Longest text, in characters, ever submitted to a classifier.
pub const MAX_INPUT_CHARS: usize = 512;

/// One label with its model score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// Binary sentiment classifier.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify `text` and return the winning label (e.g. `POSITIVE`).
    async fn classify(&self, text: &str) -> Result<LabelScore, LabelError>;
}

/// Zero-shot classifier over caller-supplied candidate labels.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Score `text` against each candidate label.
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<Vec<LabelScore>, LabelError>;
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Map a sentiment model label onto [`Sentiment`].
///
/// # Errors
///
/// Returns [`LabelError::UnknownLabel`] for anything but `POSITIVE`/`NEGATIVE`
/// (any case) or the raw head names `LABEL_1`/`LABEL_0`.
pub fn parse_sentiment_label(label: &str) -> Result<Sentiment, LabelError> {
    match label.trim().to_ascii_uppercase().as_str() {
        "POSITIVE" | "LABEL_1" => Ok(Sentiment::Positive),
        "NEGATIVE" | "LABEL_0" => Ok(Sentiment::Negative),
        _ => Err(LabelError::UnknownLabel(label.to_string())),
    }
}

/// Pick the highest-scoring label, which must be one of `candidates`.
///
/// # Errors
///
/// Returns [`LabelError::MalformedResponse`] if `scores` is empty or the
/// winner was not offered.
pub fn top_label(scores: &[LabelScore], candidates: &[String]) -> Result<String, LabelError> {
    let best = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| LabelError::MalformedResponse("no labels returned".to_string()))?;
    if !candidates.iter().any(|c| *c == best.label) {
        return Err(LabelError::MalformedResponse(format!(
            "label `{}` is not a candidate",
            best.label
        )));
    }
    Ok(best.label.clone())
}
