//! Tweet records and labeled training examples.
//!
//! A [`Record`] is created by the loader with only its source columns, then
//! enriched once per derived field as it moves through the pipeline. Every
//! derived field is write-once: a second write is rejected with
//! [`CoreError::AlreadySet`]. When all four are present the record is frozen
//! into an [`AnnotatedRecord`], the shape that gets persisted.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Candidate labels offered to the zero-shot emotion classifier when none are configured.
pub const DEFAULT_EMOTION_LABELS: &[&str] = &["joy", "anger", "sadness", "fear", "surprise", "love"];

/// Polarity code the sentiment training set uses for positive examples.
pub const POSITIVE_POLARITY: i64 = 4;

/// Binary sentiment label. Encoded on the wire as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 2] = [Sentiment::Negative, Sentiment::Positive];

    #[must_use]
    pub fn as_code(self) -> u8 {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Positive => 1,
        }
    }

    /// Decode the `0` / `1` column value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSentimentCode`] for any other value.
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            0 => Ok(Sentiment::Negative),
            1 => Ok(Sentiment::Positive),
            other => Err(CoreError::InvalidSentimentCode(other)),
        }
    }

    /// Map a training-set polarity code: `4` is positive, everything else negative.
    #[must_use]
    pub fn from_polarity(polarity: i64) -> Self {
        if polarity == POSITIVE_POLARITY {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Positive => write!(f, "Positive"),
        }
    }
}

/// Topic cluster identifier. `-1` is the outlier cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct TopicId(i32);

impl TopicId {
    pub const OUTLIER: TopicId = TopicId(-1);

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTopicId`] if `raw` is below `-1` or does not fit in `i32`.
    pub fn new(raw: i64) -> Result<Self, CoreError> {
        if raw < -1 {
            return Err(CoreError::InvalidTopicId(raw));
        }
        i32::try_from(raw)
            .map(TopicId)
            .map_err(|_| CoreError::InvalidTopicId(raw))
    }

    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }

    #[must_use]
    pub fn is_outlier(self) -> bool {
        self == Self::OUTLIER
    }
}

impl TryFrom<i64> for TopicId {
    type Error = CoreError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        TopicId::new(raw)
    }
}

impl From<TopicId> for i32 {
    fn from(id: TopicId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tweet as it moves through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    text: String,
    favorite_count: i64,
    retweets_count: i64,
    clean_text: Option<String>,
    predicted_sentiment: Option<Sentiment>,
    predicted_emotion: Option<String>,
    topic: Option<TopicId>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), CoreError> {
    if slot.is_some() {
        return Err(CoreError::AlreadySet { field });
    }
    *slot = Some(value);
    Ok(())
}

impl Record {
    #[must_use]
    pub fn new(text: impl Into<String>, favorite_count: i64, retweets_count: i64) -> Self {
        Self {
            text: text.into(),
            favorite_count,
            retweets_count,
            clean_text: None,
            predicted_sentiment: None,
            predicted_emotion: None,
            topic: None,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn favorite_count(&self) -> i64 {
        self.favorite_count
    }

    #[must_use]
    pub fn retweets_count(&self) -> i64 {
        self.retweets_count
    }

    #[must_use]
    pub fn clean_text(&self) -> Option<&str> {
        self.clean_text.as_deref()
    }

    #[must_use]
    pub fn predicted_sentiment(&self) -> Option<Sentiment> {
        self.predicted_sentiment
    }

    #[must_use]
    pub fn predicted_emotion(&self) -> Option<&str> {
        self.predicted_emotion.as_deref()
    }

    #[must_use]
    pub fn topic(&self) -> Option<TopicId> {
        self.topic
    }

    /// # Errors
    ///
    /// Returns [`CoreError::AlreadySet`] if the field was already written.
    pub fn set_clean_text(&mut self, clean_text: String) -> Result<(), CoreError> {
        set_once(&mut self.clean_text, clean_text, "clean_text")
    }

    /// # Errors
    ///
    /// Returns [`CoreError::AlreadySet`] if the field was already written.
    pub fn set_predicted_sentiment(&mut self, sentiment: Sentiment) -> Result<(), CoreError> {
        set_once(
            &mut self.predicted_sentiment,
            sentiment,
            "predicted_sentiment",
        )
    }

    /// # Errors
    ///
    /// Returns [`CoreError::AlreadySet`] if the field was already written.
    pub fn set_predicted_emotion(&mut self, emotion: String) -> Result<(), CoreError> {
        set_once(&mut self.predicted_emotion, emotion, "predicted_emotion")
    }

    /// # Errors
    ///
    /// Returns [`CoreError::AlreadySet`] if the field was already written.
    pub fn set_topic(&mut self, topic: TopicId) -> Result<(), CoreError> {
        set_once(&mut self.topic, topic, "topic")
    }

    /// Freeze a fully enriched record for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotSet`] naming the first derived field still missing.
    pub fn freeze(self) -> Result<AnnotatedRecord, CoreError> {
        Ok(AnnotatedRecord {
            clean_text: self.clean_text.ok_or(CoreError::NotSet {
                field: "clean_text",
            })?,
            predicted_sentiment: self.predicted_sentiment.ok_or(CoreError::NotSet {
                field: "predicted_sentiment",
            })?,
            predicted_emotion: self.predicted_emotion.ok_or(CoreError::NotSet {
                field: "predicted_emotion",
            })?,
            topic: self.topic.ok_or(CoreError::NotSet { field: "topic" })?,
            text: self.text,
            favorite_count: self.favorite_count,
            retweets_count: self.retweets_count,
        })
    }
}

/// A fully labeled record, as written to and read back from the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedRecord {
    pub text: String,
    pub favorite_count: i64,
    pub retweets_count: i64,
    pub clean_text: String,
    pub predicted_sentiment: Sentiment,
    pub predicted_emotion: String,
    pub topic: TopicId,
}

impl AnnotatedRecord {
    /// Likes plus retweets.
    #[must_use]
    pub fn popularity(&self) -> i64 {
        self.favorite_count.saturating_add(self.retweets_count)
    }
}

/// A row from the emotion training set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionExample {
    pub content: String,
    pub clean_text: String,
}

/// A row from the sentiment training set, with its polarity mapped to a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentExample {
    pub tweet: String,
    pub polarity: i64,
    pub clean_text: String,
    pub label: Sentiment,
}
