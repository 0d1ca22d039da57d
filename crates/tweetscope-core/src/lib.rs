//! Shared domain types and configuration for tweetscope.

pub mod app_config;
pub mod config;
pub mod record;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{
    AnnotatedRecord, EmotionExample, Record, Sentiment, SentimentExample, TopicId,
    DEFAULT_EMOTION_LABELS, POSITIVE_POLARITY,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A derived field was written a second time.
    #[error("field `{field}` is already set")]
    AlreadySet { field: &'static str },

    /// A record was frozen before every derived field was populated.
    #[error("field `{field}` is not set")]
    NotSet { field: &'static str },

    #[error("invalid sentiment code: {0}")]
    InvalidSentimentCode(i64),

    #[error("invalid topic id: {0}")]
    InvalidTopicId(i64),
}
