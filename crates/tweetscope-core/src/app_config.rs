use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Raw tweet table to annotate.
    pub input_path: PathBuf,
    pub emotion_examples_path: PathBuf,
    pub sentiment_examples_path: PathBuf,
    /// Destination for the enriched record table.
    pub output_path: PathBuf,
    /// Where fitted topic models are stored.
    pub model_cache_dir: PathBuf,
    /// Model endpoints. Unset until a command needs them; see the `require_*` accessors.
    pub sentiment_url: Option<String>,
    pub emotion_url: Option<String>,
    pub topic_url: Option<String>,
    pub inference_token: Option<String>,
    pub request_timeout_secs: u64,
    pub topic_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub emotion_labels: Vec<String>,
    pub min_topic_corpus: usize,
}

fn required<'a>(value: Option<&'a String>, var: &str) -> Result<&'a str, ConfigError> {
    value
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TWEETSCOPE_SENTIMENT_URL` was not set.
    pub fn require_sentiment_url(&self) -> Result<&str, ConfigError> {
        required(self.sentiment_url.as_ref(), "TWEETSCOPE_SENTIMENT_URL")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TWEETSCOPE_EMOTION_URL` was not set.
    pub fn require_emotion_url(&self) -> Result<&str, ConfigError> {
        required(self.emotion_url.as_ref(), "TWEETSCOPE_EMOTION_URL")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TWEETSCOPE_TOPIC_URL` was not set.
    pub fn require_topic_url(&self) -> Result<&str, ConfigError> {
        required(self.topic_url.as_ref(), "TWEETSCOPE_TOPIC_URL")
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("input_path", &self.input_path)
            .field("emotion_examples_path", &self.emotion_examples_path)
            .field("sentiment_examples_path", &self.sentiment_examples_path)
            .field("output_path", &self.output_path)
            .field("model_cache_dir", &self.model_cache_dir)
            .field("sentiment_url", &self.sentiment_url)
            .field("emotion_url", &self.emotion_url)
            .field("topic_url", &self.topic_url)
            .field(
                "inference_token",
                &self.inference_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("topic_timeout_secs", &self.topic_timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("emotion_labels", &self.emotion_labels)
            .field("min_topic_corpus", &self.min_topic_corpus)
            .finish()
    }
}
