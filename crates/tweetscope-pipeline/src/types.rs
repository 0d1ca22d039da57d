use std::path::PathBuf;
use std::time::Duration;

use tweetscope_core::AppConfig;

use crate::classifier::{EmotionClassifier, SentimentClassifier};
use crate::error::{PipelineError, RecordFailure};
use crate::inference::{EndpointConfig, HttpSentimentClassifier, HttpZeroShotClassifier};
use crate::labeler::LabelerOptions;
use crate::loader::SourcePaths;
use crate::retry::RetryPolicy;
use crate::topics::{HttpTopicModel, TopicManifest, TopicModel};

/// What to do with records that a classifier could not label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the run, listing every failed record. Nothing is written.
    #[default]
    Abort,
    /// Drop failed records from the output and report them.
    Skip,
}

/// Settings for one annotation run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub sources: SourcePaths,
    pub output_path: PathBuf,
    pub model_cache_dir: PathBuf,
    pub labeler: LabelerOptions,
    pub emotion_labels: Vec<String>,
    pub topic_timeout: Duration,
    pub min_topic_corpus: usize,
    pub failure_policy: FailurePolicy,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, failure_policy: FailurePolicy) -> Self {
        Self {
            sources: SourcePaths {
                raw_tweets: config.input_path.clone(),
                emotion_examples: config.emotion_examples_path.clone(),
                sentiment_examples: config.sentiment_examples_path.clone(),
            },
            output_path: config.output_path.clone(),
            model_cache_dir: config.model_cache_dir.clone(),
            labeler: LabelerOptions {
                max_concurrent: config.max_concurrent_requests,
                call_timeout: Duration::from_secs(config.request_timeout_secs),
                ..LabelerOptions::default()
            },
            emotion_labels: config.emotion_labels.clone(),
            topic_timeout: Duration::from_secs(config.topic_timeout_secs),
            min_topic_corpus: config.min_topic_corpus,
            failure_policy,
        }
    }
}

/// The three external models a run depends on.
pub struct Models {
    pub sentiment: Box<dyn SentimentClassifier>,
    pub emotion: Box<dyn EmotionClassifier>,
    pub topics: Box<dyn TopicModel>,
}

impl Models {
    /// HTTP clients for the endpoints named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if an endpoint URL is not configured
    /// and [`PipelineError::Client`] if an HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let endpoint = |url: &str| EndpointConfig {
            url: url.to_string(),
            token: config.inference_token.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
            },
        };
        Ok(Self {
            sentiment: Box::new(HttpSentimentClassifier::new(endpoint(
                config.require_sentiment_url()?,
            ))?),
            emotion: Box::new(HttpZeroShotClassifier::new(endpoint(
                config.require_emotion_url()?,
            ))?),
            topics: Box::new(HttpTopicModel::new(endpoint(config.require_topic_url()?))?),
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Raw tweets loaded.
    pub loaded: usize,
    /// Records written to the output table.
    pub written: usize,
    /// Records dropped under [`FailurePolicy::Skip`], indexed by load position.
    pub skipped: Vec<RecordFailure>,
    pub emotion_examples: usize,
    pub sentiment_examples: usize,
    /// Distinct non-outlier topics.
    pub topic_count: usize,
    pub outliers: usize,
    pub output_path: PathBuf,
    pub manifest: TopicManifest,
}
