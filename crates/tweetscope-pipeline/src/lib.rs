//! Tweet annotation pipeline.
//!
//! Loads raw tweets, cleans them, labels each with a sentiment and an emotion
//! through external classifiers, assigns whole-corpus topics through an
//! external topic model, and writes the enriched table as CSV. The
//! [`summary`] and [`evaluate`] modules report on the results.

pub mod classifier;
pub mod error;
pub mod evaluate;
pub mod inference;
pub mod labeler;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod summary;
pub mod topics;
pub mod types;
pub mod writer;

mod retry;

pub use classifier::{EmotionClassifier, LabelScore, SentimentClassifier, MAX_INPUT_CHARS};
pub use error::{
    ClusteringError, LabelError, LoadError, PipelineError, RecordFailure, Stage, WriteError,
};
pub use evaluate::{evaluate_sentiment, Evaluation};
pub use inference::{EndpointConfig, HttpSentimentClassifier, HttpZeroShotClassifier};
pub use labeler::{label_emotion, label_sentiment, LabelerOptions};
pub use loader::{load_sources, LoadedSources, SourcePaths};
pub use normalize::{clean, normalize_records};
pub use pipeline::{annotate, load_and_clean, run_annotation};
pub use retry::RetryPolicy;
pub use summary::{summarize, Summary, SummaryOptions};
pub use topics::{
    assign_topics, persist_topic_artifact, stage_topic_artifact, HttpTopicModel, StagedArtifact,
    TopicFit, TopicModel,
};
pub use types::{FailurePolicy, Models, PipelineOptions, RunReport};
pub use writer::{read_annotated, stage_records, write_records, StagedTable};
