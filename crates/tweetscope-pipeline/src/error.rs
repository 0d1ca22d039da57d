use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tweetscope_core::{ConfigError, CoreError};

/// Reading one of the input sources failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: missing required column `{column}`", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{}: unsupported input format (expected .csv, .jsonl, .p, .pkl or .pickle)", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// An external classifier call failed for one record.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("unknown sentiment label: {0}")]
    UnknownLabel(String),

    #[error("record has no clean_text; run the normalizer first")]
    NotNormalized,
}

/// The whole-corpus topic step failed.
#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("corpus of {size} documents is too small for topic clustering (minimum {minimum})")]
    CorpusTooSmall { size: usize, minimum: usize },

    #[error("record {index} has no clean_text; run the normalizer first")]
    NotNormalized { index: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("topic endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("topic model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed topic model response: {0}")]
    MalformedResponse(String),

    #[error("failed to persist topic model to {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persisting the enriched table failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Per-record stage that can fail without taking down the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sentiment,
    Emotion,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Sentiment => write!(f, "sentiment"),
            Stage::Emotion => write!(f, "emotion"),
        }
    }
}

/// A labeling failure tied to the record's position in the loaded table.
#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub stage: Stage,
    pub error: LabelError,
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {} ({}): {}", self.index, self.stage, self.error)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("load stage failed: {0}")]
    Load(#[from] LoadError),

    #[error("labeling failed for {} record(s); first: {}", .failures.len(), first_failure(.failures))]
    Labeling { failures: Vec<RecordFailure> },

    #[error("topic stage failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("write stage failed: {0}")]
    Write(#[from] WriteError),

    #[error("record invariant violated: {0}")]
    Record(#[from] CoreError),

    #[error("every record failed labeling; nothing left to cluster")]
    NothingLabeled,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn first_failure(failures: &[RecordFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}
