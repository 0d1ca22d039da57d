//! Whole-corpus topic assignment.
//!
//! Unlike the labelers, the topic model discovers its label space from the
//! full corpus, so it runs as one blocking call after every record is
//! cleaned. The fitted model comes back alongside the assignments and is
//! persisted on its own for later inference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tweetscope_core::{CoreError, Record, TopicId};
use uuid::Uuid;

use crate::error::ClusteringError;
use crate::inference::{build_http_client, truncate_body, EndpointConfig};
use crate::retry::retry_with_backoff;

/// Artifact directory name under the model cache directory.
pub const ARTIFACT_DIR: &str = "topic_model";
/// File holding the opaque fitted model inside an artifact directory.
pub const MODEL_FILE: &str = "topic_model.json";
/// File describing the run that produced the artifact.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Output of fitting a topic model.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicFit {
    /// One topic per input document, in input order.
    pub topics: Vec<TopicId>,
    /// The fitted model, opaque to this crate.
    pub artifact: serde_json::Value,
}

/// Unsupervised topic model fitted over a whole corpus in one call.
#[async_trait]
pub trait TopicModel: Send + Sync {
    async fn fit(&self, documents: &[String]) -> Result<TopicFit, ClusteringError>;
}

#[derive(Serialize)]
struct FitRequest<'a> {
    documents: &'a [String],
}

#[derive(Deserialize)]
struct FitResponse {
    topics: Vec<i64>,
    #[serde(default)]
    model: serde_json::Value,
}

/// Topic model served over HTTP: `POST {url}/fit` with `{"documents": [...]}`,
/// answered by `{"topics": [...], "model": {...}}`.
pub struct HttpTopicModel {
    client: reqwest::Client,
    url: String,
    config: EndpointConfig,
}

impl HttpTopicModel {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: EndpointConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
            url: format!("{}/fit", config.url.trim_end_matches('/')),
            config,
        })
    }
}

fn to_topic_ids(raw: Vec<i64>) -> Result<Vec<TopicId>, ClusteringError> {
    raw.into_iter()
        .map(|t| {
            TopicId::new(t).map_err(|e: CoreError| ClusteringError::MalformedResponse(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl TopicModel for HttpTopicModel {
    async fn fit(&self, documents: &[String]) -> Result<TopicFit, ClusteringError> {
        let response: FitResponse = retry_with_backoff(self.config.retry, || async move {
            let mut request = self.client.post(&self.url).json(&FitRequest { documents });
            if let Some(token) = &self.config.token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ClusteringError::Status {
                    status: status.as_u16(),
                    body: truncate_body(&body),
                });
            }
            response.json::<FitResponse>().await.map_err(|e| {
                ClusteringError::MalformedResponse(format!("unexpected fit payload: {e}"))
            })
        })
        .await?;

        Ok(TopicFit {
            topics: to_topic_ids(response.topics)?,
            artifact: response.model,
        })
    }
}

/// Fit `model` over the cleaned text of every record and return one topic per record.
///
/// # Errors
///
/// - [`ClusteringError::CorpusTooSmall`] if there are fewer than
///   `min_corpus_size` records (an empty corpus always fails).
/// - [`ClusteringError::NotNormalized`] if a record has no `clean_text`.
/// - [`ClusteringError::Timeout`] if the fit exceeds `timeout`.
/// - [`ClusteringError::MalformedResponse`] if the model returns a different
///   number of topics than documents.
pub async fn assign_topics<M>(
    model: &M,
    records: &[Record],
    min_corpus_size: usize,
    timeout: Duration,
) -> Result<TopicFit, ClusteringError>
where
    M: TopicModel + ?Sized,
{
    let minimum = min_corpus_size.max(1);
    if records.len() < minimum {
        return Err(ClusteringError::CorpusTooSmall {
            size: records.len(),
            minimum,
        });
    }

    let documents = records
        .iter()
        .enumerate()
        .map(|(index, r)| {
            r.clean_text()
                .map(str::to_string)
                .ok_or(ClusteringError::NotNormalized { index })
        })
        .collect::<Result<Vec<String>, _>>()?;

    tracing::info!(documents = documents.len(), "fitting topic model");
    let fit = tokio::time::timeout(timeout, model.fit(&documents))
        .await
        .map_err(|_| ClusteringError::Timeout(timeout))??;

    if fit.topics.len() != documents.len() {
        return Err(ClusteringError::MalformedResponse(format!(
            "{} topics returned for {} documents",
            fit.topics.len(),
            documents.len()
        )));
    }

    let distinct = fit
        .topics
        .iter()
        .filter(|t| !t.is_outlier())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let outliers = fit.topics.iter().filter(|t| t.is_outlier()).count();
    tracing::info!(topics = distinct, outliers, "topic model fitted");
    Ok(fit)
}

/// Describes the run that produced a persisted topic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicManifest {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub document_count: usize,
    pub topic_count: usize,
    /// SHA-256 over the cleaned documents, newline separated.
    pub corpus_sha256: String,
}

/// Hex SHA-256 of the documents joined by newlines.
#[must_use]
pub fn corpus_fingerprint(documents: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(doc.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A fitted model and manifest written to a staging directory beside their destination.
///
/// Dropping it without [`StagedArtifact::commit`] removes the staging
/// directory and leaves any previous artifact in place.
#[derive(Debug)]
pub struct StagedArtifact {
    staging: TempDir,
    target: PathBuf,
    manifest: TopicManifest,
}

impl StagedArtifact {
    #[must_use]
    pub fn manifest(&self) -> &TopicManifest {
        &self.manifest
    }

    /// Move the staged artifact to its destination, replacing any previous one.
    ///
    /// The previous artifact is moved aside first and restored if the move fails.
    ///
    /// # Errors
    ///
    /// Returns [`ClusteringError::Artifact`] if either rename fails.
    pub fn commit(self) -> Result<TopicManifest, ClusteringError> {
        let artifact_err = |source: std::io::Error| ClusteringError::Artifact {
            path: self.target.clone(),
            source,
        };

        // Holds the previous artifact until the new one is in place.
        let mut displaced = None;
        if self.target.exists() {
            let parent = self.staging.path().parent().unwrap_or(Path::new("."));
            let aside = tempfile::Builder::new()
                .prefix(".topic_model-old")
                .tempdir_in(parent)
                .map_err(artifact_err)?;
            let previous = aside.path().join(ARTIFACT_DIR);
            std::fs::rename(&self.target, &previous).map_err(artifact_err)?;
            displaced = Some((aside, previous));
        }

        if let Err(source) = std::fs::rename(self.staging.path(), &self.target) {
            if let Some((_, previous)) = &displaced {
                if let Err(e) = std::fs::rename(previous, &self.target) {
                    tracing::error!(error = %e, "failed to restore previous topic model");
                }
            }
            return Err(artifact_err(source));
        }
        drop(displaced);

        tracing::info!(
            dir = %self.target.display(),
            run_id = %self.manifest.run_id,
            topics = self.manifest.topic_count,
            "topic model persisted"
        );
        Ok(self.manifest)
    }
}

/// Write the fitted model and its manifest into a staging directory next to `dir`.
///
/// Nothing is visible at `dir` until the returned artifact is committed.
///
/// # Errors
///
/// Returns [`ClusteringError::Artifact`] if the parent of `dir` or the staged
/// files cannot be written.
pub fn stage_topic_artifact(
    dir: &Path,
    fit: &TopicFit,
    documents: &[&str],
) -> Result<StagedArtifact, ClusteringError> {
    let artifact_err = |source: std::io::Error| ClusteringError::Artifact {
        path: dir.to_path_buf(),
        source,
    };
    let parent = match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(artifact_err)?;
    let staging = tempfile::Builder::new()
        .prefix(".topic_model-new")
        .tempdir_in(parent)
        .map_err(artifact_err)?;

    let manifest = TopicManifest {
        run_id: Uuid::new_v4(),
        created_at: Utc::now(),
        document_count: fit.topics.len(),
        topic_count: fit
            .topics
            .iter()
            .filter(|t| !t.is_outlier())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        corpus_sha256: corpus_fingerprint(documents),
    };

    write_pretty(&staging.path().join(MODEL_FILE), &fit.artifact)?;
    write_pretty(&staging.path().join(MANIFEST_FILE), &manifest)?;

    Ok(StagedArtifact {
        staging,
        target: dir.to_path_buf(),
        manifest,
    })
}

/// Write the fitted model and its manifest into `dir`, replacing any previous artifact.
///
/// # Errors
///
/// See [`stage_topic_artifact`] and [`StagedArtifact::commit`].
pub fn persist_topic_artifact(
    dir: &Path,
    fit: &TopicFit,
    documents: &[&str],
) -> Result<TopicManifest, ClusteringError> {
    stage_topic_artifact(dir, fit, documents)?.commit()
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), ClusteringError> {
    let artifact_err = |source: std::io::Error| ClusteringError::Artifact {
        path: path.to_path_buf(),
        source,
    };
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| artifact_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    std::fs::write(path, bytes).map_err(artifact_err)
}

/// Read back a manifest written by [`persist_topic_artifact`].
///
/// # Errors
///
/// Returns [`ClusteringError::Artifact`] if the file is missing or unreadable.
pub fn load_topic_manifest(dir: &Path) -> Result<TopicManifest, ClusteringError> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = std::fs::read(&path).map_err(|source| ClusteringError::Artifact {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ClusteringError::Artifact {
        path,
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

#[cfg(test)]
#[path = "topics_test.rs"]
mod tests;
