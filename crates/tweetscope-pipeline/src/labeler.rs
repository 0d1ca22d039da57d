//! Per-record sentiment and emotion labeling.
//!
//! Each record is labeled independently, so calls fan out through a bounded
//! pool (`buffered`, which keeps results in input order). Every call is
//! capped by a timeout. A failed record is reported back to the caller as a
//! [`RecordFailure`] and left unlabeled; the rest of the batch carries on.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tweetscope_core::{CoreError, Record};

use crate::classifier::{
    parse_sentiment_label, top_label, truncate_chars, EmotionClassifier, SentimentClassifier,
    MAX_INPUT_CHARS,
};
use crate::error::{LabelError, RecordFailure, Stage};

/// Limits applied to every classifier call.
#[derive(Debug, Clone)]
pub struct LabelerOptions {
    /// Maximum classifier calls in flight at once. Values below 1 are treated as 1.
    pub max_concurrent: usize,
    /// Upper bound on one call, retries included.
    pub call_timeout: Duration,
    /// Characters of `clean_text` submitted per call.
    pub max_input_chars: usize,
}

impl Default for LabelerOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            call_timeout: Duration::from_secs(60),
            max_input_chars: MAX_INPUT_CHARS,
        }
    }
}

async fn run_bounded<'r, T, F, Fut>(
    records: &'r [Record],
    options: &LabelerOptions,
    call: F,
) -> Vec<Result<T, LabelError>>
where
    F: Fn(&'r str) -> Fut,
    Fut: Future<Output = Result<T, LabelError>>,
{
    let limit = options.max_input_chars.min(MAX_INPUT_CHARS);
    let timeout = options.call_timeout;
    let call = &call;

    stream::iter(records)
        .map(|record| async move {
            let text = record.clean_text().ok_or(LabelError::NotNormalized)?;
            let text = truncate_chars(text, limit);
            tokio::time::timeout(timeout, call(text))
                .await
                .unwrap_or(Err(LabelError::Timeout(timeout)))
        })
        .buffered(options.max_concurrent.max(1))
        .collect()
        .await
}

/// Apply outcomes in order, setting the field on success and collecting failures.
fn apply<T>(
    records: &mut [Record],
    outcomes: Vec<Result<T, LabelError>>,
    stage: Stage,
    mut set: impl FnMut(&mut Record, T) -> Result<(), CoreError>,
) -> Result<Vec<RecordFailure>, CoreError> {
    let mut failures = Vec::new();
    for (index, (record, outcome)) in records.iter_mut().zip(outcomes).enumerate() {
        match outcome {
            Ok(value) => set(record, value)?,
            Err(error) => {
                tracing::warn!(index, stage = %stage, error = %error, "record labeling failed");
                failures.push(RecordFailure {
                    index,
                    stage,
                    error,
                });
            }
        }
    }
    Ok(failures)
}

/// Set `predicted_sentiment` on every record the classifier can label.
///
/// Returns one [`RecordFailure`] per record left unlabeled, indexed by its
/// position in `records`.
///
/// # Errors
///
/// Returns [`CoreError::AlreadySet`] if a record already carries a sentiment.
pub async fn label_sentiment<C>(
    classifier: &C,
    records: &mut [Record],
    options: &LabelerOptions,
) -> Result<Vec<RecordFailure>, CoreError>
where
    C: SentimentClassifier + ?Sized,
{
    let outcomes = run_bounded(records, options, |text| async move {
        let prediction = classifier.classify(text).await?;
        parse_sentiment_label(&prediction.label)
    })
    .await;

    let failures = apply(records, outcomes, Stage::Sentiment, |record, sentiment| {
        record.set_predicted_sentiment(sentiment)
    })?;
    tracing::info!(
        labeled = records.len() - failures.len(),
        failed = failures.len(),
        "sentiment labeling finished"
    );
    Ok(failures)
}

/// Set `predicted_emotion` to the top-scoring candidate for every record the
/// classifier can label.
///
/// # Errors
///
/// Returns [`CoreError::AlreadySet`] if a record already carries an emotion.
pub async fn label_emotion<C>(
    classifier: &C,
    candidate_labels: &[String],
    records: &mut [Record],
    options: &LabelerOptions,
) -> Result<Vec<RecordFailure>, CoreError>
where
    C: EmotionClassifier + ?Sized,
{
    let outcomes = run_bounded(records, options, |text| async move {
        let scores = classifier.classify(text, candidate_labels).await?;
        top_label(&scores, candidate_labels)
    })
    .await;

    let failures = apply(records, outcomes, Stage::Emotion, |record, emotion| {
        record.set_predicted_emotion(emotion)
    })?;
    tracing::info!(
        labeled = records.len() - failures.len(),
        failed = failures.len(),
        "emotion labeling finished"
    );
    Ok(failures)
}

#[cfg(test)]
#[path = "labeler_test.rs"]
mod tests;
