//! Annotation run orchestration.

use std::collections::BTreeSet;

use tweetscope_core::{AnnotatedRecord, Record};

use crate::error::{PipelineError, RecordFailure};
use crate::labeler::{label_emotion, label_sentiment};
use crate::loader::{load_sources, LoadedSources, SourcePaths};
use crate::normalize::normalize_records;
use crate::topics::{assign_topics, stage_topic_artifact, ARTIFACT_DIR};
use crate::types::{FailurePolicy, Models, PipelineOptions, RunReport};
use crate::writer::stage_records;

/// Load every source and clean the raw tweets. No model is called.
///
/// # Errors
///
/// Returns [`PipelineError::Load`] if any source cannot be read.
pub fn load_and_clean(paths: &SourcePaths) -> Result<LoadedSources, PipelineError> {
    let mut sources = load_sources(paths)?;
    normalize_records(&mut sources.tweets)?;
    tracing::info!(
        tweets = sources.tweets.len(),
        emotion_examples = sources.emotion_examples.len(),
        sentiment_examples = sources.sentiment_examples.len(),
        "sources loaded and cleaned"
    );
    Ok(sources)
}

/// Run the full annotation pipeline.
///
/// 1. Load the three sources and clean every raw tweet.
/// 2. Label sentiment and emotion per record through the bounded pool.
/// 3. Apply the failure policy.
/// 4. Fit topics over the surviving corpus.
/// 5. Stage the table and the topic model, then commit the model and the table.
///
/// # Errors
///
/// Returns [`PipelineError`] for the first fatal stage. The table only
/// appears at `output_path` once the topic model has been persisted.
pub async fn run_annotation(
    models: &Models,
    options: &PipelineOptions,
) -> Result<RunReport, PipelineError> {
    let sources = load_and_clean(&options.sources)?;
    let emotion_examples = sources.emotion_examples.len();
    let sentiment_examples = sources.sentiment_examples.len();

    let mut report = annotate(models, sources.tweets, options).await?;
    report.emotion_examples = emotion_examples;
    report.sentiment_examples = sentiment_examples;
    Ok(report)
}

/// Label, cluster and persist already-cleaned records.
///
/// # Errors
///
/// See [`run_annotation`].
pub async fn annotate(
    models: &Models,
    mut records: Vec<Record>,
    options: &PipelineOptions,
) -> Result<RunReport, PipelineError> {
    let loaded = records.len();

    let mut failures =
        label_sentiment(models.sentiment.as_ref(), &mut records, &options.labeler).await?;
    failures.extend(
        label_emotion(
            models.emotion.as_ref(),
            &options.emotion_labels,
            &mut records,
            &options.labeler,
        )
        .await?,
    );
    failures.sort_by_key(|f| f.index);

    let skipped = match options.failure_policy {
        FailurePolicy::Abort if !failures.is_empty() => {
            return Err(PipelineError::Labeling { failures });
        }
        FailurePolicy::Abort => Vec::new(),
        FailurePolicy::Skip => {
            let failed = failed_indices(&failures);
            if !failed.is_empty() {
                records = records
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| failed.binary_search(i).is_err())
                    .map(|(_, r)| r)
                    .collect();
                tracing::warn!(
                    dropped = failed.len(),
                    remaining = records.len(),
                    "skipping records that failed labeling"
                );
                if records.is_empty() {
                    return Err(PipelineError::NothingLabeled);
                }
            }
            failures
        }
    };

    let fit = assign_topics(
        models.topics.as_ref(),
        &records,
        options.min_topic_corpus,
        options.topic_timeout,
    )
    .await?;
    for (record, topic) in records.iter_mut().zip(&fit.topics) {
        record.set_topic(*topic)?;
    }

    let annotated = records
        .into_iter()
        .map(Record::freeze)
        .collect::<Result<Vec<AnnotatedRecord>, _>>()?;

    // Both outputs are staged before either is committed, so a failed run
    // never leaves a finished-looking table behind.
    let table = stage_records(&options.output_path, &annotated)?;
    let documents: Vec<&str> = annotated.iter().map(|r| r.clean_text.as_str()).collect();
    let artifact = stage_topic_artifact(
        &options.model_cache_dir.join(ARTIFACT_DIR),
        &fit,
        &documents,
    )?;
    let manifest = artifact.commit()?;
    table.commit()?;

    let outliers = fit.topics.iter().filter(|t| t.is_outlier()).count();
    tracing::info!(
        loaded,
        written = annotated.len(),
        skipped = skipped.len(),
        topics = manifest.topic_count,
        "annotation run complete"
    );

    Ok(RunReport {
        loaded,
        written: annotated.len(),
        skipped,
        emotion_examples: 0,
        sentiment_examples: 0,
        topic_count: manifest.topic_count,
        outliers,
        output_path: options.output_path.clone(),
        manifest,
    })
}

/// Indices of the records named in `failures`, deduplicated.
#[must_use]
pub fn failed_indices(failures: &[RecordFailure]) -> Vec<usize> {
    failures
        .iter()
        .map(|f| f.index)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
