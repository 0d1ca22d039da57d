//! `evaluate` command handler.

use tweetscope_pipeline::loader::load_sentiment_examples;
use tweetscope_pipeline::{
    evaluate_sentiment, EndpointConfig, FailurePolicy, HttpSentimentClassifier, PipelineOptions,
    RetryPolicy,
};

/// Score the configured sentiment endpoint against the labeled examples.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the examples cannot be loaded.
pub(crate) async fn run_evaluate(limit: Option<usize>) -> anyhow::Result<()> {
    let config = tweetscope_core::load_app_config()?;
    let options = PipelineOptions::from_app_config(&config, FailurePolicy::Skip);

    let mut examples = load_sentiment_examples(&config.sentiment_examples_path)?;
    if let Some(limit) = limit {
        examples.truncate(limit);
    }
    if examples.is_empty() {
        println!("no sentiment examples to evaluate");
        return Ok(());
    }

    let classifier = HttpSentimentClassifier::new(EndpointConfig {
        url: config.require_sentiment_url()?.to_string(),
        token: config.inference_token.clone(),
        retry: RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        },
    })?;

    tracing::info!(examples = examples.len(), "evaluating sentiment model");
    let evaluation = evaluate_sentiment(&classifier, &examples, &options.labeler).await?;
    print!("{evaluation}");
    Ok(())
}
