//! `annotate` command handler.

use std::path::PathBuf;

use tweetscope_core::AppConfig;
use tweetscope_pipeline::{
    load_and_clean, run_annotation, FailurePolicy, Models, PipelineError, PipelineOptions,
};

/// Command-line replacements for the configured paths.
#[derive(Debug, Default)]
pub(crate) struct PathOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub model_cache_dir: Option<PathBuf>,
}

impl PathOverrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(dir) = self.model_cache_dir {
            config.model_cache_dir = dir;
        }
    }
}

/// Run the annotation pipeline with the configured models.
///
/// With `dry_run`, only loads and cleans the sources and prints counts; the
/// model endpoint URLs need not be configured.
///
/// # Errors
///
/// Returns an error if configuration is invalid or any pipeline stage fails.
pub(crate) async fn run_annotate(
    overrides: PathOverrides,
    skip_failed: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut config = tweetscope_core::load_app_config()?;
    overrides.apply(&mut config);

    let policy = if skip_failed {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };
    let options = PipelineOptions::from_app_config(&config, policy);

    if dry_run {
        let sources = load_and_clean(&options.sources)?;
        let empty = sources
            .tweets
            .iter()
            .filter(|r| r.clean_text().is_some_and(str::is_empty))
            .count();
        println!(
            "dry-run: {} tweets ({} empty after cleaning), {} emotion examples, {} sentiment examples",
            sources.tweets.len(),
            empty,
            sources.emotion_examples.len(),
            sources.sentiment_examples.len()
        );
        println!(
            "dry-run: would write {} and a topic model under {}",
            options.output_path.display(),
            options.model_cache_dir.display()
        );
        return Ok(());
    }

    tracing::info!(env = %config.env, ?policy, "starting annotation run");
    let models = Models::from_app_config(&config)?;
    let report = match run_annotation(&models, &options).await {
        Ok(report) => report,
        Err(PipelineError::Labeling { failures }) => {
            for failure in &failures {
                eprintln!("  {failure}");
            }
            anyhow::bail!(
                "{} record(s) failed labeling; nothing was written (rerun with --skip-failed to drop them)",
                failures.len()
            );
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "annotated {} of {} tweets -> {}",
        report.written,
        report.loaded,
        report.output_path.display()
    );
    println!(
        "topics: {} (+{} outliers), model run {} saved under {}",
        report.topic_count,
        report.outliers,
        report.manifest.run_id,
        options.model_cache_dir.display()
    );
    if !report.skipped.is_empty() {
        println!("skipped {} failed record(s):", report.skipped.len());
        for failure in &report.skipped {
            println!("  {failure}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            env: tweetscope_core::Environment::Test,
            log_level: "info".to_string(),
            input_path: PathBuf::from("./data/tweets.p"),
            emotion_examples_path: PathBuf::from("./data/emotions_train.csv"),
            sentiment_examples_path: PathBuf::from("./data/training_senti.csv"),
            output_path: PathBuf::from("./data/final.csv"),
            model_cache_dir: PathBuf::from("./models"),
            sentiment_url: None,
            emotion_url: None,
            topic_url: None,
            inference_token: None,
            request_timeout_secs: 60,
            topic_timeout_secs: 900,
            max_concurrent_requests: 4,
            max_retries: 2,
            retry_backoff_base_ms: 500,
            emotion_labels: vec!["joy".to_string()],
            min_topic_corpus: 1,
        }
    }

    #[test]
    fn overrides_replace_only_given_paths() {
        let mut config = config();
        let original_input = config.input_path.clone();
        PathOverrides {
            input: None,
            output: Some(PathBuf::from("/tmp/out.csv")),
            model_cache_dir: None,
        }
        .apply(&mut config);
        assert_eq!(config.input_path, original_input);
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
    }

    #[test]
    fn models_need_every_endpoint_url() {
        let mut config = config();
        config.sentiment_url = Some("http://localhost:8080/sentiment".to_string());
        let err = Models::from_app_config(&config).err().unwrap();
        assert!(
            matches!(
                err,
                PipelineError::Config(tweetscope_core::ConfigError::MissingEnvVar(ref v))
                    if v == "TWEETSCOPE_EMOTION_URL"
            ),
            "got: {err:?}"
        );
    }
}
