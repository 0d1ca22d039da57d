use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::record::DEFAULT_EMOTION_LABELS;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid. Missing endpoint URLs are
/// reported later, by the `AppConfig::require_*` accessors.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let sentiment_url = optional("TWEETSCOPE_SENTIMENT_URL");
    let emotion_url = optional("TWEETSCOPE_EMOTION_URL");
    let topic_url = optional("TWEETSCOPE_TOPIC_URL");

    let env = parse_environment(&or_default("TWEETSCOPE_ENV", "development"));
    let log_level = or_default("TWEETSCOPE_LOG_LEVEL", "info");

    let input_path = PathBuf::from(or_default(
        "TWEETSCOPE_INPUT_PATH",
        "./data/twitter_final_extract_cadmv.p",
    ));
    let emotion_examples_path = PathBuf::from(or_default(
        "TWEETSCOPE_EMOTION_EXAMPLES_PATH",
        "./data/emotions_train.csv",
    ));
    let sentiment_examples_path = PathBuf::from(or_default(
        "TWEETSCOPE_SENTIMENT_EXAMPLES_PATH",
        "./data/training_senti.csv",
    ));
    let output_path = PathBuf::from(or_default(
        "TWEETSCOPE_OUTPUT_PATH",
        "./data/final_analysis_with_predictions.csv",
    ));
    let model_cache_dir = PathBuf::from(or_default("TWEETSCOPE_MODEL_CACHE_DIR", "./models"));

    let inference_token = optional("TWEETSCOPE_INFERENCE_TOKEN");

    let request_timeout_secs = parse_positive_u64("TWEETSCOPE_REQUEST_TIMEOUT_SECS", "60")?;
    let topic_timeout_secs = parse_positive_u64("TWEETSCOPE_TOPIC_TIMEOUT_SECS", "900")?;
    let max_concurrent_requests = parse_positive_usize("TWEETSCOPE_MAX_CONCURRENT_REQUESTS", "4")?;
    let max_retries = parse_u32("TWEETSCOPE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = or_default("TWEETSCOPE_RETRY_BACKOFF_BASE_MS", "500")
        .parse::<u64>()
        .map_err(|e| invalid("TWEETSCOPE_RETRY_BACKOFF_BASE_MS", e.to_string()))?;
    let min_topic_corpus = parse_positive_usize("TWEETSCOPE_MIN_TOPIC_CORPUS", "1")?;

    let emotion_labels = match lookup("TWEETSCOPE_EMOTION_LABELS") {
        Ok(raw) => parse_label_list(&raw)
            .ok_or_else(|| invalid("TWEETSCOPE_EMOTION_LABELS", "no labels given".to_string()))?,
        Err(_) => DEFAULT_EMOTION_LABELS
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    Ok(AppConfig {
        env,
        log_level,
        input_path,
        emotion_examples_path,
        sentiment_examples_path,
        output_path,
        model_cache_dir,
        sentiment_url,
        emotion_url,
        topic_url,
        inference_token,
        request_timeout_secs,
        topic_timeout_secs,
        max_concurrent_requests,
        max_retries,
        retry_backoff_base_ms,
        emotion_labels,
        min_topic_corpus,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated label list, dropping blanks and duplicates.
fn parse_label_list(raw: &str) -> Option<Vec<String>> {
    let mut labels: Vec<String> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    (!labels.is_empty()).then_some(labels)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
