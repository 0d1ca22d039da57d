//! HTTP clients for hosted classification models.
//!
//! Both clients speak the Hugging Face Inference API JSON shapes, which are
//! also served by self-hosted inference containers:
//!
//! - text classification: `{"inputs": "..."}` answered with
//!   `[[{"label": "POSITIVE", "score": 0.99}, ...]]` (or the flat variant);
//! - zero-shot classification: `{"inputs": "...", "parameters":
//!   {"candidate_labels": [...]}}` answered with
//!   `{"sequence": "...", "labels": [...], "scores": [...]}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::classifier::{EmotionClassifier, LabelScore, SentimentClassifier};
use crate::error::LabelError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const USER_AGENT: &str = "tweetscope/0.1 (tweet-annotation)";

/// Longest slice of an error body kept in [`LabelError::Status`].
const ERROR_BODY_LIMIT: usize = 300;

/// Connection settings shared by the model endpoint clients.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub token: Option<String>,
    pub retry: RetryPolicy,
}

/// Build the `reqwest` client used for model and topic endpoints.
pub(crate) fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
}

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

struct Endpoint {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl Endpoint {
    fn new(config: EndpointConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
            config,
        })
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        body: &B,
    ) -> Result<serde_json::Value, LabelError> {
        retry_with_backoff(self.config.retry, || async move {
            let mut request = self.client.post(&self.config.url).json(body);
            if let Some(token) = &self.config.token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LabelError::Status {
                    status: status.as_u16(),
                    body: truncate_body(&body),
                });
            }
            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| LabelError::MalformedResponse(format!("response is not JSON: {e}")))
        })
        .await
    }
}

#[derive(Serialize)]
struct TextClassificationRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawLabelScore {
    label: String,
    score: f32,
}

/// Binary sentiment classifier behind an HTTP text-classification endpoint.
pub struct HttpSentimentClassifier {
    endpoint: Endpoint,
}

impl HttpSentimentClassifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: EndpointConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

/// Flatten any of the text-classification response shapes into label scores.
fn parse_text_classification(value: serde_json::Value) -> Result<Vec<LabelScore>, LabelError> {
    let malformed = |e: serde_json::Error| LabelError::MalformedResponse(e.to_string());
    let raw: Vec<RawLabelScore> = match value {
        serde_json::Value::Array(items) if items.first().is_some_and(serde_json::Value::is_array) => {
            let nested: Vec<Vec<RawLabelScore>> =
                serde_json::from_value(serde_json::Value::Array(items)).map_err(malformed)?;
            nested.into_iter().next().unwrap_or_default()
        }
        serde_json::Value::Array(items) => {
            serde_json::from_value(serde_json::Value::Array(items)).map_err(malformed)?
        }
        obj @ serde_json::Value::Object(_) => vec![serde_json::from_value(obj).map_err(malformed)?],
        other => {
            return Err(LabelError::MalformedResponse(format!(
                "unexpected classification payload: {other}"
            )))
        }
    };
    Ok(raw
        .into_iter()
        .map(|r| LabelScore {
            label: r.label,
            score: r.score,
        })
        .collect())
}

#[async_trait]
impl SentimentClassifier for HttpSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<LabelScore, LabelError> {
        let value = self
            .endpoint
            .post_json(&TextClassificationRequest { inputs: text })
            .await?;
        parse_text_classification(value)?
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| LabelError::MalformedResponse("no labels returned".to_string()))
    }
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}

/// Zero-shot classifier behind an HTTP zero-shot-classification endpoint.
pub struct HttpZeroShotClassifier {
    endpoint: Endpoint,
}

impl HttpZeroShotClassifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: EndpointConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

fn parse_zero_shot(value: serde_json::Value) -> Result<Vec<LabelScore>, LabelError> {
    // Some servers wrap single inputs in a one-element list.
    let value = match value {
        serde_json::Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    let response: ZeroShotResponse = serde_json::from_value(value)
        .map_err(|e| LabelError::MalformedResponse(e.to_string()))?;
    if response.labels.len() != response.scores.len() {
        return Err(LabelError::MalformedResponse(format!(
            "{} labels but {} scores",
            response.labels.len(),
            response.scores.len()
        )));
    }
    Ok(response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| LabelScore { label, score })
        .collect())
}

#[async_trait]
impl EmotionClassifier for HttpZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<Vec<LabelScore>, LabelError> {
        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters { candidate_labels },
        };
        let value = self.endpoint.post_json(&request).await?;
        parse_zero_shot(value)
    }
}
