//! Integration tests for the HTTP model clients.
//!
//! Each test stands up a `wiremock` server speaking the inference API shapes,
//! so no real network traffic is made.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tweetscope_pipeline::{
    ClusteringError, EmotionClassifier, EndpointConfig, HttpSentimentClassifier, HttpTopicModel,
    HttpZeroShotClassifier, LabelError, RetryPolicy, SentimentClassifier, TopicModel,
};

fn endpoint(url: String, max_retries: u32) -> EndpointConfig {
    EndpointConfig {
        url,
        token: None,
        retry: RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        },
    }
}

fn sentiment_client(server: &MockServer) -> HttpSentimentClassifier {
    HttpSentimentClassifier::new(endpoint(server.uri(), 0)).expect("failed to build client")
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sentiment_parses_nested_response_and_picks_highest_score() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"inputs": "love this"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "NEGATIVE", "score": 0.02},
            {"label": "POSITIVE", "score": 0.98}
        ]])))
        .expect(1)
        .mount(&server)
        .await;

    let result = sentiment_client(&server).classify("love this").await;
    let top = result.expect("expected Ok");
    assert_eq!(top.label, "POSITIVE");
}

#[tokio::test]
async fn sentiment_parses_flat_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "NEGATIVE", "score": 0.91},
            {"label": "POSITIVE", "score": 0.09}
        ])))
        .mount(&server)
        .await;

    let top = sentiment_client(&server).classify("long wait").await.unwrap();
    assert_eq!(top.label, "NEGATIVE");
}

#[tokio::test]
async fn sentiment_sends_bearer_token_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer hf_secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"label": "POSITIVE", "score": 1.0}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = endpoint(server.uri(), 0);
    config.token = Some("hf_secret".to_string());
    let client = HttpSentimentClassifier::new(config).unwrap();
    assert!(client.classify("ok").await.is_ok());
}

#[tokio::test]
async fn sentiment_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
        .expect(1)
        .mount(&server)
        .await;

    let err = sentiment_client(&server).classify("x").await.unwrap_err();
    assert!(
        matches!(err, LabelError::Status { status: 400, ref body } if body == "bad input"),
        "expected Status 400, got: {err:?}"
    );
}

#[tokio::test]
async fn sentiment_retries_model_loading_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "loading"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"label": "POSITIVE", "score": 0.7}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSentimentClassifier::new(endpoint(server.uri(), 2)).unwrap();
    let top = client.classify("hi").await.expect("expected retry to succeed");
    assert_eq!(top.label, "POSITIVE");
}

#[tokio::test]
async fn sentiment_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpSentimentClassifier::new(endpoint(server.uri(), 2)).unwrap();
    let err = client.classify("hi").await.unwrap_err();
    assert!(matches!(err, LabelError::Status { status: 503, .. }));
}

#[tokio::test]
async fn sentiment_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = sentiment_client(&server).classify("x").await.unwrap_err();
    assert!(matches!(err, LabelError::MalformedResponse(_)));
}

// ---------------------------------------------------------------------------
// Zero-shot emotion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_shot_sends_candidate_labels_and_parses_scores() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "inputs": "so scared",
            "parameters": {"candidate_labels": ["joy", "fear"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequence": "so scared",
            "labels": ["fear", "joy"],
            "scores": [0.93, 0.07]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpZeroShotClassifier::new(endpoint(server.uri(), 0)).unwrap();
    let labels = vec!["joy".to_string(), "fear".to_string()];
    let scores = client.classify("so scared", &labels).await.unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].label, "fear");
}

#[tokio::test]
async fn zero_shot_server_error_surfaces_without_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpZeroShotClassifier::new(endpoint(server.uri(), 0)).unwrap();
    let err = client.classify("x", &["joy".to_string()]).await.unwrap_err();
    assert!(matches!(err, LabelError::Status { status: 500, .. }));
}

// ---------------------------------------------------------------------------
// Topic model
// ---------------------------------------------------------------------------

#[tokio::test]
async fn topic_fit_posts_documents_and_returns_topics_with_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fit"))
        .and(body_json(json!({"documents": ["dmv line", "license renewal"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "topics": [0, -1],
            "model": {"n_topics": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = HttpTopicModel::new(endpoint(format!("{}/", server.uri()), 0)).unwrap();
    let docs = vec!["dmv line".to_string(), "license renewal".to_string()];
    let fit = model.fit(&docs).await.unwrap();
    let raw: Vec<i32> = fit.topics.iter().map(|t| t.get()).collect();
    assert_eq!(raw, vec![0, -1]);
    assert_eq!(fit.artifact["n_topics"], 1);
}

#[tokio::test]
async fn topic_fit_rejects_ids_below_outlier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"topics": [-2]})))
        .mount(&server)
        .await;

    let model = HttpTopicModel::new(endpoint(server.uri(), 0)).unwrap();
    let err = model.fit(&["x".to_string()]).await.unwrap_err();
    assert!(matches!(err, ClusteringError::MalformedResponse(_)));
}

#[tokio::test]
async fn topic_fit_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fit"))
        .respond_with(ResponseTemplate::new(422).set_body_string("too few documents"))
        .mount(&server)
        .await;

    let model = HttpTopicModel::new(endpoint(server.uri(), 0)).unwrap();
    let err = model.fit(&["x".to_string()]).await.unwrap_err();
    assert!(matches!(err, ClusteringError::Status { status: 422, .. }));
}
