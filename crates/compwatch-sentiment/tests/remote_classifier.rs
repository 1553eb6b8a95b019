//! Integration tests for the remote classifier and `analyze_file`.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use compwatch_core::{
    read_dataset, write_dataset, AnalysisSettings, ClassifierKind, CleanRecord, EnrichedRecord,
    Schema, SentimentLabel,
};
use compwatch_sentiment::{
    analyze_file, run_analyze, AnalysisError, Classifier, LexiconClassifier, RemoteClassifier,
    SentimentClassifier,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn clean(id: &str, description: &str) -> CleanRecord {
    CleanRecord {
        id: Some(id.to_owned()),
        name: format!("Item {id}"),
        price: 5.0,
        description: Some(description.to_owned()),
        category: "Misc".to_owned(),
        collected_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn connect_fails_when_health_probe_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = RemoteClassifier::connect(&server.uri(), Duration::from_secs(5)).await;

    assert!(
        matches!(result, Err(AnalysisError::ClassifierInit { .. })),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn connect_fails_when_server_is_down() {
    let result = RemoteClassifier::connect("http://127.0.0.1:9", Duration::from_secs(2)).await;
    assert!(matches!(result, Err(AnalysisError::ClassifierInit { .. })));
}

#[tokio::test]
async fn single_and_ranked_predictions_are_understood() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({"inputs": ["good", "meh"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "POSITIVE", "score": 0.98},
            [
                {"label": "LABEL_0", "score": 0.1},
                {"label": "LABEL_1", "score": 0.7},
                {"label": "LABEL_2", "score": 0.2}
            ]
        ])))
        .mount(&server)
        .await;

    let classifier = RemoteClassifier::connect(&server.uri(), Duration::from_secs(5))
        .await
        .unwrap();
    let predictions = classifier.classify_batch(&["good", "meh"]).await.unwrap();

    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].label, "POSITIVE");
    assert_eq!(predictions[1].label, "LABEL_1");
}

#[tokio::test]
async fn server_error_on_predict_is_a_classifier_error() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let classifier = RemoteClassifier::connect(&server.uri(), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(classifier.classify_batch(&["x"]).await.is_err());
}

#[tokio::test]
async fn run_analyze_with_remote_backend_writes_enriched_file() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "NEGATIVE", "score": 0.91},
            {"label": "5 stars", "score": 0.66}
        ])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("products_clean.csv");
    let output = dir.path().join("products_analyzed.csv");
    write_dataset(&input, Schema::Cleaned, &[clean("1", "meh"), clean("2", "wow")]).unwrap();

    let settings = AnalysisSettings {
        classifier: ClassifierKind::Remote,
        remote_url: Some(server.uri()),
        ..AnalysisSettings::default()
    };
    let report = run_analyze(&settings, &input, &output).await.unwrap();

    assert_eq!(report.rows, 2);
    assert_eq!(report.classifier, "remote");
    let rows: Vec<EnrichedRecord> = read_dataset(&output, Schema::Enriched).unwrap();
    assert_eq!(rows[0].sentiment_label, SentimentLabel::Negative);
    assert!((rows[0].sentiment_score - 0.91).abs() < 1e-9);
    assert_eq!(rows[1].sentiment_label, SentimentLabel::Positive);
}

#[tokio::test]
async fn analyze_file_rejects_raw_schema_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("wrong.csv");
    std::fs::write(&input, "sku,title\n1,x\n").unwrap();

    let result = analyze_file(
        Classifier::Lexicon(LexiconClassifier::new(0.1)),
        &AnalysisSettings::default(),
        &input,
        &dir.path().join("out.csv"),
    )
    .await;

    assert!(matches!(result, Err(AnalysisError::Schema(_))));
}
