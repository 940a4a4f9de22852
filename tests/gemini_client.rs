mod common;

use common::{ANALYSIS_JSON, CSV};
use csv_financial_analyst::*;
use httpmock::{Method::POST, MockServer};
use serde_json::json;

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn config_for(server: &MockServer) -> AnalystConfig {
    AnalystConfig::new("test-key").with_base_url(format!("{}/v1beta", server.base_url()))
}

fn candidate_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn offline_analysis_end_to_end() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .header("x-goog-api-key", "test-key")
            .header("content-type", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .body(candidate_body(ANALYSIS_JSON));
    });

    let client = AnalysisClient::new(config_for(&server)).unwrap();
    let analysis = client.analyze_financial_data(CSV, None).await.unwrap();

    mock.assert();
    assert_eq!(analysis.income_statement.len(), 5);
    assert_eq!(analysis.key_risks[0].risk, "Rising operating costs");
}

#[tokio::test]
async fn offline_text_parts_are_joined() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(
                json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": "Net income " }, { "text": "should rise.\n" }]
                        }
                    }]
                })
                .to_string(),
            );
    });

    let client = AnalysisClient::new(config_for(&server)).unwrap();
    let forecast = client.get_updated_forecast(CSV, 3.0, 1.0).await.unwrap();

    mock.assert();
    assert_eq!(forecast, "Net income should rise.");
}

#[tokio::test]
async fn offline_http_error_is_opaque() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(429)
            .header("content-type", "application/json")
            .body(r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#);
    });

    let client = AnalysisClient::new(config_for(&server)).unwrap();

    let err = client.analyze_financial_data(CSV, None).await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::Transport));
    assert!(!err.to_string().contains("exhausted"));

    assert!(client.get_outlets(CSV).await.is_empty());

    mock.assert_hits(2);
}

#[tokio::test]
async fn offline_blocked_prompt_fails_query() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
    });

    let client = AnalysisClient::new(config_for(&server)).unwrap();
    let err = client.query_data(CSV, "Who is the owner?").await.unwrap_err();

    mock.assert();
    assert!(matches!(
        err,
        AnalystError::QueryFailed {
            kind: FailureKind::Transport
        }
    ));
}

#[tokio::test]
async fn offline_gemini_client_reports_status() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-2.5-pro:generateContent");
        then.status(500).body("internal");
    });

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-pro")
        .with_base_url(&format!("{}/v1beta", server.base_url()));
    let err = client
        .generate(&InferenceRequest::new("hello").json())
        .await
        .unwrap_err();

    match err {
        InferenceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn offline_empty_candidates() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#);
    });

    let client = GeminiClient::from_config(&config_for(&server));
    let err = client
        .generate(&InferenceRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::EmptyResponse(reason) if reason == "MAX_TOKENS"));
}

#[tokio::test]
async fn offline_transport_error_hides_api_key() {
    // Nothing listens on the discard port.
    let client = GeminiClient::new("SUPERSECRETKEY".to_string(), "gemini-2.5-flash")
        .with_base_url("http://127.0.0.1:9/v1beta");
    let err = client
        .generate(&InferenceRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::Http(_)));
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
    assert!(!format!("{:?}", err).contains("SUPERSECRETKEY"));
    assert!(!err.to_string().contains("generateContent"));
}

#[tokio::test]
async fn offline_failed_analysis_hides_api_key() {
    let config = AnalystConfig::new("SUPERSECRETKEY").with_base_url("http://127.0.0.1:9/v1beta");
    let client = AnalysisClient::new(config).unwrap();

    let err = client.analyze_financial_data(CSV, None).await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::Transport));
    assert!(!format!("{} {:?}", err, err).contains("SUPERSECRETKEY"));
    assert!(client.get_outlets(CSV).await.is_empty());
}
