//! HTTP surface: health, presentation data and the SSE chat endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use geminichat::{
    create_router, format_error, ChatClient, Container, ContainerConfig, MockChatClient,
    ModelConfig, MODEL_UNAVAILABLE_MESSAGE,
};

fn app(client: Option<MockChatClient>) -> (axum::Router, Arc<Container>) {
    let container = Arc::new(Container::with_client(
        client.map(|c| Arc::new(c) as Arc<dyn ChatClient>),
        ContainerConfig::new(ModelConfig::default()),
    ));
    (create_router(container.clone()), container)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn chat_request(json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// `(event, data)` pairs of an SSE body, keep-alive comments skipped.
fn parse_sse(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| {
            let mut event = "message".to_string();
            let mut data = Vec::new();
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = name.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
            }
            if block.lines().all(|l| l.starts_with(':')) {
                None
            } else {
                Some((event, data.join("\n")))
            }
        })
        .collect()
}

fn snapshot_texts(events: &[(String, String)]) -> Vec<String> {
    events
        .iter()
        .filter(|(event, _)| event == "message")
        .map(|(_, data)| {
            let json: serde_json::Value = serde_json::from_str(data).unwrap();
            json["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_health_reports_model_availability() {
    let (app, _) = app(None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_available"], false);
    assert_eq!(json["model"], "gemini-1.5-flash");
}

#[tokio::test]
async fn test_health_names_the_client_serving_replies() {
    let (app, _) = app(Some(MockChatClient::new()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["model_available"], true);
    assert_eq!(json["model"], "mock");
}

#[tokio::test]
async fn test_presentation_lists_three_examples() {
    let (app, _) = app(Some(MockChatClient::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/presentation")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["title"], "✨ Gemini Chatbot");
    assert_eq!(json["examples"].as_array().unwrap().len(), 3);
    assert_eq!(json["chatbot_height"], 500);
}

#[tokio::test]
async fn test_index_serves_the_widget() {
    let (app, _) = app(None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("/api/chat"));
}

#[tokio::test]
async fn test_chat_streams_session_snapshots_and_done() {
    let (app, _) = app(Some(MockChatClient::with_chunks(["Hi", " there", "!"])));

    let response = app
        .oneshot(chat_request(serde_json::json!({
            "message": "hello",
            "session_id": "tab-1",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let events = parse_sse(&body_string(response).await);
    assert_eq!(events.first().unwrap(), &("session".to_string(), "tab-1".to_string()));
    assert_eq!(events.last().unwrap().0, "done");
    assert_eq!(snapshot_texts(&events), vec!["Hi", "Hi there", "Hi there!"]);
}

#[tokio::test]
async fn test_chat_mints_session_when_missing() {
    let (app, container) = app(Some(MockChatClient::new()));

    let response = app
        .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();

    let events = parse_sse(&body_string(response).await);
    let (event, session_id) = &events[0];
    assert_eq!(event, "session");
    assert!(!session_id.is_empty());
    assert_eq!(container.conversation_store().session_count().await, 1);
}

#[tokio::test]
async fn test_chat_replaces_session_id_with_control_characters() {
    let (app, container) = app(Some(MockChatClient::new()));

    let response = app
        .oneshot(chat_request(serde_json::json!({
            "message": "hello",
            "session_id": "a\rb",
        })))
        .await
        .unwrap();

    let body = body_string(response).await;
    let events = parse_sse(&body);
    let (event, session_id) = &events[0];
    assert_eq!(event, "session");
    assert!(!session_id.chars().any(char::is_control));
    assert_ne!(session_id, "a\rb");
    assert_eq!(container.conversation_store().session_count().await, 1);
}

#[tokio::test]
async fn test_index_only_records_completed_exchanges() {
    let (app, _) = app(None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let page = body_string(response).await;
    assert!(page.contains(r#"event === "done""#));
    assert!(page.contains(&format_error("")));
    let unavailable_prefix = MODEL_UNAVAILABLE_MESSAGE.split(':').next().unwrap();
    assert!(page.contains(&format!("{unavailable_prefix}: ")));
}

#[tokio::test]
async fn test_chat_reuses_session_history() {
    let client = Arc::new(MockChatClient::with_chunks(["ok"]));
    let container = Arc::new(Container::with_client(
        Some(client.clone() as Arc<dyn ChatClient>),
        ContainerConfig::new(ModelConfig::default()),
    ));

    for message in ["first", "second"] {
        let response = create_router(container.clone())
            .oneshot(chat_request(serde_json::json!({
                "message": message,
                "session_id": "tab-1",
                "history": [["earlier", "ignored"]],
            })))
            .await
            .unwrap();
        body_string(response).await;
    }

    let received = client.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1].0.len(), 2);
    assert_eq!(received[1].0[0].text(), "first");
}

#[tokio::test]
async fn test_chat_with_unavailable_model_sends_fixed_message() {
    let (app, _) = app(None);

    let response = app
        .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();

    let events = parse_sse(&body_string(response).await);
    assert_eq!(
        snapshot_texts(&events),
        vec!["🔴 Error: The AI model could not be loaded. Please check the API key."]
    );
}

#[tokio::test]
async fn test_chat_failure_is_delivered_as_last_snapshot() {
    let (app, _) = app(Some(MockChatClient::failing_after(["Sure, "], "rate limited")));

    let response = app
        .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let events = parse_sse(&body_string(response).await);
    assert_eq!(
        snapshot_texts(&events),
        vec!["Sure, ", "❌ An error occurred: rate limited"]
    );
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let (app, _) = app(Some(MockChatClient::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
