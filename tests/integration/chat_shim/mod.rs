//! `/api/chat` integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;
use telecare_conversations::{ConversationStore, EscalationSummary, SummaryDigest};
use telecare_llm::{LlmError, LlmRole, ScriptedLlmService};
use uuid::Uuid;

use crate::common::{anonymous_request, parse_body, TestApp};

#[test_log::test(tokio::test)]
async fn test_chat_returns_message() {
    let app = TestApp::new(ScriptedLlmService::new().reply("Drink plenty of fluids."));

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!({
                "messages": [
                    {"role": "doctor", "content": "Hello, what brings you in today?"},
                    {"role": "user", "content": "I have a cold"},
                    {"role": "doctor", "content": ""}
                ]
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["message"], "Drink plenty of fluids.");

    let request = &app.llm.calls()[0];
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, LlmRole::Assistant);
    assert_eq!(request.messages[1].role, LlmRole::User);
    assert_eq!(request.max_tokens, Some(500));
    assert!(request.system_prompt.is_some());
}

#[tokio::test]
async fn test_chat_accepts_bare_array() {
    let app = TestApp::new(ScriptedLlmService::new().reply("ok"));

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!([{"role": "user", "content": "Hi"}])),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_missing_messages_is_400() {
    let app = TestApp::new(ScriptedLlmService::new());

    for body in [json!({}), json!({"messages": []})] {
        let resp = app
            .send(anonymous_request(Method::POST, "/api/chat", Some(body)))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = parse_body(resp).await;
        assert!(body["error"].is_string());
    }
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_blank_history_is_400() {
    let app = TestApp::new(ScriptedLlmService::new());

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!({
                "messages": [
                    {"role": "user", "content": "   "},
                    {"role": "doctor", "content": ""}
                ]
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = parse_body(resp).await;
    assert_eq!(body["error"], "messages are required");
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_unknown_chat_is_404() {
    let app = TestApp::new(ScriptedLlmService::new());

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!({
                "messages": [{"role": "user", "content": "Hi"}],
                "chatId": Uuid::new_v4()
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_doctor_active_is_409() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let id = app.start_chat(&patient).await;
    app.store
        .escalate(&EscalationSummary::new(
            patient.id(),
            Some(id),
            SummaryDigest {
                summary: "Cough".to_string(),
                issue_title: "Cough".to_string(),
            },
        ))
        .await
        .unwrap();

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!({
                "messages": [{"role": "user", "content": "Hi"}],
                "chatId": id
            })),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_gateway_failure_is_500() {
    let app = TestApp::new(ScriptedLlmService::new().fail(LlmError::RateLimit));

    let resp = app
        .send(anonymous_request(
            Method::POST,
            "/api/chat",
            Some(json!({"messages": [{"role": "user", "content": "Hi"}]})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = parse_body(resp).await;
    assert_eq!(body["error"], "Failed to get response");
}
