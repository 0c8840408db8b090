//! Escalation and doctor hand-off integration tests

use axum::http::{Method, StatusCode};
use futures_util::StreamExt;
use serde_json::json;
use telecare_conversations::{ConversationStore, ResponderRole};
use telecare_llm::{LlmError, ScriptedLlmService};

use crate::common::{authed_request, parse_body, TestApp};

#[tokio::test]
async fn test_escalation_switches_chat_to_doctor() {
    let app = TestApp::new(
        ScriptedLlmService::new()
            .reply("Try resting in a dark room.")
            .reply(r#"{"summary": "Migraine for two days", "issueTitle": "Migraine"}"#),
    );
    let patient = app.patient();
    let id = app.start_chat(&patient).await;

    app.send(authed_request(
        Method::POST,
        &format!("/v1/conversations/{}/messages", id),
        &patient.token,
        Some(json!({"content": "My head hurts"})),
    ))
    .await;

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/escalate", id),
            &patient.token,
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let summary = parse_body(resp).await;
    assert_eq!(summary["issue_title"], "Migraine");
    assert_eq!(summary["summary"], "Migraine for two days");
    assert_eq!(summary["chat_id"], id.to_string());
    assert_eq!(summary["is_doctor_active"], true);

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/messages", id),
            &patient.token,
            Some(json!({"content": "Is anyone there?"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = parse_body(resp).await;
    assert_eq!(body["outcome"], "awaiting_doctor");
    assert_eq!(body["notice"], "A doctor will respond to your message shortly.");
    assert_eq!(body["conversation"]["conversation"]["is_doctor_active"], true);
    assert_eq!(app.llm.call_count(), 2);

    let stored = app.store.list_messages(id).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[3].role, ResponderRole::Patient);
}

#[tokio::test]
async fn test_escalating_twice_is_conflict() {
    let app = TestApp::new(ScriptedLlmService::new().reply("Summary text"));
    let patient = app.patient();
    let id = app.start_chat(&patient).await;
    let uri = format!("/v1/conversations/{}/escalate", id);

    let first = app
        .send(authed_request(Method::POST, &uri, &patient.token, None))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body = parse_body(first).await;
    assert_eq!(body["issue_title"], "No Title");
    assert_eq!(body["summary"], "Summary text");

    let second = app
        .send(authed_request(Method::POST, &uri, &patient.token, None))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(app.llm.call_count(), 1);
}

#[tokio::test]
async fn test_escalation_gateway_failure_writes_nothing() {
    let app = TestApp::new(
        ScriptedLlmService::new().fail(LlmError::Response("upstream error".to_string())),
    );
    let patient = app.patient();
    let id = app.start_chat(&patient).await;

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/escalate", id),
            &patient.token,
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = parse_body(resp).await;
    assert_eq!(body["error"]["code"], "GATEWAY_ERROR");

    let conv = app.store.find_conversation(id).await.unwrap().unwrap();
    assert!(!conv.is_doctor_active);
    assert!(app.store.list_open_summaries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_doctor_joins_and_patient_sees_reply() {
    let app = TestApp::new(ScriptedLlmService::new().reply(
        r#"{"summary": "Fever of 39C", "issueTitle": "Fever"}"#,
    ));
    let patient = app.patient();
    let doctor = app.doctor();
    let id = app.start_chat(&patient).await;

    app.send(authed_request(
        Method::POST,
        &format!("/v1/conversations/{}/escalate", id),
        &patient.token,
        None,
    ))
    .await;

    let mut updates = app.store.watch(id).await.unwrap();
    let first = updates.next().await.unwrap();
    assert!(first.conversation.is_doctor_active);
    assert_eq!(first.messages.len(), 1);

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/messages", id),
            &doctor.token,
            Some(json!({"content": "Hi, I'm Dr. Chen. How high is the fever now?"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = parse_body(resp).await;
    assert_eq!(body["outcome"], "delivered");
    assert_eq!(
        body["conversation"]["conversation"]["doctor_id"],
        doctor.id().to_string()
    );

    let mut latest = updates.next().await.unwrap();
    while latest.messages.len() < 2 {
        latest = updates.next().await.unwrap();
    }
    let reply = latest.messages.last().unwrap();
    assert_eq!(reply.role, ResponderRole::HumanResponder);
    assert_eq!(reply.author_id, Some(doctor.id()));

    let resp = app
        .send(authed_request(
            Method::GET,
            "/v1/conversations",
            &doctor.token,
            None,
        ))
        .await;
    let assigned = parse_body(resp).await;
    assert_eq!(assigned.as_array().unwrap().len(), 1);
    assert_eq!(assigned[0]["id"], id.to_string());
}

#[tokio::test]
async fn test_doctor_cannot_write_before_escalation() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let doctor = app.doctor();
    let id = app.start_chat(&patient).await;

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/messages", id),
            &doctor.token,
            Some(json!({"content": "Hello"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_stream_is_sse() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let id = app.start_chat(&patient).await;

    let resp = app
        .send(authed_request(
            Method::GET,
            &format!("/v1/conversations/{}/events", id),
            &patient.token,
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = resp.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.contains("event: snapshot"));
    assert!(text.contains(&id.to_string()));
}
