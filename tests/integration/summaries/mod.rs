//! Doctor pickup integration tests

use axum::http::{Method, StatusCode};
use telecare_conversations::{ConversationStore, EscalationSummary, SummaryDigest};
use telecare_llm::ScriptedLlmService;
use uuid::Uuid;

use crate::common::{authed_request, parse_body, TestApp};

fn orphan_summary(patient: Uuid) -> EscalationSummary {
    EscalationSummary::new(
        patient,
        None,
        SummaryDigest {
            summary: "Sprained ankle while running".to_string(),
            issue_title: "Ankle sprain".to_string(),
        },
    )
}

#[tokio::test]
async fn test_doctor_lists_open_summaries() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let doctor = app.doctor();
    app.store.insert_summary(orphan_summary(patient.id()));

    let resp = app
        .send(authed_request(Method::GET, "/v1/summaries", &doctor.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["issue_title"], "Ankle sprain");
    assert!(body[0]["chat_id"].is_null());
}

#[tokio::test]
async fn test_patient_cannot_list_summaries() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();

    let resp = app
        .send(authed_request(Method::GET, "/v1/summaries", &patient.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unverified_doctor_is_rejected() {
    let app = TestApp::new(ScriptedLlmService::new());
    let doctor = app.doctor_with_verification(false);

    let resp = app
        .send(authed_request(Method::GET, "/v1/summaries", &doctor.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_claim_orphan_summary_opens_doctor_chat() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let doctor = app.doctor();
    let summary = orphan_summary(patient.id());
    app.store.insert_summary(summary.clone());

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/summaries/{}/claim", summary.id),
            &doctor.token,
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["conversation"]["kind"], "doctor_patient");
    assert_eq!(body["conversation"]["user_id"], patient.id().to_string());
    assert_eq!(body["conversation"]["doctor_id"], doctor.id().to_string());
    assert_eq!(body["conversation"]["is_doctor_active"], true);
    assert_eq!(body["messages"][0]["role"], "doctor");

    let linked = app.store.find_summary(summary.id).await.unwrap().unwrap();
    assert!(linked.chat_id.is_some());

    // The patient sees the new chat and writes into it without an automated reply
    let resp = app
        .send(authed_request(
            Method::GET,
            "/v1/conversations",
            &patient.token,
            None,
        ))
        .await;
    let chats = parse_body(resp).await;
    assert_eq!(chats.as_array().unwrap().len(), 1);

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/messages", linked.chat_id.unwrap()),
            &patient.token,
            Some(serde_json::json!({"content": "Thanks for picking this up"})),
        ))
        .await;
    let sent = parse_body(resp).await;
    assert_eq!(sent["outcome"], "awaiting_doctor");
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_claim_unknown_summary_is_404() {
    let app = TestApp::new(ScriptedLlmService::new());
    let doctor = app.doctor();

    let resp = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/summaries/{}/claim", Uuid::new_v4()),
            &doctor.token,
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_doctor_claim_conflicts() {
    let app = TestApp::new(ScriptedLlmService::new());
    let patient = app.patient();
    let summary = orphan_summary(patient.id());
    app.store.insert_summary(summary.clone());
    let uri = format!("/v1/summaries/{}/claim", summary.id);

    let first = app.doctor();
    let resp = app
        .send(authed_request(Method::POST, &uri, &first.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let second = app.doctor();
    let resp = app
        .send(authed_request(Method::POST, &uri, &second.token, None))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
