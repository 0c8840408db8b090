//! Conversation and message handler integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;
use telecare_conversations::ConversationStore;
use telecare_llm::{LlmError, ScriptedLlmService};

use crate::common::{anonymous_request, authed_request, parse_body, TestApp};

mod test_create_conversation {
    use super::*;

    #[tokio::test]
    async fn test_create_conversation_returns_201_with_greeting() {
        let app = TestApp::new(ScriptedLlmService::new());
        let patient = app.patient();

        let resp = app
            .send(authed_request(
                Method::POST,
                "/v1/conversations",
                &patient.token,
                Some(json!({"name": "Headache"})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert_eq!(body["conversation"]["name"], "Headache");
        assert_eq!(body["conversation"]["kind"], "automated");
        assert_eq!(body["conversation"]["is_doctor_active"], false);
        assert_eq!(body["messages"][0]["role"], "assistant");
        assert_eq!(
            body["messages"][0]["content"],
            "Hello, what brings you in today?"
        );
    }

    #[tokio::test]
    async fn test_create_conversation_name_too_long() {
        let app = TestApp::new(ScriptedLlmService::new());
        let patient = app.patient();

        let resp = app
            .send(authed_request(
                Method::POST,
                "/v1/conversations",
                &patient.token,
                Some(json!({"name": "a".repeat(201)})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_doctor_cannot_create_conversation() {
        let app = TestApp::new(ScriptedLlmService::new());
        let doctor = app.doctor();

        let resp = app
            .send(authed_request(
                Method::POST,
                "/v1/conversations",
                &doctor.token,
                Some(json!({})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_requires_authentication() {
        let app = TestApp::new(ScriptedLlmService::new());
        let resp = app
            .send(anonymous_request(
                Method::POST,
                "/v1/conversations",
                Some(json!({})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

mod test_read_conversation {
    use super::*;

    #[tokio::test]
    async fn test_list_returns_only_own_conversations() {
        let app = TestApp::new(ScriptedLlmService::new());
        let alice = app.patient();
        let bob = app.patient();
        app.start_chat(&alice).await;
        app.start_chat(&alice).await;
        app.start_chat(&bob).await;

        let resp = app
            .send(authed_request(
                Method::GET,
                "/v1/conversations",
                &alice.token,
                None,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list
            .iter()
            .all(|c| c["user_id"] == alice.id().to_string()));
    }

    #[tokio::test]
    async fn test_get_other_patients_conversation_is_404() {
        let app = TestApp::new(ScriptedLlmService::new());
        let alice = app.patient();
        let bob = app.patient();
        let id = app.start_chat(&alice).await;

        let resp = app
            .send(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &bob.token,
                None,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let app = TestApp::new(ScriptedLlmService::new());
        let patient = app.patient();
        let id = app.start_chat(&patient).await;

        let resp = app
            .send(authed_request(
                Method::DELETE,
                &format!("/v1/conversations/{}", id),
                &patient.token,
                None,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(app.store.find_conversation(id).await.unwrap().is_none());

        let resp = app
            .send(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}/messages", id),
                &patient.token,
                None,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_send_message {
    use super::*;

    #[tokio::test]
    async fn test_send_message_returns_reply() {
        let app = TestApp::new(ScriptedLlmService::new().reply("Please rest and hydrate."));
        let patient = app.patient();
        let id = app.start_chat(&patient).await;

        let resp = app
            .send(authed_request(
                Method::POST,
                &format!("/v1/conversations/{}/messages", id),
                &patient.token,
                Some(json!({"content": "I have a headache"})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert_eq!(body["outcome"], "replied");
        assert_eq!(body["content"], "Please rest and hydrate.");
        assert!(body["notice"].is_null());

        let messages = body["conversation"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["sequence"], 2);
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["sequence"], 3);

        let resp = app
            .send(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}/messages", id),
                &patient.token,
                None,
            ))
            .await;
        let listed = parse_body(resp).await;
        assert_eq!(listed.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let app = TestApp::new(ScriptedLlmService::new());
        let patient = app.patient();
        let id = app.start_chat(&patient).await;

        let resp = app
            .send(authed_request(
                Method::POST,
                &format!("/v1/conversations/{}/messages", id),
                &patient.token,
                Some(json!({"content": "   "})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        assert_eq!(body["outcome"], "ignored");
        assert_eq!(app.llm.call_count(), 0);
        assert_eq!(app.store.list_messages(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_returns_fallback() {
        let app = TestApp::new(
            ScriptedLlmService::new().fail(LlmError::Request("timeout".to_string())),
        );
        let patient = app.patient();
        let id = app.start_chat(&patient).await;

        let resp = app
            .send(authed_request(
                Method::POST,
                &format!("/v1/conversations/{}/messages", id),
                &patient.token,
                Some(json!({"content": "Hello"})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        assert_eq!(body["outcome"], "fallback");
        assert_eq!(body["notice"], "Sorry, something went wrong.");
        let messages = body["conversation"]["messages"].as_array().unwrap();
        assert_eq!(messages.last().unwrap()["content"], "Sorry, something went wrong.");
        assert_eq!(app.store.list_messages(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stranger_cannot_send() {
        let app = TestApp::new(ScriptedLlmService::new());
        let owner = app.patient();
        let stranger = app.patient();
        let id = app.start_chat(&owner).await;

        let resp = app
            .send(authed_request(
                Method::POST,
                &format!("/v1/conversations/{}/messages", id),
                &stranger.token,
                Some(json!({"content": "Hello"})),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.llm.call_count(), 0);
    }
}
