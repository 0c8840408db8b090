//! Router-level tests for the Telecare API

mod chat_shim;
mod common;
mod conversations;
mod escalation;
mod profiles;
mod summaries;

use axum::http::{Method, StatusCode};
use telecare_llm::ScriptedLlmService;

use crate::common::{anonymous_request, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new(ScriptedLlmService::new());
    let resp = app
        .send(anonymous_request(Method::GET, "/health", None))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}
