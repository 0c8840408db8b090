//! Common test utilities and fixtures for integration tests
//!
//! Builds the full application router over in-memory collaborators:
//! - `InMemoryConversationStore` as the conversation store
//! - `InMemoryUserDirectory` as the identity read model
//! - `ScriptedLlmService` as the completion gateway
//! - `InMemoryProfileStore` as the profile store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use telecare_accounts::{AccountsState, InMemoryProfileStore, UserProfile};
use telecare_auth::{issue_token, AuthBackend, AuthConfig, AuthIdentity, InMemoryUserDirectory};
use telecare_conversations::{ConversationsState, InMemoryConversationStore};
use telecare_llm::ScriptedLlmService;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only"; // pragma: allowlist secret

/// A user known to the directory together with a valid bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub identity: AuthIdentity,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.identity.id
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryConversationStore>,
    pub llm: Arc<ScriptedLlmService>,
    pub profiles: Arc<InMemoryProfileStore>,
    directory: Arc<InMemoryUserDirectory>,
    auth_config: AuthConfig,
}

impl TestApp {
    pub fn new(llm: ScriptedLlmService) -> Self {
        Self {
            store: Arc::new(InMemoryConversationStore::new()),
            llm: Arc::new(llm),
            profiles: Arc::new(InMemoryProfileStore::new()),
            directory: Arc::new(InMemoryUserDirectory::new()),
            auth_config: AuthConfig {
                jwt_secret: TEST_JWT_SECRET.to_string(),
                issuer: Some("telecare-test".to_string()),
                audience: Some("authenticated".to_string()),
            },
        }
    }

    /// Full application router, as served by the binary minus CORS
    pub fn router(&self) -> Router {
        let auth = AuthBackend::new(self.directory.clone(), self.auth_config.clone());
        let conversations =
            ConversationsState::new(self.store.clone(), auth.clone(), self.llm.clone());
        let accounts = AccountsState::new(self.profiles.clone(), auth);
        telecare_app::router(conversations, accounts)
    }

    fn register(&self, identity: AuthIdentity) -> TestUser {
        let token = issue_token(identity.id, &identity.email, &self.auth_config).unwrap();
        self.directory.insert(identity.clone());
        self.profiles.insert(UserProfile::new(&identity));
        TestUser { identity, token }
    }

    pub fn patient(&self) -> TestUser {
        let id = Uuid::new_v4();
        self.register(AuthIdentity::patient(
            id,
            format!("patient_{}@telecare.test", id.simple()),
        ))
    }

    pub fn doctor(&self) -> TestUser {
        self.doctor_with_verification(true)
    }

    pub fn doctor_with_verification(&self, verified: bool) -> TestUser {
        let id = Uuid::new_v4();
        self.register(AuthIdentity::doctor(
            id,
            format!("doctor_{}@telecare.test", id.simple()),
            verified,
        ))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router().oneshot(request).await.unwrap()
    }

    /// Create a chat as `user` and return its id
    pub async fn start_chat(&self, user: &TestUser) -> Uuid {
        let resp = self
            .send(authed_request(
                Method::POST,
                "/v1/conversations",
                &user.token,
                Some(serde_json::json!({})),
            ))
            .await;
        let body = parse_body(resp).await;
        body["conversation"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap()
    }
}

/// Helper: build an authenticated request
pub fn authed_request(method: Method, uri: &str, jwt: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", jwt));

    with_body(builder, body)
}

/// Helper: build a request without credentials
pub fn anonymous_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    with_body(Request::builder().method(method).uri(uri), body)
}

fn with_body(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
