//! Telecare application composition root
//!
//! Wires the stores, identity backend and completion gateway into the
//! Conversations and Accounts domain routers and adds shared
//! infrastructure routes.

use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use sqlx::PgPool;
use telecare_accounts::{AccountsRepositories, AccountsState};
use telecare_auth::{AuthBackend, AuthConfig};
use telecare_common::config::Config;
use telecare_conversations::{ConversationsRepositories, ConversationsState};
use telecare_llm::{LlmConfig, LlmServiceFactory};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

/// Upper bound on request bodies; message content is capped well below this
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all routes and middleware
pub async fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let auth = AuthBackend::postgres(
        pool.clone(),
        AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        },
    );

    let llm_config = LlmConfig::from_env()?;
    let llm = LlmServiceFactory::create(llm_config)?;

    let accounts = AccountsState::new(
        Arc::new(AccountsRepositories::new(pool.clone())),
        auth.clone(),
    );
    let conversations = ConversationsState::new(
        Arc::new(ConversationsRepositories::new(pool)),
        auth,
        Arc::from(llm),
    );

    Ok(router(conversations, accounts)
        .layer(build_cors_layer(config.cors_allowed_origins.as_deref())))
}

/// Domain routes plus health checks, without CORS
pub fn router(conversations: ConversationsState, accounts: AccountsState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Telecare API v0.1.0" }),
        )
        .merge(telecare_conversations::routes().with_state(conversations))
        .merge(telecare_accounts::routes().with_state(accounts))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Permissive when no origins are configured, otherwise an explicit allow-list
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
