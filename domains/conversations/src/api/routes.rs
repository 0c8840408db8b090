//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{chat, conversations, escalations, events, messages, summaries};
use super::middleware::ConversationsState;

/// Create conversation routes
fn conversation_routes() -> Router<ConversationsState> {
    Router::new()
        .route(
            "/v1/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/v1/conversations/{id}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route(
            "/v1/conversations/{id}/events",
            get(events::conversation_events),
        )
        .route(
            "/v1/conversations/{id}/escalate",
            post(escalations::request_human_doctor),
        )
}

/// Create message routes
fn message_routes() -> Router<ConversationsState> {
    Router::new().route(
        "/v1/conversations/{conversation_id}/messages",
        get(messages::list_messages).post(messages::send_message),
    )
}

/// Create doctor pickup routes
fn summary_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/summaries", get(summaries::list_open_summaries))
        .route("/v1/summaries/{id}/claim", post(summaries::claim_summary))
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .route("/api/chat", post(chat::chat))
        .merge(conversation_routes())
        .merge(message_routes())
        .merge(summary_routes())
}
