//! Stateless chat endpoint used by browser clients.
//!
//! Takes a message history, prepends the system prompt and returns one
//! automated reply. Nothing is persisted here. Errors use a flat
//! `{"error": "..."}` body.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use telecare_common::Error;
use telecare_llm::{CompletionRequest, LlmMessage};
use uuid::Uuid;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::ResponderRole;

const GATEWAY_FAILURE: &str = "Failed to get response";

/// One history entry; `doctor` entries count as responder turns
#[derive(Debug, Deserialize)]
pub struct ChatShimMessage {
    pub role: ResponderRole,
    pub content: String,
}

/// Either `{messages, chatId?}` or a bare message array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChatShimRequest {
    Envelope {
        #[serde(default)]
        messages: Option<Vec<ChatShimMessage>>,
        #[serde(default, rename = "chatId")]
        chat_id: Option<Uuid>,
    },
    Bare(Vec<ChatShimMessage>),
}

impl ChatShimRequest {
    fn into_parts(self) -> (Option<Vec<ChatShimMessage>>, Option<Uuid>) {
        match self {
            ChatShimRequest::Envelope { messages, chat_id } => (messages, chat_id),
            ChatShimRequest::Bare(messages) => (Some(messages), None),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatShimResponse {
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum ChatShimError {
    BadRequest(String),
    NotFound(String),
    DoctorActive,
    Failed,
}

impl From<Error> for ChatShimError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ChatShimError::NotFound(msg),
            other => {
                tracing::error!(error = %other, "Chat lookup failed");
                ChatShimError::Failed
            }
        }
    }
}

impl IntoResponse for ChatShimError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ChatShimError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ChatShimError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ChatShimError::DoctorActive => (
                StatusCode::CONFLICT,
                "A doctor has joined this chat".to_string(),
            ),
            ChatShimError::Failed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GATEWAY_FAILURE.to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Produce one automated reply for a message history
pub async fn chat(
    State(state): State<ConversationsState>,
    payload: Result<Json<ChatShimRequest>, JsonRejection>,
) -> Result<Json<ChatShimResponse>, ChatShimError> {
    let Json(request) = payload.map_err(|e| ChatShimError::BadRequest(e.body_text()))?;
    let (messages, chat_id) = request.into_parts();

    let history: Vec<LlmMessage> = messages
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| LlmMessage {
            role: m.role.llm_role(),
            content: m.content,
        })
        .collect();
    if history.is_empty() {
        return Err(ChatShimError::BadRequest("messages are required".to_string()));
    }

    if let Some(chat_id) = chat_id {
        let conversation = state
            .store
            .find_conversation(chat_id)
            .await?
            .ok_or_else(|| ChatShimError::NotFound("Chat not found".to_string()))?;

        if conversation.is_doctor_active {
            return Err(ChatShimError::DoctorActive);
        }
    }

    let request = CompletionRequest::new(Some(state.prompts.system_prompt.clone()), history);
    let response = state.llm.complete(request).await.map_err(|e| {
        tracing::error!(error = %e, "Completion gateway error");
        ChatShimError::Failed
    })?;

    Ok(Json(ChatShimResponse {
        message: response.content,
    }))
}
