//! Message API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use telecare_auth::AuthUser;
use telecare_common::{Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use super::conversations::{MessageResponse, SnapshotResponse};
use crate::api::middleware::ConversationsState;
use crate::domain::session::{ConversationSession, SendOutcome};

/// Request for sending a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Message content; whitespace-only content is ignored
    #[validate(length(max = 10000))]
    pub content: String,
}

/// Outcome of a send plus the conversation as the sender now sees it
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    #[serde(flatten)]
    pub outcome: SendOutcome,
    pub notice: Option<&'static str>,
    pub conversation: SnapshotResponse,
}

/// Send a message as the patient or as the joined doctor
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>)> {
    let chat = state.context_for(&ctx)?;
    let is_doctor = chat.participant.is_doctor();
    let mut session = ConversationSession::load(chat, conversation_id).await?;

    let outcome = if is_doctor {
        session.append_doctor_message(&req.content).await?
    } else {
        session.append_patient_message(&req.content).await?
    };

    let status = match outcome {
        SendOutcome::Ignored | SendOutcome::Fallback { .. } => StatusCode::OK,
        _ => StatusCode::CREATED,
    };

    Ok((
        status,
        Json(SendMessageResponse {
            notice: outcome.notice(),
            outcome,
            conversation: session.snapshot().into(),
        }),
    ))
}

/// List messages for a conversation
pub async fn list_messages(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>> {
    let session = ConversationSession::load(state.context_for(&ctx)?, conversation_id).await?;

    let responses: Vec<MessageResponse> = session
        .messages()
        .iter()
        .cloned()
        .map(Into::into)
        .collect();
    Ok(Json(responses))
}
