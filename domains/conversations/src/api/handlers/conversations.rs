//! Conversation management API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telecare_auth::{AuthUser, PatientUser};
use telecare_common::{Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::context::Participant;
use crate::domain::entities::{
    ChatSnapshot, Conversation, ConversationKind, Message, ResponderRole,
};
use crate::domain::session::ConversationSession;

/// Request for creating a conversation
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateConversationRequest {
    /// Optional chat name; defaults to "New chat"
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// Conversation response DTO
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub name: String,
    pub kind: ConversationKind,
    pub is_doctor_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            doctor_id: c.doctor_id,
            name: c.name,
            kind: c.kind,
            is_doctor_active: c.is_doctor_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: ResponderRole,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content: m.content,
            author_id: m.author_id,
            sequence: m.sequence,
            created_at: m.created_at,
        }
    }
}

/// Conversation with its full message log
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<ChatSnapshot> for SnapshotResponse {
    fn from(s: ChatSnapshot) -> Self {
        Self {
            conversation: s.conversation.into(),
            messages: s.messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Start a new conversation, seeded with the automated greeting
pub async fn create_conversation(
    PatientUser(ctx): PatientUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<SnapshotResponse>)> {
    let session = ConversationSession::create(
        state.context(Participant::patient(ctx.user_id())),
        req.name,
    )
    .await?;

    tracing::info!(conversation_id = %session.id(), user_id = %ctx.user_id(), "Conversation started");

    Ok((StatusCode::CREATED, Json(session.snapshot().into())))
}

/// Patients see their own chats; doctors see the chats they have joined
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<Json<Vec<ConversationResponse>>> {
    let participant = Participant::from_auth(&ctx)?;
    let convs = if participant.is_doctor() {
        state.store.list_for_doctor(participant.user_id).await?
    } else {
        state.store.list_for_owner(participant.user_id).await?
    };

    let responses: Vec<ConversationResponse> = convs.into_iter().map(Into::into).collect();
    Ok(Json(responses))
}

/// Get a single conversation with its messages
pub async fn get_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>> {
    let session = ConversationSession::load(state.context_for(&ctx)?, id).await?;
    Ok(Json(session.snapshot().into()))
}

/// Delete a conversation (owner only)
pub async fn delete_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let session = ConversationSession::load(state.context_for(&ctx)?, id).await?;
    session.delete().await?;
    Ok(StatusCode::NO_CONTENT)
}
