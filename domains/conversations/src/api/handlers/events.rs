//! Conversation change stream (SSE)

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{future, Stream, StreamExt};
use telecare_auth::AuthUser;
use telecare_common::Result;
use uuid::Uuid;

use super::conversations::SnapshotResponse;
use crate::api::middleware::ConversationsState;
use crate::domain::entities::ChatSnapshot;
use crate::domain::session::ConversationSession;

fn snapshot_event(snapshot: ChatSnapshot) -> Event {
    let id = format!("{}:{}", snapshot.conversation.id, snapshot.messages.len());
    let data = serde_json::to_string(&SnapshotResponse::from(snapshot))
        .unwrap_or_else(|_| "{}".to_string());

    Event::default().id(id).event("snapshot").data(data)
}

/// Stream full snapshots of a conversation.
///
/// The first event is the current state. The stream closes when the
/// conversation is deleted or the caller loses access to it.
pub async fn conversation_events(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let chat = state.context_for(&ctx)?;
    let participant = chat.participant;
    let session = ConversationSession::load(chat, id).await?;
    let snapshots = session.subscribe().await?;

    tracing::debug!(conversation_id = %id, user_id = %participant.user_id, "Snapshot stream opened");

    let stream = snapshots
        .take_while(move |snapshot| future::ready(participant.can_view(&snapshot.conversation)))
        .map(|snapshot| Ok(snapshot_event(snapshot)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
