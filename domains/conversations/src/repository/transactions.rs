//! Transaction helpers for the Conversations domain

use super::conversations::CONVERSATION_COLUMNS;
use super::messages::MESSAGE_COLUMNS;
use super::summaries::SUMMARY_COLUMNS;
use crate::domain::entities::{Conversation, EscalationSummary, Message, NewMessage};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Lock a conversation row for the rest of the transaction.
/// Writers to the same conversation serialize here, so sequence
/// allocation and the doctor-active check see a stable row.
pub async fn lock_conversation_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    let query = format!("SELECT {CONVERSATION_COLUMNS} FROM chats WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Conversation>(&query)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}

/// Create a conversation within a transaction
pub async fn create_conversation_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation: &Conversation,
) -> Result<Conversation, sqlx::Error> {
    let query = format!(
        "INSERT INTO chats ({CONVERSATION_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {CONVERSATION_COLUMNS}"
    );
    sqlx::query_as::<_, Conversation>(&query)
        .bind(conversation.id)
        .bind(conversation.user_id)
        .bind(conversation.doctor_id)
        .bind(&conversation.name)
        .bind(conversation.kind)
        .bind(conversation.is_doctor_active)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&mut **tx)
        .await
}

/// Next free sequence number; call only with the conversation row locked
pub async fn next_sequence_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM chat_messages WHERE chat_id = $1",
    )
    .bind(conversation_id)
    .fetch_one(&mut **tx)
    .await
}

/// Insert messages at consecutive sequence numbers starting at `first`
pub async fn insert_messages_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
    first: i32,
    messages: Vec<NewMessage>,
) -> Result<Vec<Message>, sqlx::Error> {
    let query = format!(
        "INSERT INTO chat_messages (id, chat_id, role, content, author_id, sequence, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {MESSAGE_COLUMNS}"
    );

    let mut inserted = Vec::with_capacity(messages.len());
    for (sequence, message) in (first..).zip(messages) {
        let message = Message::from_new(conversation_id, message, sequence);
        let row = sqlx::query_as::<_, Message>(&query)
            .bind(message.id)
            .bind(message.conversation_id)
            .bind(message.role)
            .bind(&message.content)
            .bind(message.author_id)
            .bind(message.sequence)
            .bind(message.created_at)
            .fetch_one(&mut **tx)
            .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

pub async fn touch_conversation_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Raise the doctor-active flag; the schema forbids lowering it again
pub async fn activate_doctor_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Conversation, sqlx::Error> {
    let query = format!(
        "UPDATE chats SET is_doctor_active = TRUE, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {CONVERSATION_COLUMNS}"
    );
    sqlx::query_as::<_, Conversation>(&query)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
}

pub async fn assign_doctor_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    doctor_id: Uuid,
) -> Result<Conversation, sqlx::Error> {
    let query = format!(
        "UPDATE chats SET doctor_id = $2, is_doctor_active = TRUE, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {CONVERSATION_COLUMNS}"
    );
    sqlx::query_as::<_, Conversation>(&query)
        .bind(id)
        .bind(doctor_id)
        .fetch_one(&mut **tx)
        .await
}

/// Record an escalation summary within a transaction
pub async fn insert_summary_tx(
    tx: &mut Transaction<'_, Postgres>,
    summary: &EscalationSummary,
) -> Result<EscalationSummary, sqlx::Error> {
    let query = format!(
        "INSERT INTO user_summaries ({SUMMARY_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {SUMMARY_COLUMNS}"
    );
    sqlx::query_as::<_, EscalationSummary>(&query)
        .bind(summary.id)
        .bind(summary.user_id)
        .bind(summary.chat_id)
        .bind(&summary.summary)
        .bind(&summary.issue_title)
        .bind(summary.is_doctor_active)
        .bind(summary.created_at)
        .fetch_one(&mut **tx)
        .await
}
