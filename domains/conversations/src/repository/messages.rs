//! Message repository

use crate::domain::entities::Message;
use sqlx::PgPool;
use telecare_common::Result;
use uuid::Uuid;

pub(crate) const MESSAGE_COLUMNS: &str =
    "id, chat_id AS conversation_id, role, content, author_id, sequence, created_at";

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List messages for a conversation, ordered by sequence ASC
    pub async fn list_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE chat_id = $1 \
             ORDER BY sequence ASC"
        );
        let messages = sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }
}
