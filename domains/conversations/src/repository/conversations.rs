//! Conversation repository

use crate::domain::entities::Conversation;
use sqlx::PgPool;
use telecare_common::Result;
use uuid::Uuid;

pub(crate) const CONVERSATION_COLUMNS: &str =
    "id, user_id, doctor_id, name, kind, is_doctor_active, created_at, updated_at";

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find conversation by ID
    pub async fn find(&self, id: Uuid) -> Result<Option<Conversation>> {
        let query = format!("SELECT {CONVERSATION_COLUMNS} FROM chats WHERE id = $1");
        let conv = sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(conv)
    }

    /// Chats owned by a patient, most recently active first
    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let query = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM chats \
             WHERE user_id = $1 \
             ORDER BY updated_at DESC, created_at DESC"
        );
        let convs = sqlx::query_as::<_, Conversation>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(convs)
    }

    /// Chats a doctor has joined, most recently active first
    pub async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Conversation>> {
        let query = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM chats \
             WHERE doctor_id = $1 \
             ORDER BY updated_at DESC, created_at DESC"
        );
        let convs = sqlx::query_as::<_, Conversation>(&query)
            .bind(doctor_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(convs)
    }

    /// Delete a conversation; messages cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
