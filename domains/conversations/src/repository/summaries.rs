//! Escalation summary repository

use crate::domain::entities::EscalationSummary;
use sqlx::PgPool;
use telecare_common::Result;
use uuid::Uuid;

pub(crate) const SUMMARY_COLUMNS: &str =
    "id, user_id, chat_id, summary, issue_title, is_doctor_active, created_at";

#[derive(Clone)]
pub struct SummaryRepository {
    pool: PgPool,
}

impl SummaryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<EscalationSummary>> {
        let query = format!("SELECT {SUMMARY_COLUMNS} FROM user_summaries WHERE id = $1");
        let summary = sqlx::query_as::<_, EscalationSummary>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(summary)
    }

    /// Summaries without a chat, or whose chat has no doctor yet
    pub async fn list_open(&self) -> Result<Vec<EscalationSummary>> {
        let summaries = sqlx::query_as::<_, EscalationSummary>(
            r#"
            SELECT s.id, s.user_id, s.chat_id, s.summary, s.issue_title,
                   s.is_doctor_active, s.created_at
            FROM user_summaries s
            LEFT JOIN chats c ON c.id = s.chat_id
            WHERE s.is_doctor_active
              AND (s.chat_id IS NULL OR c.doctor_id IS NULL)
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    /// Point a summary at the chat a doctor opened for it.
    ///
    /// Only unlinked summaries are updated; `None` means the summary is
    /// missing or already points at a chat.
    pub async fn link_chat(
        &self,
        summary_id: Uuid,
        chat_id: Uuid,
    ) -> Result<Option<EscalationSummary>> {
        let query = format!(
            "UPDATE user_summaries SET chat_id = $2 \
             WHERE id = $1 AND chat_id IS NULL \
             RETURNING {SUMMARY_COLUMNS}"
        );
        let summary = sqlx::query_as::<_, EscalationSummary>(&query)
            .bind(summary_id)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(summary)
    }
}
