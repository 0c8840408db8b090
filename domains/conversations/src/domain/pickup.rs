//! Doctor-side pickup of escalation summaries

use telecare_common::{Error, Result};
use uuid::Uuid;

use super::context::ChatContext;
use super::entities::{Conversation, EscalationSummary, NewMessage, DOCTOR_GREETING};
use super::session::ConversationSession;

pub struct DoctorPickup {
    ctx: ChatContext,
}

impl DoctorPickup {
    pub fn new(ctx: ChatContext) -> Result<Self> {
        if !ctx.participant.is_doctor() {
            return Err(Error::Authorization(
                "Only doctors can pick up escalations".to_string(),
            ));
        }
        Ok(Self { ctx })
    }

    /// Escalations waiting for a doctor, newest first
    pub async fn list_open_summaries(&self) -> Result<Vec<EscalationSummary>> {
        self.ctx.store.list_open_summaries().await
    }

    /// Join the conversation behind a summary.
    ///
    /// Summaries without a conversation get a new doctor-patient chat; the
    /// summary is linked only after that chat has been created.
    pub async fn claim_summary(&self, summary_id: Uuid) -> Result<ConversationSession> {
        let summary = self
            .ctx
            .store
            .find_summary(summary_id)
            .await?
            .ok_or_else(|| Error::NotFound("Summary not found".to_string()))?;

        if let Some(chat_id) = summary.chat_id {
            if self.ctx.store.find_conversation(chat_id).await?.is_some() {
                return self.join_chat(&summary, chat_id).await;
            }
        }

        self.open_chat(&summary).await
    }

    async fn join_chat(
        &self,
        summary: &EscalationSummary,
        chat_id: Uuid,
    ) -> Result<ConversationSession> {
        let doctor_id = self.ctx.participant.user_id;
        self.ctx.store.assign_doctor(chat_id, doctor_id).await?;
        tracing::info!(
            summary_id = %summary.id,
            conversation_id = %chat_id,
            doctor_id = %doctor_id,
            "Doctor claimed escalated conversation"
        );
        ConversationSession::load(self.ctx.clone(), chat_id).await
    }

    /// Open a doctor-patient chat for an unlinked summary.
    ///
    /// When another claim linked the summary first, the new chat is
    /// dropped and the already-linked one is joined instead.
    async fn open_chat(&self, summary: &EscalationSummary) -> Result<ConversationSession> {
        let doctor_id = self.ctx.participant.user_id;
        let conversation = Conversation::new_doctor_chat(
            summary.user_id,
            doctor_id,
            Some(summary.issue_title.clone()),
        )?;
        let snapshot = self
            .ctx
            .store
            .create_conversation(
                &conversation,
                vec![NewMessage::doctor(doctor_id, DOCTOR_GREETING)],
            )
            .await?;

        match self.ctx.store.link_summary(summary.id, conversation.id).await {
            Ok(_) => {}
            Err(Error::Conflict(reason)) => {
                tracing::info!(
                    summary_id = %summary.id,
                    conversation_id = %conversation.id,
                    reason = %reason,
                    "Summary linked concurrently; dropping new conversation"
                );
                self.ctx.store.delete_conversation(conversation.id).await?;

                let linked = self
                    .ctx
                    .store
                    .find_summary(summary.id)
                    .await?
                    .and_then(|s| s.chat_id)
                    .ok_or_else(|| Error::NotFound("Summary not found".to_string()))?;
                return self.join_chat(summary, linked).await;
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            summary_id = %summary.id,
            conversation_id = %conversation.id,
            doctor_id = %doctor_id,
            "Doctor opened conversation from summary"
        );

        Ok(ConversationSession::opened(self.ctx.clone(), snapshot))
    }
}
