//! Escalation workflow: hand a conversation over to a human doctor

use serde::Deserialize;
use telecare_common::{Error, Result};
use telecare_llm::{CompletionRequest, LlmError, LlmMessage};
use uuid::Uuid;

use super::context::ChatContext;
use super::entities::{EscalationSummary, SummaryDigest, NO_TITLE};
use super::session::completion_history;
use super::state::{EscalationEvent, EscalationStateMachine};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryReply {
    summary: String,
    #[serde(default)]
    issue_title: Option<String>,
}

/// Parse the gateway's summarization reply.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
/// Anything else becomes the summary verbatim under [`NO_TITLE`].
pub fn parse_summary_reply(raw: &str) -> SummaryDigest {
    let body = strip_code_fence(raw.trim());

    match serde_json::from_str::<SummaryReply>(body) {
        Ok(reply) => SummaryDigest {
            summary: reply.summary,
            issue_title: reply
                .issue_title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_TITLE.to_string()),
        },
        Err(_) => SummaryDigest {
            summary: raw.to_string(),
            issue_title: NO_TITLE.to_string(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn gateway_error(err: LlmError) -> Error {
    match err {
        LlmError::RateLimit => Error::RateLimit("Completion gateway rate limit exceeded".to_string()),
        other => Error::Gateway(format!("Failed to get response: {}", other)),
    }
}

pub struct EscalationWorkflow {
    ctx: ChatContext,
}

impl EscalationWorkflow {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }

    /// Summarize the conversation and flag it for a human doctor.
    ///
    /// The summary record and the flag are committed together; nothing is
    /// written when the gateway fails.
    pub async fn request_human_doctor(&self, conversation_id: Uuid) -> Result<EscalationSummary> {
        let participant = self.ctx.participant;

        let snapshot = self
            .ctx
            .store
            .snapshot(conversation_id)
            .await?
            .filter(|s| !participant.is_doctor() && s.conversation.is_owned_by(participant.user_id))
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        if snapshot.messages.is_empty() {
            return Err(Error::Validation("Nothing to summarize".to_string()));
        }

        EscalationStateMachine::transition(
            snapshot.conversation.escalation_state(),
            EscalationEvent::RequestHuman,
        )
        .map_err(|e| Error::Conflict(format!("Conversation is already escalated: {}", e)))?;

        let mut history = completion_history(&snapshot.messages);
        history.push(LlmMessage::user(self.ctx.prompts.summary_instruction.clone()));

        let request = CompletionRequest::new(Some(self.ctx.prompts.system_prompt.clone()), history);
        let reply = self.ctx.llm.complete(request).await.map_err(|e| {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Summary generation failed");
            gateway_error(e)
        })?;

        let summary = EscalationSummary::new(
            snapshot.conversation.user_id,
            Some(conversation_id),
            parse_summary_reply(&reply.content),
        );
        self.ctx.store.escalate(&summary).await?;

        tracing::info!(
            conversation_id = %conversation_id,
            summary_id = %summary.id,
            issue_title = %summary.issue_title,
            "Conversation escalated to a human doctor"
        );

        Ok(summary)
    }
}
