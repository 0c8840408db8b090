//! Conversation session
//!
//! A session is one participant's view of one conversation: a cached
//! snapshot kept in step with the store, plus the send flow that asks the
//! completion gateway for a reply while the conversation is automated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use telecare_common::{Error, Result};
use telecare_llm::{CompletionRequest, LlmMessage};
use uuid::Uuid;

use super::context::ChatContext;
use super::entities::{
    ChatSnapshot, Conversation, Message, NewMessage, AUTOMATED_GREETING, FALLBACK_REPLY,
};
use crate::repository::SnapshotStream;

/// Notice shown after a patient writes into an escalated chat
pub const AWAITING_DOCTOR_NOTICE: &str = "A doctor will respond to your message shortly.";

/// Result of a send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// Automated reply generated and persisted
    Replied { content: String },
    /// Gateway failed; the fallback text is shown locally and nothing is stored
    Fallback { reason: String },
    /// Patient message stored; a human doctor answers from here on
    AwaitingDoctor,
    /// Doctor message stored
    Delivered,
}

impl SendOutcome {
    /// User-facing notice, if the outcome carries one
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            SendOutcome::AwaitingDoctor => Some(AWAITING_DOCTOR_NOTICE),
            SendOutcome::Fallback { .. } => Some(FALLBACK_REPLY),
            _ => None,
        }
    }
}

/// Gateway history for a message log; empty entries are left out
pub fn completion_history(messages: &[Message]) -> Vec<LlmMessage> {
    messages
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| LlmMessage {
            role: m.role.llm_role(),
            content: m.content.clone(),
        })
        .collect()
}

/// Clears the in-flight flag when dropped, including on cancellation
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ConversationSession {
    ctx: ChatContext,
    conversation: Conversation,
    messages: Vec<Message>,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("conversation_id", &self.conversation.id)
            .field("participant", &self.ctx.participant)
            .field("messages", &self.messages.len())
            .finish()
    }
}

impl ConversationSession {
    fn from_snapshot(ctx: ChatContext, snapshot: ChatSnapshot) -> Self {
        Self {
            ctx,
            conversation: snapshot.conversation,
            messages: snapshot.messages,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open a conversation the participant is allowed to see
    pub async fn load(ctx: ChatContext, conversation_id: Uuid) -> Result<Self> {
        let snapshot = ctx
            .store
            .snapshot(conversation_id)
            .await?
            .filter(|s| ctx.participant.can_view(&s.conversation))
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        Ok(Self::from_snapshot(ctx, snapshot))
    }

    /// Start a new automated chat for the participating patient
    pub async fn create(ctx: ChatContext, name: Option<String>) -> Result<Self> {
        if ctx.participant.is_doctor() {
            return Err(Error::Authorization(
                "Only patients can start conversations".to_string(),
            ));
        }

        let conversation = Conversation::new_patient_chat(ctx.participant.user_id, name)?;
        let snapshot = ctx
            .store
            .create_conversation(&conversation, vec![NewMessage::automated(AUTOMATED_GREETING)])
            .await?;

        Ok(Self::from_snapshot(ctx, snapshot))
    }

    /// Wrap a snapshot that was just written by the caller
    pub(crate) fn opened(ctx: ChatContext, snapshot: ChatSnapshot) -> Self {
        Self::from_snapshot(ctx, snapshot)
    }

    pub fn id(&self) -> Uuid {
        self.conversation.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            conversation: self.conversation.clone(),
            messages: self.messages.clone(),
        }
    }

    pub fn is_doctor_active(&self) -> bool {
        self.conversation.is_doctor_active
    }

    /// True while a gateway call is pending
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Shared view of the in-flight flag for observers outside the session
    pub fn in_flight_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.in_flight)
    }

    /// Snapshot stream for this conversation
    pub async fn subscribe(&self) -> Result<SnapshotStream> {
        self.ctx.store.watch(self.conversation.id).await
    }

    /// Adopt a snapshot from the store.
    ///
    /// The message log is replaced wholesale. The doctor flag and the
    /// assigned doctor only ever move forward.
    pub fn apply_snapshot(&mut self, snapshot: ChatSnapshot) {
        if snapshot.conversation.id != self.conversation.id {
            return;
        }

        let was_active = self.conversation.is_doctor_active;
        let doctor_id = self.conversation.doctor_id;

        self.conversation = snapshot.conversation;
        self.conversation.is_doctor_active |= was_active;
        if self.conversation.doctor_id.is_none() {
            self.conversation.doctor_id = doctor_id;
        }
        self.messages = snapshot.messages;
    }

    /// Wait for the next snapshot and apply it; `false` once the stream ends
    pub async fn next_update(&mut self, stream: &mut SnapshotStream) -> bool {
        match stream.next().await {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    async fn reload(&mut self) -> Result<()> {
        let snapshot = self
            .ctx
            .store
            .snapshot(self.conversation.id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    fn next_local_sequence(&self) -> i32 {
        self.messages.last().map_or(1, |m| m.sequence + 1)
    }

    fn fill_placeholder(&mut self, content: &str) {
        if let Some(placeholder) = self.messages.iter_mut().rev().find(|m| m.is_placeholder()) {
            placeholder.content = content.to_string();
        }
    }

    /// Patient sends a message.
    ///
    /// While the conversation is automated the gateway reply and the
    /// patient message are stored together; once a doctor is active only
    /// the patient message is stored.
    pub async fn append_patient_message(&mut self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let participant = self.ctx.participant;
        if participant.is_doctor() || !self.conversation.is_owned_by(participant.user_id) {
            return Err(Error::Authorization(
                "Only the conversation owner can send patient messages".to_string(),
            ));
        }

        let patient = NewMessage::patient(participant.user_id, text);
        patient.validate()?;

        if self.is_doctor_active() || self.refresh_doctor_flag().await? {
            return self.store_for_doctor(patient).await;
        }

        let sequence = self.next_local_sequence();
        self.messages
            .push(Message::from_new(self.conversation.id, patient.clone(), sequence));
        self.messages
            .push(Message::placeholder(self.conversation.id, sequence + 1));

        let request = CompletionRequest::new(
            Some(self.ctx.prompts.system_prompt.clone()),
            completion_history(&self.messages),
        );

        let reply = {
            let _in_flight = InFlightGuard::start(&self.in_flight);
            self.ctx.llm.complete(request).await
        };

        let content = match reply {
            Ok(response) if !response.content.trim().is_empty() => response.content,
            Ok(_) => return Ok(self.fallback("Empty reply from completion gateway".to_string())),
            Err(e) => return Ok(self.fallback(e.to_string())),
        };

        self.fill_placeholder(&content);

        let persisted = self
            .ctx
            .store
            .append_messages(
                self.conversation.id,
                vec![patient.clone(), NewMessage::automated(content.clone())],
            )
            .await;

        match persisted {
            Ok(_) => {
                self.reload().await?;
                Ok(SendOutcome::Replied { content })
            }
            Err(Error::Conflict(reason)) => {
                tracing::info!(
                    conversation_id = %self.conversation.id,
                    reason = %reason,
                    "Conversation escalated during reply; discarding automated reply"
                );
                self.conversation.is_doctor_active = true;
                self.store_for_doctor(patient).await
            }
            Err(e) => {
                if let Err(reload_err) = self.reload().await {
                    tracing::warn!(
                        conversation_id = %self.conversation.id,
                        error = %reload_err,
                        "Failed to reload conversation after write error"
                    );
                }
                Err(e)
            }
        }
    }

    /// Read the stored doctor-active flag, folding it into the local copy
    async fn refresh_doctor_flag(&mut self) -> Result<bool> {
        let current = self
            .ctx
            .store
            .find_conversation(self.conversation.id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        if current.is_doctor_active {
            self.conversation.is_doctor_active = true;
            if self.conversation.doctor_id.is_none() {
                self.conversation.doctor_id = current.doctor_id;
            }
        }
        Ok(current.is_doctor_active)
    }

    async fn store_for_doctor(&mut self, patient: NewMessage) -> Result<SendOutcome> {
        self.ctx
            .store
            .append_messages(self.conversation.id, vec![patient])
            .await?;
        self.reload().await?;
        Ok(SendOutcome::AwaitingDoctor)
    }

    fn fallback(&mut self, reason: String) -> SendOutcome {
        tracing::warn!(
            conversation_id = %self.conversation.id,
            reason = %reason,
            "Completion gateway failed; showing fallback reply"
        );
        self.fill_placeholder(FALLBACK_REPLY);
        SendOutcome::Fallback { reason }
    }

    /// Doctor writes into an escalated conversation, claiming it if unassigned
    pub async fn append_doctor_message(&mut self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let participant = self.ctx.participant;
        if !participant.is_doctor() {
            return Err(Error::Authorization(
                "Only doctors can reply as a doctor".to_string(),
            ));
        }

        let message = NewMessage::doctor(participant.user_id, text);
        message.validate()?;

        let current = self
            .ctx
            .store
            .find_conversation(self.conversation.id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        if !current.is_doctor_active {
            return Err(Error::Conflict(
                "Conversation has not been escalated to a doctor".to_string(),
            ));
        }

        match current.doctor_id {
            Some(doctor_id) if doctor_id != participant.user_id => {
                return Err(Error::Authorization(
                    "Conversation is assigned to another doctor".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                self.ctx
                    .store
                    .assign_doctor(current.id, participant.user_id)
                    .await?;
                tracing::info!(
                    conversation_id = %current.id,
                    doctor_id = %participant.user_id,
                    "Doctor joined conversation"
                );
            }
        }

        self.ctx
            .store
            .append_messages(current.id, vec![message])
            .await?;
        self.reload().await?;
        Ok(SendOutcome::Delivered)
    }

    /// Delete the conversation; owner only
    pub async fn delete(self) -> Result<()> {
        let participant = self.ctx.participant;
        if participant.is_doctor() || !self.conversation.is_owned_by(participant.user_id) {
            return Err(Error::Authorization(
                "Only the conversation owner can delete it".to_string(),
            ));
        }

        if !self.ctx.store.delete_conversation(self.conversation.id).await? {
            return Err(Error::NotFound("Conversation not found".to_string()));
        }

        tracing::info!(conversation_id = %self.conversation.id, "Conversation deleted");
        Ok(())
    }
}
