//! Conversation store for the Conversations domain
//!
//! [`ConversationStore`] is the system of record for chats, messages and
//! escalation summaries. `ConversationsRepositories` implements it over
//! Postgres; `InMemoryConversationStore` backs tests and local fixtures.
//! Both publish snapshots through a [`ChangeFeed`] after every commit.

pub mod conversations;
pub mod feed;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod messages;
pub mod summaries;
pub mod transactions;

use std::sync::Arc;

use sqlx::PgPool;
use telecare_common::{Error, RepositoryError, Result};
use uuid::Uuid;

use crate::domain::entities::{
    ChatSnapshot, Conversation, EscalationSummary, Message, NewMessage,
};

pub use conversations::ConversationRepository;
pub use feed::{ChangeFeed, SnapshotStream};
#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryConversationStore;
pub use messages::MessageRepository;
pub use summaries::SummaryRepository;

/// Message shown when an automated reply races an escalation
pub(crate) const DOCTOR_ACTIVE_REJECTION: &str =
    "A doctor has joined this conversation; automated replies are closed";

pub(crate) const SUMMARY_LINKED_REJECTION: &str = "Summary is already linked to a conversation";

/// System of record for conversations
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Chats owned by a patient, newest first
    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<Conversation>>;

    /// Chats assigned to a doctor, newest first
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Conversation>>;

    /// Create a conversation together with its seed messages
    async fn create_conversation(
        &self,
        conversation: &Conversation,
        seed: Vec<NewMessage>,
    ) -> Result<ChatSnapshot>;

    /// Messages ordered by sequence
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>>;

    /// Append messages atomically after the current tail.
    ///
    /// Rejects automated replies once a doctor is active.
    async fn append_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>>;

    /// Record the summary and raise `is_doctor_active` in one commit
    async fn escalate(&self, summary: &EscalationSummary) -> Result<Conversation>;

    /// Attach a doctor; a conversation keeps its first doctor
    async fn assign_doctor(&self, conversation_id: Uuid, doctor_id: Uuid) -> Result<Conversation>;

    async fn delete_conversation(&self, id: Uuid) -> Result<bool>;

    async fn find_summary(&self, id: Uuid) -> Result<Option<EscalationSummary>>;

    /// Summaries no doctor has picked up yet, newest first
    async fn list_open_summaries(&self) -> Result<Vec<EscalationSummary>>;

    /// Attach a chat to a summary that has none; `Conflict` when already linked
    async fn link_summary(&self, summary_id: Uuid, chat_id: Uuid) -> Result<EscalationSummary>;

    /// Subscribe to full-state snapshots, starting with the current state
    async fn watch(&self, conversation_id: Uuid) -> Result<SnapshotStream>;

    async fn snapshot(&self, conversation_id: Uuid) -> Result<Option<ChatSnapshot>> {
        let Some(conversation) = self.find_conversation(conversation_id).await? else {
            return Ok(None);
        };
        let messages = self.list_messages(conversation_id).await?;
        Ok(Some(ChatSnapshot {
            conversation,
            messages,
        }))
    }
}

/// Postgres-backed conversation store
#[derive(Clone)]
pub struct ConversationsRepositories {
    pool: PgPool,
    feed: Arc<ChangeFeed>,
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
    pub summaries: SummaryRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            summaries: SummaryRepository::new(pool.clone()),
            feed: Arc::new(ChangeFeed::new()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reload and publish; subscriber delivery is best-effort
    async fn notify(&self, conversation_id: Uuid) {
        if !self.feed.has_subscribers(conversation_id) {
            return;
        }
        match self.snapshot(conversation_id).await {
            Ok(Some(snapshot)) => self.feed.publish(snapshot),
            Ok(None) => self.feed.publish_deleted(conversation_id),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    conversation_id = %conversation_id,
                    "Failed to publish snapshot"
                )
            }
        }
    }
}

#[async_trait::async_trait]
impl ConversationStore for ConversationsRepositories {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversations.find(id).await
    }

    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        self.conversations.list_by_owner(user_id).await
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Conversation>> {
        self.conversations.list_by_doctor(doctor_id).await
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
        seed: Vec<NewMessage>,
    ) -> Result<ChatSnapshot> {
        for message in &seed {
            message.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let created = transactions::create_conversation_tx(&mut tx, conversation).await?;
        let messages = transactions::insert_messages_tx(&mut tx, created.id, 1, seed).await?;
        tx.commit().await?;

        tracing::info!(conversation_id = %created.id, kind = ?created.kind, "Conversation created");

        Ok(ChatSnapshot {
            conversation: created,
            messages,
        })
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.messages.list_by_conversation(conversation_id).await
    }

    async fn append_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>> {
        for message in &messages {
            message.validate()?;
        }

        let mut tx = self.pool.begin().await?;

        let conversation = transactions::lock_conversation_tx(&mut tx, conversation_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if !conversation.escalation_state().allows_automated_reply()
            && messages.iter().any(|m| m.role.is_responder() && m.author_id.is_none())
        {
            return Err(RepositoryError::Rejected(DOCTOR_ACTIVE_REJECTION.to_string()).into());
        }

        let next = transactions::next_sequence_tx(&mut tx, conversation_id).await?;
        let appended =
            transactions::insert_messages_tx(&mut tx, conversation_id, next, messages).await?;
        transactions::touch_conversation_tx(&mut tx, conversation_id).await?;
        tx.commit().await?;

        self.notify(conversation_id).await;
        Ok(appended)
    }

    async fn escalate(&self, summary: &EscalationSummary) -> Result<Conversation> {
        let chat_id = summary
            .chat_id
            .ok_or_else(|| Error::Validation("Escalation summary has no chat".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let conversation = transactions::lock_conversation_tx(&mut tx, chat_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if conversation.is_doctor_active {
            return Err(RepositoryError::Rejected(
                "Conversation is already escalated".to_string(),
            )
            .into());
        }

        transactions::insert_summary_tx(&mut tx, summary).await?;
        let escalated = transactions::activate_doctor_tx(&mut tx, chat_id).await?;
        tx.commit().await?;

        self.notify(chat_id).await;
        Ok(escalated)
    }

    async fn assign_doctor(&self, conversation_id: Uuid, doctor_id: Uuid) -> Result<Conversation> {
        let mut tx = self.pool.begin().await?;

        let conversation = transactions::lock_conversation_tx(&mut tx, conversation_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let assigned = match conversation.doctor_id {
            Some(existing) if existing == doctor_id => conversation,
            Some(_) => {
                return Err(RepositoryError::Rejected(
                    "Conversation is assigned to another doctor".to_string(),
                )
                .into())
            }
            None => transactions::assign_doctor_tx(&mut tx, conversation_id, doctor_id).await?,
        };
        tx.commit().await?;

        self.notify(conversation_id).await;
        Ok(assigned)
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let deleted = self.conversations.delete(id).await?;
        if deleted {
            self.feed.publish_deleted(id);
        }
        Ok(deleted)
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<EscalationSummary>> {
        self.summaries.find(id).await
    }

    async fn list_open_summaries(&self) -> Result<Vec<EscalationSummary>> {
        self.summaries.list_open().await
    }

    async fn link_summary(&self, summary_id: Uuid, chat_id: Uuid) -> Result<EscalationSummary> {
        if let Some(summary) = self.summaries.link_chat(summary_id, chat_id).await? {
            return Ok(summary);
        }

        match self.summaries.find(summary_id).await? {
            Some(_) => Err(RepositoryError::Rejected(SUMMARY_LINKED_REJECTION.to_string()).into()),
            None => Err(RepositoryError::NotFound.into()),
        }
    }

    async fn watch(&self, conversation_id: Uuid) -> Result<SnapshotStream> {
        let snapshot = self
            .snapshot(conversation_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(self.feed.subscribe(snapshot))
    }
}
