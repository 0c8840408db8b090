//! In-memory conversation store for tests and local fixtures

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use telecare_common::{Error, RepositoryError, Result};
use uuid::Uuid;

use super::{
    ChangeFeed, ConversationStore, SnapshotStream, DOCTOR_ACTIVE_REJECTION,
    SUMMARY_LINKED_REJECTION,
};
use crate::domain::entities::{
    ChatSnapshot, Conversation, EscalationSummary, Message, NewMessage,
};

#[derive(Default)]
struct Tables {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Vec<Message>>,
    summaries: HashMap<Uuid, EscalationSummary>,
}

impl Tables {
    fn snapshot(&self, id: Uuid) -> Option<ChatSnapshot> {
        let conversation = self.conversations.get(&id)?.clone();
        let messages = self.messages.get(&id).cloned().unwrap_or_default();
        Some(ChatSnapshot {
            conversation,
            messages,
        })
    }

    fn append(&mut self, id: Uuid, messages: Vec<NewMessage>) -> Vec<Message> {
        let log = self.messages.entry(id).or_default();
        let first = log.len() as i32 + 1;
        let appended: Vec<Message> = (first..)
            .zip(messages)
            .map(|(sequence, message)| Message::from_new(id, message, sequence))
            .collect();
        log.extend(appended.iter().cloned());
        appended
    }
}

/// Same semantics as the Postgres store, held in a single mutex
#[derive(Default)]
pub struct InMemoryConversationStore {
    tables: Mutex<Tables>,
    feed: ChangeFeed,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, id: Uuid) {
        let snapshot = self.tables().snapshot(id);
        match snapshot {
            Some(snapshot) => self.feed.publish(snapshot),
            None => self.feed.publish_deleted(id),
        }
    }

    /// Insert a conversation row as-is, without seed messages
    pub fn insert_conversation(&self, conversation: Conversation) {
        self.tables()
            .conversations
            .insert(conversation.id, conversation);
    }

    /// Insert a summary row as-is, e.g. one whose chat is unknown
    pub fn insert_summary(&self, summary: EscalationSummary) {
        self.tables().summaries.insert(summary.id, summary);
    }

    pub fn summaries_for_user(&self, user_id: Uuid) -> Vec<EscalationSummary> {
        self.tables()
            .summaries
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.tables().conversations.get(&id).cloned())
    }

    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let mut convs: Vec<Conversation> = self
            .tables()
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(convs)
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Conversation>> {
        let mut convs: Vec<Conversation> = self
            .tables()
            .conversations
            .values()
            .filter(|c| c.doctor_id == Some(doctor_id))
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(convs)
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
        seed: Vec<NewMessage>,
    ) -> Result<ChatSnapshot> {
        for message in &seed {
            message.validate()?;
        }

        let mut tables = self.tables();
        if tables.conversations.contains_key(&conversation.id) {
            return Err(Error::Conflict("Conversation already exists".to_string()));
        }
        tables
            .conversations
            .insert(conversation.id, conversation.clone());
        let messages = tables.append(conversation.id, seed);

        Ok(ChatSnapshot {
            conversation: conversation.clone(),
            messages,
        })
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .tables()
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>> {
        for message in &messages {
            message.validate()?;
        }

        let appended = {
            let mut tables = self.tables();
            let conversation = tables
                .conversations
                .get_mut(&conversation_id)
                .ok_or(RepositoryError::NotFound)?;

            if !conversation.escalation_state().allows_automated_reply()
                && messages
                    .iter()
                    .any(|m| m.role.is_responder() && m.author_id.is_none())
            {
                return Err(RepositoryError::Rejected(DOCTOR_ACTIVE_REJECTION.to_string()).into());
            }

            conversation.updated_at = Utc::now();
            tables.append(conversation_id, messages)
        };

        self.publish(conversation_id);
        Ok(appended)
    }

    async fn escalate(&self, summary: &EscalationSummary) -> Result<Conversation> {
        let chat_id = summary
            .chat_id
            .ok_or_else(|| Error::Validation("Escalation summary has no chat".to_string()))?;

        let escalated = {
            let mut tables = self.tables();
            let conversation = tables
                .conversations
                .get_mut(&chat_id)
                .ok_or(RepositoryError::NotFound)?;

            if conversation.is_doctor_active {
                return Err(RepositoryError::Rejected(
                    "Conversation is already escalated".to_string(),
                )
                .into());
            }

            conversation.is_doctor_active = true;
            conversation.updated_at = Utc::now();
            let escalated = conversation.clone();
            tables.summaries.insert(summary.id, summary.clone());
            escalated
        };

        self.publish(chat_id);
        Ok(escalated)
    }

    async fn assign_doctor(&self, conversation_id: Uuid, doctor_id: Uuid) -> Result<Conversation> {
        let assigned = {
            let mut tables = self.tables();
            let conversation = tables
                .conversations
                .get_mut(&conversation_id)
                .ok_or(RepositoryError::NotFound)?;

            match conversation.doctor_id {
                Some(existing) if existing != doctor_id => {
                    return Err(RepositoryError::Rejected(
                        "Conversation is assigned to another doctor".to_string(),
                    )
                    .into())
                }
                Some(_) => {}
                None => {
                    conversation.doctor_id = Some(doctor_id);
                    conversation.is_doctor_active = true;
                    conversation.updated_at = Utc::now();
                }
            }
            conversation.clone()
        };

        self.publish(conversation_id);
        Ok(assigned)
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let deleted = {
            let mut tables = self.tables();
            let deleted = tables.conversations.remove(&id).is_some();
            tables.messages.remove(&id);
            for summary in tables.summaries.values_mut() {
                if summary.chat_id == Some(id) {
                    summary.chat_id = None;
                }
            }
            deleted
        };

        if deleted {
            self.feed.publish_deleted(id);
        }
        Ok(deleted)
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<EscalationSummary>> {
        Ok(self.tables().summaries.get(&id).cloned())
    }

    async fn list_open_summaries(&self) -> Result<Vec<EscalationSummary>> {
        let tables = self.tables();
        let mut open: Vec<EscalationSummary> = tables
            .summaries
            .values()
            .filter(|s| s.is_doctor_active)
            .filter(|s| match s.chat_id {
                None => true,
                Some(chat_id) => tables
                    .conversations
                    .get(&chat_id)
                    .map_or(true, |c| c.doctor_id.is_none()),
            })
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }

    async fn link_summary(&self, summary_id: Uuid, chat_id: Uuid) -> Result<EscalationSummary> {
        let mut tables = self.tables();
        let summary = tables
            .summaries
            .get_mut(&summary_id)
            .ok_or(RepositoryError::NotFound)?;
        if summary.chat_id.is_some() {
            return Err(RepositoryError::Rejected(SUMMARY_LINKED_REJECTION.to_string()).into());
        }
        summary.chat_id = Some(chat_id);
        Ok(summary.clone())
    }

    async fn watch(&self, conversation_id: Uuid) -> Result<SnapshotStream> {
        let snapshot = self
            .tables()
            .snapshot(conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(self.feed.subscribe(snapshot))
    }
}
