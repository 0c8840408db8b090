//! Conversations domain state and auth backend integration

use axum::extract::FromRef;
use std::sync::Arc;
use telecare_auth::{AuthBackend, AuthContext};
use telecare_common::Result;
use telecare_llm::LlmService;

use crate::domain::context::{ChatContext, Participant, PromptSettings};
use crate::repository::ConversationStore;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: Arc<dyn ConversationStore>,
    pub auth: AuthBackend,
    pub llm: Arc<dyn LlmService>,
    pub prompts: Arc<PromptSettings>,
}

impl ConversationsState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        auth: AuthBackend,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        Self {
            store,
            auth,
            llm,
            prompts: Arc::new(PromptSettings::default()),
        }
    }

    /// Session context for a participant
    pub fn context(&self, participant: Participant) -> ChatContext {
        ChatContext::new(
            self.store.clone(),
            self.llm.clone(),
            self.prompts.clone(),
            participant,
        )
    }

    /// Session context for an authenticated caller
    pub fn context_for(&self, auth: &AuthContext) -> Result<ChatContext> {
        Ok(self.context(Participant::from_auth(auth)?))
    }
}

impl FromRef<ConversationsState> for AuthBackend {
    fn from_ref(state: &ConversationsState) -> Self {
        state.auth.clone()
    }
}
