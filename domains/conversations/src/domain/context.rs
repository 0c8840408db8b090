//! Injected session context
//!
//! Everything a session or workflow needs is passed in explicitly: the
//! store handle, the completion gateway, prompt settings and the
//! authenticated participant. Nothing is read from globals.

use std::sync::Arc;

use telecare_auth::AuthContext;
use telecare_common::{Error, Result};
use telecare_llm::LlmService;
use uuid::Uuid;

use crate::domain::entities::Conversation;
use crate::repository::ConversationStore;

/// Instruction for the automated responder
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional and empathetic doctor in a \
telemedicine consultation. Provide clear, accurate medical information while maintaining a \
caring demeanor. Do not make definitive diagnoses but offer general guidance and recommend \
in-person consultation when appropriate. Keep your responses short and easy to read so the \
patient does not feel overwhelmed.";

/// Appended to the history when a patient asks for a human doctor
pub const DEFAULT_SUMMARY_INSTRUCTION: &str = "The patient has asked to speak with a human \
doctor. Summarize the conversation above for that doctor. Reply with only a JSON object of the \
form {\"summary\": \"...\", \"issueTitle\": \"...\"} where summary describes the patient's \
symptoms and concerns and issueTitle names the main issue in 2-3 words.";

/// Prompts sent to the completion gateway
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub system_prompt: String,
    pub summary_instruction: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            summary_instruction: DEFAULT_SUMMARY_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Patient,
    Doctor,
}

/// Authenticated user acting on conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: ParticipantRole,
}

impl Participant {
    pub fn patient(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Patient,
        }
    }

    pub fn doctor(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Doctor,
        }
    }

    /// Map an authenticated caller; doctors must be verified
    pub fn from_auth(ctx: &AuthContext) -> Result<Self> {
        if ctx.is_patient() {
            Ok(Self::patient(ctx.user_id()))
        } else if ctx.is_verified_doctor() {
            Ok(Self::doctor(ctx.user_id()))
        } else {
            Err(Error::Authorization(
                "Doctor account is pending verification".to_string(),
            ))
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == ParticipantRole::Doctor
    }

    /// Owners see their chats; doctors see chats assigned to them and
    /// escalated chats nobody has claimed yet.
    pub fn can_view(&self, conversation: &Conversation) -> bool {
        match self.role {
            ParticipantRole::Patient => conversation.is_owned_by(self.user_id),
            ParticipantRole::Doctor => match conversation.doctor_id {
                Some(doctor_id) => doctor_id == self.user_id,
                None => conversation.is_doctor_active,
            },
        }
    }
}

/// Explicit dependencies for sessions and workflows
#[derive(Clone)]
pub struct ChatContext {
    pub store: Arc<dyn ConversationStore>,
    pub llm: Arc<dyn LlmService>,
    pub prompts: Arc<PromptSettings>,
    pub participant: Participant,
}

impl ChatContext {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        llm: Arc<dyn LlmService>,
        prompts: Arc<PromptSettings>,
        participant: Participant,
    ) -> Self {
        Self {
            store,
            llm,
            prompts,
            participant,
        }
    }

    /// Same dependencies, different participant
    pub fn for_participant(&self, participant: Participant) -> Self {
        Self {
            participant,
            ..self.clone()
        }
    }
}
