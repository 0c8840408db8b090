//! Domain entities for the Conversations domain
//!
//! A conversation ("chat") belongs to one patient and holds an ordered,
//! append-only message log. Escalation to a human doctor is a one-way flag
//! on the conversation plus an [`EscalationSummary`] record for doctor views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use telecare_common::{Error, Result};
use telecare_llm::LlmRole;

use super::state::EscalationState;

/// Greeting the automated responder seeds every new patient chat with
pub const AUTOMATED_GREETING: &str = "Hello, what brings you in today?";

/// Greeting a doctor opens a freshly created doctor-patient chat with
pub const DOCTOR_GREETING: &str =
    "Hello, I'm the doctor who reviewed your request. How are you feeling right now?";

/// Responder text used when the completion gateway fails
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong.";

/// Issue title used when the summary reply is not structured
pub const NO_TITLE: &str = "No Title";

/// Name given to chats created without one
pub const DEFAULT_CHAT_NAME: &str = "New chat";

/// Maximum chat name length (varchar(200))
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum message length
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Maximum issue title length (varchar(100))
const MAX_ISSUE_TITLE_LENGTH: usize = 100;

/// How a conversation came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "conversation_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Started by a patient, answered by the automated responder until escalated
    #[default]
    Automated,
    /// Opened by a doctor from an escalation summary
    DoctorPatient,
}

/// Author role of a message.
///
/// Serialized as `user` / `assistant` / `doctor` to match the stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role")]
pub enum ResponderRole {
    #[serde(rename = "user")]
    #[sqlx(rename = "user")]
    Patient,
    #[serde(rename = "assistant")]
    #[sqlx(rename = "assistant")]
    AutomatedResponder,
    #[serde(rename = "doctor")]
    #[sqlx(rename = "doctor")]
    HumanResponder,
}

impl ResponderRole {
    /// Role as seen by the completion gateway
    pub fn llm_role(&self) -> LlmRole {
        match self {
            ResponderRole::Patient => LlmRole::User,
            ResponderRole::AutomatedResponder | ResponderRole::HumanResponder => {
                LlmRole::Assistant
            }
        }
    }

    pub fn is_responder(&self) -> bool {
        !matches!(self, ResponderRole::Patient)
    }
}

impl std::fmt::Display for ResponderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponderRole::Patient => write!(f, "user"),
            ResponderRole::AutomatedResponder => write!(f, "assistant"),
            ResponderRole::HumanResponder => write!(f, "doctor"),
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    /// Owning patient
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub name: String,
    pub kind: ConversationKind,
    pub is_doctor_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// New patient chat; answered by the automated responder
    pub fn new_patient_chat(user_id: Uuid, name: Option<String>) -> Result<Self> {
        let name = Self::validate_name(name)?;
        let now = Utc::now();

        Ok(Conversation {
            id: Uuid::new_v4(),
            user_id,
            doctor_id: None,
            name,
            kind: ConversationKind::Automated,
            is_doctor_active: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// New doctor-patient chat, staffed by `doctor_id` from the start
    pub fn new_doctor_chat(patient_id: Uuid, doctor_id: Uuid, name: Option<String>) -> Result<Self> {
        let mut conversation = Self::new_patient_chat(patient_id, name)?;
        conversation.doctor_id = Some(doctor_id);
        conversation.kind = ConversationKind::DoctorPatient;
        conversation.is_doctor_active = true;
        Ok(conversation)
    }

    pub fn escalation_state(&self) -> EscalationState {
        if self.is_doctor_active {
            EscalationState::HumanRequested
        } else {
            EscalationState::Automated
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    fn validate_name(name: Option<String>) -> Result<String> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => DEFAULT_CHAT_NAME.to_string(),
        };

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        Ok(name)
    }
}

/// Message to be appended; the store assigns id, sequence and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub role: ResponderRole,
    pub content: String,
    pub author_id: Option<Uuid>,
}

impl NewMessage {
    pub fn patient(author_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            role: ResponderRole::Patient,
            content: content.into(),
            author_id: Some(author_id),
        }
    }

    pub fn automated(content: impl Into<String>) -> Self {
        Self {
            role: ResponderRole::AutomatedResponder,
            content: content.into(),
            author_id: None,
        }
    }

    pub fn doctor(doctor_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            role: ResponderRole::HumanResponder,
            content: content.into(),
            author_id: Some(doctor_id),
        }
    }

    /// Content must be non-blank (CHECK (length(trim(content)) > 0))
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        if self.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(Error::Validation(format!(
                "Message content must be at most {} characters",
                MAX_CONTENT_LENGTH
            )));
        }
        Ok(())
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: ResponderRole,
    pub content: String,
    pub author_id: Option<Uuid>,
    /// 1-based position in the conversation
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Materialize a new message at `sequence`
    pub fn from_new(conversation_id: Uuid, message: NewMessage, sequence: i32) -> Self {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: message.role,
            content: message.content,
            author_id: message.author_id,
            sequence,
            created_at: Utc::now(),
        }
    }

    /// Empty automated message shown while a reply is pending
    pub fn placeholder(conversation_id: Uuid, sequence: i32) -> Self {
        Self::from_new(conversation_id, NewMessage::automated(String::new()), sequence)
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == ResponderRole::AutomatedResponder && self.content.is_empty()
    }
}

/// Full state of one conversation as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

impl ChatSnapshot {
    /// Every mutation is monotonic (append, flag set, doctor assignment),
    /// so this key only grows as the conversation changes.
    pub fn progress(&self) -> (usize, bool, bool) {
        (
            self.messages.len(),
            self.conversation.is_doctor_active,
            self.conversation.doctor_id.is_some(),
        )
    }
}

/// Parsed summarization reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDigest {
    pub summary: String,
    pub issue_title: String,
}

/// Doctor-facing digest written when a patient asks for a human doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EscalationSummary {
    pub id: Uuid,
    /// Patient who requested the doctor
    pub user_id: Uuid,
    /// Conversation the doctor should join, when known
    pub chat_id: Option<Uuid>,
    pub summary: String,
    pub issue_title: String,
    pub is_doctor_active: bool,
    pub created_at: DateTime<Utc>,
}

impl EscalationSummary {
    pub fn new(user_id: Uuid, chat_id: Option<Uuid>, digest: SummaryDigest) -> Self {
        let issue_title = if digest.issue_title.chars().count() > MAX_ISSUE_TITLE_LENGTH {
            digest.issue_title.chars().take(MAX_ISSUE_TITLE_LENGTH).collect()
        } else {
            digest.issue_title
        };

        EscalationSummary {
            id: Uuid::new_v4(),
            user_id,
            chat_id,
            summary: digest.summary,
            issue_title,
            is_doctor_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responder_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&ResponderRole::Patient).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&ResponderRole::AutomatedResponder).unwrap(),
            "\"assistant\""
        );
        assert_eq!(
            serde_json::to_string(&ResponderRole::HumanResponder).unwrap(),
            "\"doctor\""
        );
        assert_eq!(ResponderRole::HumanResponder.to_string(), "doctor");
    }

    #[test]
    fn test_responder_roles_map_to_llm_roles() {
        assert_eq!(ResponderRole::Patient.llm_role(), LlmRole::User);
        assert_eq!(
            ResponderRole::AutomatedResponder.llm_role(),
            LlmRole::Assistant
        );
        assert_eq!(ResponderRole::HumanResponder.llm_role(), LlmRole::Assistant);
    }

    #[test]
    fn test_conversation_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ConversationKind::DoctorPatient).unwrap(),
            "\"doctor_patient\""
        );
        assert_eq!(ConversationKind::default(), ConversationKind::Automated);
    }

    #[test]
    fn test_patient_chat_defaults() {
        let user_id = Uuid::new_v4();
        let conv = Conversation::new_patient_chat(user_id, None).unwrap();

        assert_eq!(conv.user_id, user_id);
        assert_eq!(conv.name, DEFAULT_CHAT_NAME);
        assert_eq!(conv.kind, ConversationKind::Automated);
        assert!(!conv.is_doctor_active);
        assert!(conv.doctor_id.is_none());
        assert_eq!(conv.escalation_state(), EscalationState::Automated);
    }

    #[test]
    fn test_patient_chat_blank_name_uses_default() {
        let conv = Conversation::new_patient_chat(Uuid::new_v4(), Some("   ".to_string())).unwrap();
        assert_eq!(conv.name, DEFAULT_CHAT_NAME);
    }

    #[test]
    fn test_patient_chat_name_limits() {
        assert!(Conversation::new_patient_chat(Uuid::new_v4(), Some("a".repeat(200))).is_ok());

        let result = Conversation::new_patient_chat(Uuid::new_v4(), Some("a".repeat(201)));
        assert!(result.unwrap_err().to_string().contains("at most 200"));
    }

    #[test]
    fn test_doctor_chat_starts_escalated() {
        let patient = Uuid::new_v4();
        let doctor = Uuid::new_v4();
        let conv =
            Conversation::new_doctor_chat(patient, doctor, Some("Headache".to_string())).unwrap();

        assert_eq!(conv.user_id, patient);
        assert_eq!(conv.doctor_id, Some(doctor));
        assert_eq!(conv.kind, ConversationKind::DoctorPatient);
        assert_eq!(conv.escalation_state(), EscalationState::HumanRequested);
    }

    #[test]
    fn test_new_message_blank_content_rejected() {
        let result = NewMessage::patient(Uuid::new_v4(), " \t\n ").validate();
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_new_message_too_long_rejected() {
        let result = NewMessage::automated("a".repeat(MAX_CONTENT_LENGTH + 1)).validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_detection() {
        let conv_id = Uuid::new_v4();
        let placeholder = Message::placeholder(conv_id, 3);
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.sequence, 3);

        let reply = Message::from_new(conv_id, NewMessage::automated("Rest"), 3);
        assert!(!reply.is_placeholder());
    }

    #[test]
    fn test_escalation_summary_is_doctor_active() {
        let summary = EscalationSummary::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            SummaryDigest {
                summary: "Patient reports headache".to_string(),
                issue_title: "Headache".to_string(),
            },
        );
        assert!(summary.is_doctor_active);
        assert_eq!(summary.issue_title, "Headache");
    }

    #[test]
    fn test_escalation_summary_truncates_long_title() {
        let summary = EscalationSummary::new(
            Uuid::new_v4(),
            None,
            SummaryDigest {
                summary: "s".to_string(),
                issue_title: "t".repeat(150),
            },
        );
        assert_eq!(summary.issue_title.chars().count(), 100);
    }

    #[test]
    fn test_snapshot_progress_grows_with_mutations() {
        let mut conv = Conversation::new_patient_chat(Uuid::new_v4(), None).unwrap();
        let mut snapshot = ChatSnapshot {
            conversation: conv.clone(),
            messages: vec![],
        };
        let before = snapshot.progress();

        conv.is_doctor_active = true;
        snapshot.conversation = conv;
        assert!(snapshot.progress() > before);
    }
}
