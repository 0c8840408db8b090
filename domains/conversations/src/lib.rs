//! Conversations domain: patient chats, automated replies and hand-off to doctors

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::context::{ChatContext, Participant, ParticipantRole, PromptSettings};
pub use domain::entities::{
    ChatSnapshot, Conversation, ConversationKind, EscalationSummary, Message, NewMessage,
    ResponderRole, SummaryDigest,
};
pub use domain::escalation::{parse_summary_reply, EscalationWorkflow};
pub use domain::pickup::DoctorPickup;
pub use domain::session::{ConversationSession, SendOutcome};
pub use domain::state::{
    EscalationEvent, EscalationState, EscalationStateMachine, StateError,
};

// Re-export repository types
#[cfg(any(test, feature = "test-support"))]
pub use repository::InMemoryConversationStore;
pub use repository::{ChangeFeed, ConversationStore, ConversationsRepositories, SnapshotStream};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
