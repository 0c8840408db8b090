//! State machine for conversation escalation
//!
//! Escalation states: Automated → HumanRequested (terminal, no reversal)

pub use telecare_common::StateError;
use serde::{Deserialize, Serialize};

/// Who answers patient messages in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    /// Patient messages are answered by the completion gateway
    Automated,
    /// Patient messages wait for a human doctor
    HumanRequested,
}

impl EscalationState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [EscalationState] {
        match self {
            Self::Automated => &[Self::HumanRequested],
            Self::HumanRequested => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Whether the automated responder may still append replies
    pub fn allows_automated_reply(&self) -> bool {
        matches!(self, Self::Automated)
    }
}

impl std::fmt::Display for EscalationState {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automated => write!(f, "automated"),
            Self::HumanRequested => write!(f, "human_requested"),
        }
    }
}

/// Events that trigger escalation transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EscalationEvent {
    /// Patient asks for a human doctor
    RequestHuman,
}

impl std::fmt::Display for EscalationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestHuman => write!(f, "request_human"),
        }
    }
}

/// Escalation state machine
pub struct EscalationStateMachine;

impl EscalationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: EscalationState,
        event: EscalationEvent,
    ) -> Result<EscalationState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (EscalationState::Automated, EscalationEvent::RequestHuman) => {
                Ok(EscalationState::HumanRequested)
            }
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}
