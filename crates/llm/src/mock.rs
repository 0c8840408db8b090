//! Offline clinic responder
//!
//! Selected by `LlmServiceFactory` when the provider is `"mock"`, so the
//! service runs locally without gateway credentials. Replies are canned:
//! a triage acknowledgement for chat turns, and a JSON digest of the
//! patient's messages when asked to summarize for a doctor.

use serde_json::json;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmMessage, LlmRole, LlmService};

const MODEL: &str = "offline-clinic";

/// Marker carried by the escalation instruction
const SUMMARY_MARKER: &str = "issueTitle";

const TITLE_WORDS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct MockLlmService;

impl MockLlmService {
    pub fn new() -> Self {
        Self
    }
}

fn patient_turns(messages: &[LlmMessage]) -> impl Iterator<Item = &str> {
    messages
        .iter()
        .filter(|m| m.role == LlmRole::User && !m.content.contains(SUMMARY_MARKER))
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty())
}

fn triage_reply(messages: &[LlmMessage]) -> String {
    match patient_turns(messages).last() {
        Some(concern) => format!(
            "Thanks for telling me about \"{}\". How long has this been going on, \
             and is it getting better or worse? If it feels urgent, you can ask \
             for a doctor at any time.",
            concern
        ),
        None => "Hello, I'm the clinic assistant. What brings you in today?".to_string(),
    }
}

fn summary_reply(messages: &[LlmMessage]) -> String {
    let turns: Vec<&str> = patient_turns(messages).collect();
    let summary = if turns.is_empty() {
        "Patient asked to speak with a doctor.".to_string()
    } else {
        format!("Patient reports: {}", turns.join(" / "))
    };
    let issue_title = turns
        .first()
        .map(|first| {
            first
                .split_whitespace()
                .take(TITLE_WORDS)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| "General consultation".to_string());

    format!(
        "```json\n{}\n```",
        json!({ "summary": summary, "issueTitle": issue_title })
    )
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let wants_summary = request
            .messages
            .last()
            .is_some_and(|m| m.content.contains(SUMMARY_MARKER));
        tracing::debug!(
            turns = request.messages.len(),
            wants_summary,
            "Offline responder answering"
        );

        let content = if wants_summary {
            summary_reply(&request.messages)
        } else {
            triage_reply(&request.messages)
        };
        let model = if request.model.is_empty() {
            MODEL.to_string()
        } else {
            request.model
        };

        Ok(CompletionResponse {
            input_tokens: 0,
            output_tokens: 0,
            content,
            model,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        MODEL
    }
}
