//! Scripted completion gateway for tests
//!
//! Replays queued replies (or failures) in order and records every request
//! it receives. When the script runs dry it answers with a fixed reply.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

const EXHAUSTED_REPLY: &str = "No scripted reply";

#[derive(Debug, Default)]
pub struct ScriptedLlmService {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, outcome: Result<String, LlmError>) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }

    /// Requests received so far, in call order
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait::async_trait]
impl LlmService for ScriptedLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(EXHAUSTED_REPLY.to_string()));

        next.map(|content| CompletionResponse {
            output_tokens: content.len() as i32 / 4,
            content,
            model: "scripted-model".to_string(),
            input_tokens: 0,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}
