//! Completion gateway for Telecare
//!
//! Abstracts the hosted language-model API behind [`LlmService`] so the
//! conversation domain can be exercised against a mock or scripted gateway.
//! - `openai`: chat-completions HTTP client (production)
//! - `mock`: deterministic echo responder for local development
//! - `scripted`: queued replies and failures for tests (`test-support`)

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod mock;
pub mod openai;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

pub use mock::MockLlmService;
pub use openai::OpenAiService;
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedLlmService;

/// Default sampling temperature for chat replies
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default reply length cap
pub const DEFAULT_MAX_TOKENS: u32 = 500;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Role of a message as seen by the completion API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion call: system prompt plus ordered history
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model override; empty uses the service default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Request with the default model and sampling settings
    pub fn new(system_prompt: Option<String>, messages: Vec<LlmMessage>) -> Self {
        Self {
            model: String::new(),
            system_prompt,
            messages,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// Completion gateway configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider name (openai, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    /// API base URL override (proxies, local test servers)
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create LLM config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let provider = lookup("LLM_PROVIDER").unwrap_or(defaults.provider);
        let api_key = lookup("OPENAI_API_KEY").unwrap_or_default();

        if provider == "openai" && api_key.is_empty() {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY is required for the openai provider".to_string(),
            ));
        }

        let max_tokens = match lookup("LLM_MAX_TOKENS") {
            Some(raw) => raw.parse().map_err(|_| {
                LlmError::Configuration(format!("LLM_MAX_TOKENS must be an integer, got {raw:?}"))
            })?,
            None => defaults.max_tokens,
        };

        let temperature = match lookup("LLM_TEMPERATURE") {
            Some(raw) => raw.parse().map_err(|_| {
                LlmError::Configuration(format!("LLM_TEMPERATURE must be a number, got {raw:?}"))
            })?,
            None => defaults.temperature,
        };

        let timeout_secs = match lookup("LLM_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                LlmError::Configuration(format!("LLM_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?,
            None => defaults.timeout_secs,
        };

        Ok(Self {
            provider,
            api_key,
            default_model: lookup("LLM_MODEL").unwrap_or(defaults.default_model),
            base_url: lookup("LLM_BASE_URL"),
            max_tokens,
            temperature,
            timeout_secs,
        })
    }
}

/// Completion gateway trait
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Produce one assistant message for the given history
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// Builds the configured [`LlmService`]
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Using OpenAI completion gateway");
                Ok(Box::new(OpenAiService::new(config)?))
            }
            "mock" => {
                tracing::info!("Using mock completion gateway");
                Ok(Box::new(MockLlmService::new()))
            }
            other => Err(LlmError::Configuration(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}
