//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations — enum
//! dispatch avoids `dyn` trait objects and the `async-trait` dependency.
//! Adding a backend = new module in `providers/` + new variant + new
//! `complete` arm.
//!
//! Provider instances are shared immutable capabilities; clone them freely.

pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use providers::dummy::DummyProvider;
pub use providers::openai_compatible::OpenAiCompatibleProvider;

// ── Errors ────────────────────────────────────────────────────────

/// Failures at the text-generation boundary.
///
/// Auth and rate-limit responses are distinguished from generic transport
/// failures so callers can report them precisely; all of them are fatal for
/// the in-flight request and transient for the process.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider authentication failed: {0}")]
    Auth(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider request timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned no usable content")]
    EmptyCompletion,
}

// ── Messages ──────────────────────────────────────────────────────

/// Role of one turn in a chat-completion prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a role-structured prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Provider enum ─────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    OpenAiCompatible(OpenAiCompatibleProvider),
    Dummy(DummyProvider),
}

impl LlmProvider {
    /// Send a role-structured prompt to the provider and return its text
    /// reply. Guaranteed non-empty on success.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        match self {
            LlmProvider::OpenAiCompatible(p) => p.complete(messages).await,
            LlmProvider::Dummy(p) => p.complete(messages).await,
        }
    }
}
