//! Dummy LLM provider — returns a canned reply, or echoes the final user
//! turn prefixed with `[echo]`. Used for exercising the pipeline without a
//! real API key.

use crate::{ChatMessage, ChatRole, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider {
    script: Option<String>,
}

impl DummyProvider {
    /// Always reply with `reply`, regardless of the prompt.
    pub fn scripted(reply: impl Into<String>) -> Self {
        Self {
            script: Some(reply.into()),
        }
    }

    /// Echo the last user turn back.
    pub fn echo() -> Self {
        Self { script: None }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        if let Some(reply) = &self.script {
            return Ok(reply.clone());
        }
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(format!("[echo] {last_user}"))
    }
}
