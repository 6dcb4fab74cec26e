//! Configuration for the Orrery question-answering engine.

use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `orrery.toml` `[rag]` section or `ORRERY__RAG__`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    /// Model used for Cypher generation (cheap, pattern-matching work).
    #[serde(default = "default_cypher_model")]
    pub cypher_model: String,

    /// Model used for answer synthesis (must reason over retrieved facts).
    #[serde(default = "default_qa_model")]
    pub qa_model: String,

    /// Chat-completions endpoint, OpenAI-compatible.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key; when absent the `OPENAI_API_KEY` environment variable is
    /// used. Keyless local endpoints need neither.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature for both models. Zero keeps repeated
    /// generations on identical input maximally reproducible.
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Bound on each text-generation call, in seconds.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    /// Bound on each graph-store call (introspection or execution), in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Maximum retrieved rows rendered into the synthesis prompt; rows
    /// beyond the cap are elided with a marker.
    #[serde(default = "default_max_context_records")]
    pub max_context_records: usize,
}

fn default_cypher_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_qa_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_query_timeout() -> u64 {
    30
}

fn default_max_context_records() -> usize {
    50
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            cypher_model: default_cypher_model(),
            qa_model: default_qa_model(),
            api_base_url: default_api_base_url(),
            api_key: None,
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            llm_timeout_secs: default_llm_timeout(),
            query_timeout_secs: default_query_timeout(),
            max_context_records: default_max_context_records(),
        }
    }
}

impl RagConfig {
    /// The configured key, or the `OPENAI_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RagConfig::default();
        assert_eq!(config.cypher_model, "gpt-4o-mini");
        assert_eq!(config.qa_model, "gpt-4o");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_context_records, 50);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_deserialize_partial_toml_uses_defaults() {
        let config: RagConfig = toml_like(r#"{"qa_model": "gpt-4.1"}"#);
        assert_eq!(config.qa_model, "gpt-4.1");
        assert_eq!(config.cypher_model, "gpt-4o-mini");
        assert_eq!(config.llm_timeout_secs, 60);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = RagConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
    }

    fn toml_like(json: &str) -> RagConfig {
        serde_json::from_str(json).unwrap()
    }
}
