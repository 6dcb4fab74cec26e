//! Cypher generation from a question and a schema snapshot.
//!
//! The prompt is role-structured: a system turn carrying the instruction
//! block and the rendered schema, a fixed set of worked example exchanges,
//! and the caller's question as the final user turn. Schema conformance is
//! enforced by instruction only; a query that references nonexistent labels
//! or properties is caught downstream as a store execution error.

use serde::{Deserialize, Serialize};

use orrery_llm::{ChatMessage, LlmProvider, ProviderError};

use crate::error::{RagError, Result};
use crate::schema::SchemaSnapshot;

/// A candidate Cypher query and the schema version it was generated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub cypher: String,
    pub schema_version: u64,
}

const CYPHER_INSTRUCTIONS: &str = "\
Task: Generate a Cypher statement to query a graph database.
Instructions:
Use only the provided relationship types and properties in the schema.
Do not use any other relationship types or properties that are not provided.
Do not include any explanations or apologies in your responses.
Do not respond to any questions that might ask anything else than for you to construct a Cypher statement.
Do not include any text except the generated Cypher statement.";

/// Worked examples demonstrating aggregate counts, traversals, filtered
/// traversals, and property projection by literal value.
const WORKED_EXAMPLES: &[(&str, &str)] = &[
    (
        "How many spacecraft are there?",
        "MATCH (s:Spacecraft) RETURN count(s) AS totalSpacecraft",
    ),
    (
        "What instruments does INSAT-3D carry?",
        "MATCH (s:Spacecraft {name: 'INSAT-3D'})-[:CARRIES_INSTRUMENT]->(i:Instrument) RETURN i.name AS instrumentName",
    ),
    (
        "Which data products are processed by ISRO?",
        "MATCH (dp:DataProduct)-[:PROCESSED_BY]->(o:Organization {name: 'ISRO'}) RETURN dp.name AS dataProductName",
    ),
    (
        "What is the launch mass of INSAT-3D?",
        "MATCH (s:Spacecraft {name: 'INSAT-3D'}) RETURN s.launch_mass_kg AS launchMass",
    ),
];

/// Turns (schema snapshot, question) into one candidate Cypher query.
pub struct QueryGenerator {
    llm: LlmProvider,
}

impl QueryGenerator {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    /// Generate one candidate query. The query is not validated against the
    /// schema; `GenerationEmpty` is the only quality check applied here.
    pub async fn generate(
        &self,
        snapshot: &SchemaSnapshot,
        question: &str,
    ) -> Result<GeneratedQuery> {
        let messages = build_prompt(&snapshot.rendered, question);
        let raw = self.llm.complete(&messages).await.map_err(map_provider_err)?;

        let cypher = strip_fences(&raw);
        if cypher.is_empty() {
            return Err(RagError::GenerationEmpty);
        }

        tracing::debug!(cypher = %cypher, schema_version = snapshot.version, "Generated Cypher candidate");
        Ok(GeneratedQuery {
            cypher,
            schema_version: snapshot.version,
        })
    }
}

fn map_provider_err(e: ProviderError) -> RagError {
    match e {
        ProviderError::EmptyCompletion => RagError::GenerationEmpty,
        other => RagError::GenerationFailed(other.to_string()),
    }
}

/// Assemble the role-structured generation prompt; the question is always
/// the final turn.
fn build_prompt(schema_text: &str, question: &str) -> Vec<ChatMessage> {
    let mut messages =
        vec![ChatMessage::system(format!("{CYPHER_INSTRUCTIONS}\nSchema:\n{schema_text}"))];
    for (example_question, example_cypher) in WORKED_EXAMPLES {
        messages.push(ChatMessage::user(*example_question));
        messages.push(ChatMessage::assistant(*example_cypher));
    }
    messages.push(ChatMessage::user(question));
    messages
}

/// Strip a markdown code fence (with optional language tag) wrapping the
/// model output, yielding bare query text.
fn strip_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
        if let Some((first_line, body)) = text.split_once('\n') {
            let tag = first_line.trim();
            if tag.is_empty() || tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                text = body;
            }
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_graph::GraphSchema;

    fn snapshot() -> SchemaSnapshot {
        let schema = GraphSchema {
            labels: vec![orrery_graph::LabelSchema {
                label: "Spacecraft".to_string(),
                properties: vec!["launch_mass_kg".to_string(), "name".to_string()],
            }],
            relationship_types: vec!["CARRIES_INSTRUMENT".to_string()],
            patterns: Vec::new(),
        };
        SchemaSnapshot {
            version: 7,
            captured_at: chrono::Utc::now(),
            rendered: schema.render(),
            schema,
        }
    }

    #[test]
    fn strip_fences_with_language_tag() {
        let raw = "```cypher\nMATCH (s:Spacecraft) RETURN s.name\n```";
        assert_eq!(strip_fences(raw), "MATCH (s:Spacecraft) RETURN s.name");
    }

    #[test]
    fn strip_fences_without_language_tag() {
        let raw = "```\nMATCH (s:Spacecraft) RETURN s.name\n```";
        assert_eq!(strip_fences(raw), "MATCH (s:Spacecraft) RETURN s.name");
    }

    #[test]
    fn strip_fences_single_line() {
        let raw = "```MATCH (s:Spacecraft) RETURN s.name```";
        assert_eq!(strip_fences(raw), "MATCH (s:Spacecraft) RETURN s.name");
    }

    #[test]
    fn strip_fences_keeps_first_line_of_unfenced_query() {
        // The first fence line is only dropped when it looks like a tag.
        let raw = "```MATCH (s:Spacecraft)\nRETURN s.name```";
        assert_eq!(strip_fences(raw), "MATCH (s:Spacecraft)\nRETURN s.name");
    }

    #[test]
    fn strip_fences_passes_plain_text_through() {
        let raw = "  MATCH (s:Spacecraft) RETURN count(s)  ";
        assert_eq!(strip_fences(raw), "MATCH (s:Spacecraft) RETURN count(s)");
    }

    #[test]
    fn prompt_puts_schema_in_system_turn_and_question_last() {
        let messages = build_prompt("Node properties:\nSpacecraft {name}\n", "How many spacecraft?");
        assert_eq!(messages.len(), 2 + 2 * WORKED_EXAMPLES.len());

        let system = &messages[0];
        assert_eq!(system.role, orrery_llm::ChatRole::System);
        assert!(system.content.contains("Use only the provided relationship types"));
        assert!(system.content.contains("Spacecraft {name}"));

        let last = messages.last().unwrap();
        assert_eq!(last.role, orrery_llm::ChatRole::User);
        assert_eq!(last.content, "How many spacecraft?");
    }

    #[tokio::test]
    async fn generate_strips_fences_and_stamps_schema_version() {
        let llm = LlmProvider::Dummy(orrery_llm::DummyProvider::scripted(
            "```cypher\nMATCH (s:Spacecraft) RETURN count(s) AS totalSpacecraft\n```",
        ));
        let generator = QueryGenerator::new(llm);

        let query = generator
            .generate(&snapshot(), "How many spacecraft are there?")
            .await
            .unwrap();
        assert_eq!(
            query.cypher,
            "MATCH (s:Spacecraft) RETURN count(s) AS totalSpacecraft"
        );
        assert_eq!(query.schema_version, 7);
    }

    #[tokio::test]
    async fn generate_is_deterministic_for_fixed_input() {
        let llm = LlmProvider::Dummy(orrery_llm::DummyProvider::scripted(
            "MATCH (s:Spacecraft) RETURN count(s) AS totalSpacecraft",
        ));
        let generator = QueryGenerator::new(llm);
        let snap = snapshot();

        let first = generator.generate(&snap, "How many spacecraft are there?").await.unwrap();
        let second = generator.generate(&snap, "How many spacecraft are there?").await.unwrap();
        assert_eq!(first.cypher, second.cypher);
    }

    #[tokio::test]
    async fn generate_reports_empty_output() {
        let llm = LlmProvider::Dummy(orrery_llm::DummyProvider::scripted("```\n   \n```"));
        let generator = QueryGenerator::new(llm);

        let err = generator.generate(&snapshot(), "anything").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationEmpty));
    }
}
