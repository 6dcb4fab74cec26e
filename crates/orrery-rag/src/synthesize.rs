//! Answer synthesis: grounding the final response in retrieved records.
//!
//! Uses the higher-capability QA model — this stage must reason over the
//! retrieved facts rather than pattern-match to a query shape.

use orrery_core::RecordSet;
use orrery_llm::{ChatMessage, LlmProvider};

use crate::error::{RagError, Result};

const GROUNDING_INSTRUCTIONS: &str = "\
You are an assistant that answers questions using only the query results provided.
The results are the authoritative data: do not use outside knowledge and do not invent values.
If the results do not contain the information needed, say that the available data does not answer the question.
If the results are empty, say that no matching data was found.";

/// Turns (question, records) into a grounded natural-language answer.
pub struct AnswerSynthesizer {
    llm: LlmProvider,
    max_context_records: usize,
}

impl AnswerSynthesizer {
    pub fn new(llm: LlmProvider, max_context_records: usize) -> Self {
        Self {
            llm,
            max_context_records,
        }
    }

    /// Synthesize an answer. Called for every executed query, including
    /// those that returned zero rows — "no matching data" is a normal
    /// answer, not an error.
    pub async fn synthesize(&self, question: &str, records: &RecordSet) -> Result<String> {
        let messages = vec![
            ChatMessage::system(GROUNDING_INSTRUCTIONS),
            ChatMessage::user(render_context(question, records, self.max_context_records)),
        ];

        self.llm
            .complete(&messages)
            .await
            .map_err(|e| RagError::Synthesis(e.to_string()))
    }
}

/// Render the question and records into the grounding prompt's user turn.
/// Rows beyond `cap` are elided with an explicit marker so the model knows
/// the context is partial.
fn render_context(question: &str, records: &RecordSet, cap: usize) -> String {
    let mut out = format!("Question: {question}\nQuery results:\n");
    if records.is_empty() {
        out.push_str("(no rows returned)\n");
    } else {
        for record in records.iter().take(cap) {
            out.push_str(&serde_json::Value::Object(record.clone()).to_string());
            out.push('\n');
        }
        if records.len() > cap {
            out.push_str(&format!("... {} more rows omitted\n", records.len() - cap));
        }
    }
    out.push_str("Answer:");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::Record;

    fn record(key: &str, value: serde_json::Value) -> Record {
        let mut map = Record::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn render_marks_empty_record_sets() {
        let context = render_context("What is the launch mass of INSAT-3D?", &Vec::new(), 50);
        assert!(context.contains("(no rows returned)"));
        assert!(context.starts_with("Question: What is the launch mass of INSAT-3D?"));
    }

    #[test]
    fn render_includes_record_values() {
        let records = vec![record("launchMass", serde_json::json!(2000))];
        let context = render_context("What is the launch mass of INSAT-3D?", &records, 50);
        assert!(context.contains("{\"launchMass\":2000}"));
        assert!(context.ends_with("Answer:"));
    }

    #[test]
    fn render_elides_rows_beyond_cap() {
        let records: RecordSet = (0..5)
            .map(|i| record("count", serde_json::json!(i)))
            .collect();
        let context = render_context("q", &records, 2);
        assert!(context.contains("{\"count\":0}"));
        assert!(context.contains("{\"count\":1}"));
        assert!(!context.contains("{\"count\":2}"));
        assert!(context.contains("... 3 more rows omitted"));
    }

    #[tokio::test]
    async fn synthesize_returns_non_empty_text_for_empty_records() {
        let llm = LlmProvider::Dummy(orrery_llm::DummyProvider::scripted(
            "No matching data was found for that question.",
        ));
        let synthesizer = AnswerSynthesizer::new(llm, 50);

        let answer = synthesizer
            .synthesize("What is the launch mass of INSAT-3D?", &Vec::new())
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }

    #[tokio::test]
    async fn synthesize_passes_records_to_the_model() {
        // The echo provider returns the user turn, which must carry the data.
        let llm = LlmProvider::Dummy(orrery_llm::DummyProvider::echo());
        let synthesizer = AnswerSynthesizer::new(llm, 50);

        let records = vec![record("launchMass", serde_json::json!(2000))];
        let answer = synthesizer
            .synthesize("What is the launch mass of INSAT-3D?", &records)
            .await
            .unwrap();
        assert!(answer.contains("2000"));
    }
}
