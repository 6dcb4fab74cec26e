//! orrery-rag: Natural-language question answering over the Orrery
//! knowledge graph.
//!
//! One request runs a strictly sequential pipeline: schema snapshot →
//! Cypher generation → execution → grounded synthesis. Every stage appends
//! its artifact to the request trace, which is returned alongside the final
//! answer — the trace is this engine's only debugging surface.

pub mod config;
pub mod error;
pub mod execute;
pub mod generate;
pub mod schema;
pub mod synthesize;

pub use config::RagConfig;
pub use error::RagError;
pub use generate::GeneratedQuery;
pub use schema::{SchemaDescriptor, SchemaSnapshot};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use orrery_core::{AnswerResponse, RecordSet, TraceEntry, TraceStage};
use orrery_graph::GraphClient;
use orrery_llm::LlmProvider;

use crate::error::Result;
use crate::execute::QueryExecutor;
use crate::generate::QueryGenerator;
use crate::synthesize::AnswerSynthesizer;

/// The question-answering engine.
///
/// Composes the four pipeline stages, owns the per-stage timeout policy,
/// and captures every intermediate artifact. Requests are independent; the
/// only state shared between them is the cached schema snapshot.
pub struct GraphRagEngine {
    schema: SchemaDescriptor,
    generator: QueryGenerator,
    executor: QueryExecutor,
    synthesizer: AnswerSynthesizer,
    llm_timeout: Duration,
    query_timeout: Duration,
}

impl GraphRagEngine {
    /// Build an engine over a connected graph client and two provider
    /// instances: a cheap one for Cypher generation, a stronger one for
    /// answer synthesis.
    pub fn new(
        client: GraphClient,
        cypher_llm: LlmProvider,
        qa_llm: LlmProvider,
        config: &RagConfig,
    ) -> Self {
        Self {
            schema: SchemaDescriptor::new(client.clone()),
            generator: QueryGenerator::new(cypher_llm),
            executor: QueryExecutor::new(client),
            synthesizer: AnswerSynthesizer::new(qa_llm, config.max_context_records),
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        }
    }

    /// Answer one question.
    ///
    /// Never returns an error: every failure path is folded into the
    /// response as a natural-language explanation plus the trace collected
    /// so far. `ready = false` marks the aborted terminal state (schema
    /// unavailable or generation failed); an execution failure is a normal
    /// outcome of a healthy service and keeps `ready = true`.
    pub async fn ask(&self, question: &str) -> AnswerResponse {
        let mut trace = Vec::new();
        tracing::info!(question = %question, "Processing question");

        // Idle → SchemaReady
        let snapshot = match self.load_schema(&mut trace).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Aborting: schema unavailable");
                return AnswerResponse::not_ready(
                    format!("The service is not ready: {e}."),
                    trace,
                );
            }
        };

        // SchemaReady → QueryGenerated
        let query = match self.generate_query(&snapshot, question, &mut trace).await {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, "Aborting: query generation failed");
                return AnswerResponse::not_ready(
                    format!("A graph query could not be generated for this question: {e}."),
                    trace,
                );
            }
        };

        // QueryGenerated → Executed | ExecutionFailed
        let records = match self.execute_query(&query, &mut trace).await {
            Ok(records) => records,
            Err(e) => {
                // Not retried and not repaired: the store's message plus the
                // failed Cypher in the trace are the operator's diagnosis
                // surface.
                tracing::warn!(error = %e, cypher = %query.cypher, "Generated query failed");
                return AnswerResponse::answered(
                    format!("The generated query was rejected by the graph store: {e}."),
                    trace,
                );
            }
        };

        // Executed → Answered, always — zero rows still gets synthesized
        // into a "no matching data" answer.
        match self.synthesize_answer(question, &records, &mut trace).await {
            Ok(answer) => AnswerResponse::answered(answer, trace),
            Err(e) => {
                // Retrieval already succeeded; degrade to the raw records
                // rather than failing the request.
                tracing::warn!(error = %e, "Synthesis failed, returning raw records");
                AnswerResponse::answered(degraded_answer(&records), trace)
            }
        }
    }

    /// Force a fresh schema snapshot, replacing the cached one.
    pub async fn refresh_schema(&self) -> Result<Arc<SchemaSnapshot>> {
        self.schema.get(true).await
    }

    /// The current snapshot, introspecting on first use or when `refresh`
    /// is set.
    pub async fn schema_snapshot(&self, refresh: bool) -> Result<Arc<SchemaSnapshot>> {
        self.schema.get(refresh).await
    }

    // ── Stages ───────────────────────────────────────────────────

    async fn load_schema(&self, trace: &mut Vec<TraceEntry>) -> Result<Arc<SchemaSnapshot>> {
        let result = match timeout(self.query_timeout, self.schema.get(false)).await {
            Ok(result) => result,
            Err(_) => Err(RagError::SchemaUnavailable(format!(
                "introspection timed out after {}s",
                self.query_timeout.as_secs()
            ))),
        };

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            // A previous snapshot is still usable; prefer stale over failing.
            Err(e) => match self.schema.current().await {
                Some(stale) => {
                    tracing::warn!(
                        error = %e,
                        version = stale.version,
                        "Introspection failed, continuing with stale schema snapshot"
                    );
                    stale
                }
                None => return Err(e),
            },
        };

        trace.push(TraceEntry::new(
            TraceStage::Schema,
            json!({
                "version": snapshot.version,
                "labels": snapshot.schema.labels.len(),
                "relationship_types": snapshot.schema.relationship_types.len(),
            }),
        ));
        Ok(snapshot)
    }

    async fn generate_query(
        &self,
        snapshot: &SchemaSnapshot,
        question: &str,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<GeneratedQuery> {
        let result = match timeout(self.llm_timeout, self.generator.generate(snapshot, question))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(RagError::GenerationFailed(format!(
                "generation timed out after {}s",
                self.llm_timeout.as_secs()
            ))),
        };

        match result {
            Ok(query) => {
                trace.push(TraceEntry::new(
                    TraceStage::CypherGeneration,
                    json!({
                        "cypher": query.cypher,
                        "schema_version": query.schema_version,
                    }),
                ));
                Ok(query)
            }
            Err(e) => {
                trace.push(TraceEntry::new(
                    TraceStage::CypherGeneration,
                    json!({ "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }

    async fn execute_query(
        &self,
        query: &GeneratedQuery,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<RecordSet> {
        let result = match timeout(self.query_timeout, self.executor.execute(query)).await {
            Ok(result) => result,
            Err(_) => Err(RagError::Execution {
                cypher: query.cypher.clone(),
                message: format!("execution timed out after {}s", self.query_timeout.as_secs()),
            }),
        };

        match result {
            Ok(records) => {
                let sample: Vec<_> = records.iter().take(3).cloned().collect();
                trace.push(TraceEntry::new(
                    TraceStage::Execution,
                    json!({ "rows": records.len(), "sample": sample }),
                ));
                Ok(records)
            }
            Err(e) => {
                if let RagError::Execution { cypher, message } = &e {
                    trace.push(TraceEntry::new(
                        TraceStage::Execution,
                        json!({ "error": message, "cypher": cypher }),
                    ));
                }
                Err(e)
            }
        }
    }

    async fn synthesize_answer(
        &self,
        question: &str,
        records: &RecordSet,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<String> {
        let result = match timeout(
            self.llm_timeout,
            self.synthesizer.synthesize(question, records),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RagError::Synthesis(format!(
                "synthesis timed out after {}s",
                self.llm_timeout.as_secs()
            ))),
        };

        match result {
            Ok(answer) => {
                trace.push(TraceEntry::new(
                    TraceStage::Synthesis,
                    json!({ "answer": answer }),
                ));
                Ok(answer)
            }
            Err(e) => {
                trace.push(TraceEntry::new(
                    TraceStage::Synthesis,
                    json!({ "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }
}

/// The degraded answer used when synthesis fails after a successful
/// retrieval: the raw record data, never an empty string.
fn degraded_answer(records: &RecordSet) -> String {
    let data = serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string());
    format!(
        "An answer could not be synthesized, but the query retrieved {} row(s): {data}",
        records.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::Record;

    #[test]
    fn degraded_answer_is_never_empty() {
        assert!(!degraded_answer(&Vec::new()).is_empty());

        let mut record = Record::new();
        record.insert("launchMass".to_string(), serde_json::json!(2000));
        let answer = degraded_answer(&vec![record]);
        assert!(answer.contains("1 row(s)"));
        assert!(answer.contains("2000"));
    }
}
