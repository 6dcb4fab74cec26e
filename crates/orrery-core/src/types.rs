//! Core domain types for Orrery question answering.
//!
//! These types cross crate boundaries: the graph client produces `RecordSet`s,
//! the QA engine produces `AnswerResponse`s, and the presentation layer (out
//! of scope here) consumes both as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Retrieved Records ─────────────────────────────────────────────

/// One row returned by a graph query: column name → value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// All rows of one query, in the order the store returned them.
/// Empty is a valid result, distinct from an execution failure.
pub type RecordSet = Vec<Record>;

// ── Trace ─────────────────────────────────────────────────────────

/// The pipeline stage that produced a trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Schema,
    CypherGeneration,
    Execution,
    Synthesis,
}

/// One intermediate artifact captured while answering a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub stage: TraceStage,
    pub artifact: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl TraceEntry {
    pub fn new(stage: TraceStage, artifact: serde_json::Value) -> Self {
        Self {
            stage,
            artifact,
            at: Utc::now(),
        }
    }
}

// ── Service-Facing Response ───────────────────────────────────────

/// The complete result of one question: final answer (if any), the full
/// stage trace, and whether the service was able to run the pipeline.
///
/// `ready = false` marks the aborted terminal state (schema unavailable or
/// query generation failed); the `answer` then carries the explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub request_id: Uuid,
    pub answer: Option<String>,
    pub trace: Vec<TraceEntry>,
    pub ready: bool,
}

impl AnswerResponse {
    /// A completed answer, with the trace that produced it.
    pub fn answered(answer: String, trace: Vec<TraceEntry>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            answer: Some(answer),
            trace,
            ready: true,
        }
    }

    /// The aborted terminal state: the pipeline could not run to execution.
    /// `explanation` is user-facing prose, never a raw error dump.
    pub fn not_ready(explanation: String, trace: Vec<TraceEntry>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            answer: Some(explanation),
            trace,
            ready: false,
        }
    }

    /// Count trace entries for a given stage.
    pub fn stage_count(&self, stage: TraceStage) -> usize {
        self.trace.iter().filter(|e| e.stage == stage).count()
    }
}
