//! orrery-core: Shared types for the Orrery platform.
//!
//! This crate provides the foundational types used across all Orrery
//! components:
//! - Record types for rows retrieved from the knowledge graph
//! - Trace types capturing the intermediate artifacts of one question
//! - The service-facing `AnswerResponse`

pub mod types;

pub use types::{AnswerResponse, Record, RecordSet, TraceEntry, TraceStage};
