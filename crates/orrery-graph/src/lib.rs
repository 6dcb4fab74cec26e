//! Orrery Graph — Neo4j client for the knowledge graph.
//!
//! This crate is the single access point for the Neo4j knowledge graph:
//! connection management, verbatim Cypher execution with full row
//! materialization, and schema introspection (labels, relationship types,
//! property keys, relationship patterns).

pub mod client;
pub mod execute;
pub mod introspect;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use introspect::{GraphSchema, LabelSchema, RelationshipPattern};
