//! Verbatim Cypher execution with full row materialization.
//!
//! Queries arrive as model-generated text; they are submitted to the store
//! exactly as given, with no parameterization or validation. The store is
//! the arbiter of whether the text is a valid query.

use orrery_core::{Record, RecordSet};

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    /// Run arbitrary Cypher text and materialize every row into a JSON
    /// record keyed by the query's return columns.
    ///
    /// Zero rows is a valid result. Store-level rejection (syntax error,
    /// unknown label, timeout) surfaces as `GraphError::Query`.
    pub async fn run_query(&self, cypher: &str) -> Result<RecordSet, GraphError> {
        let rows = self.query_rows(neo4rs::query(cypher)).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record: Record = row
                .to()
                .map_err(|e| GraphError::Serialization(format!("Failed to read row: {e}")))?;
            records.push(record);
        }

        tracing::debug!(rows = records.len(), "Cypher query materialized");
        Ok(records)
    }
}
