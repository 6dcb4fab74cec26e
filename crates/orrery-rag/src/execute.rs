//! Query execution stage: verbatim submission, full materialization.

use orrery_core::RecordSet;
use orrery_graph::GraphClient;

use crate::error::{RagError, Result};
use crate::generate::GeneratedQuery;

/// Runs a generated query against the graph store.
///
/// Store-level failures are mapped to `RagError::Execution` carrying the
/// store's message and the offending Cypher; they are never retried here —
/// retry policy belongs to the orchestrator's call sites.
pub struct QueryExecutor {
    client: GraphClient,
}

impl QueryExecutor {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Submit the query text verbatim and materialize all rows.
    /// An empty record set is a valid success, not an error.
    pub async fn execute(&self, query: &GeneratedQuery) -> Result<RecordSet> {
        match self.client.run_query(&query.cypher).await {
            Ok(records) => {
                tracing::debug!(rows = records.len(), "Query executed");
                Ok(records)
            }
            Err(e) => Err(RagError::Execution {
                cypher: query.cypher.clone(),
                message: e.to_string(),
            }),
        }
    }
}
