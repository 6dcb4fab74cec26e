//! Schema introspection for the knowledge graph.
//!
//! Collects node labels, relationship types, per-label property keys, and
//! directed label-to-label relationship patterns, and renders them into the
//! fixed textual form consumed by the Cypher-generation prompt.

use neo4rs::query;
use serde::{Deserialize, Serialize};

use crate::client::{GraphClient, GraphError};

/// Upper bound on the distinct-pattern scan; keeps introspection cheap on
/// densely connected graphs.
const PATTERN_LIMIT: i64 = 500;

/// One node label and the property keys observed on its nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelSchema {
    pub label: String,
    pub properties: Vec<String>,
}

/// A directed relationship pattern between two labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipPattern {
    pub from: String,
    pub rel_type: String,
    pub to: String,
}

/// The introspected shape of the graph at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchema {
    pub labels: Vec<LabelSchema>,
    pub relationship_types: Vec<String>,
    pub patterns: Vec<RelationshipPattern>,
}

impl GraphSchema {
    /// Render the schema as the prompt text block.
    ///
    /// The layout is fixed: labels with their property keys, then bare
    /// relationship types, then directed patterns. The generation prompt
    /// depends on this shape staying stable.
    pub fn render(&self) -> String {
        let mut out = String::from("Node properties:\n");
        for label in &self.labels {
            out.push_str(&label.label);
            out.push_str(" {");
            out.push_str(&label.properties.join(", "));
            out.push_str("}\n");
        }

        out.push_str("Relationship types:\n");
        for rel in &self.relationship_types {
            out.push_str(rel);
            out.push('\n');
        }

        if !self.patterns.is_empty() {
            out.push_str("The relationships:\n");
            for p in &self.patterns {
                out.push_str(&format!("(:{})-[:{}]->(:{})\n", p.from, p.rel_type, p.to));
            }
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.relationship_types.is_empty()
    }
}

impl GraphClient {
    /// Introspect the current graph schema.
    ///
    /// Four read queries, each materialized fully before the next starts.
    /// Any store failure aborts the whole introspection; the caller decides
    /// whether a previously cached schema is still usable.
    pub async fn introspect_schema(&self) -> Result<GraphSchema, GraphError> {
        let mut schema = GraphSchema {
            labels: self.fetch_label_properties().await?,
            relationship_types: self.fetch_relationship_types().await?,
            patterns: self.fetch_patterns().await?,
        };

        // Labels that exist but currently have no nodes with properties
        // still belong in the schema text.
        for label in self.fetch_labels().await? {
            if !schema.labels.iter().any(|l| l.label == label) {
                schema.labels.push(LabelSchema {
                    label,
                    properties: Vec::new(),
                });
            }
        }
        schema.labels.sort_by(|a, b| a.label.cmp(&b.label));

        tracing::info!(
            labels = schema.labels.len(),
            relationship_types = schema.relationship_types.len(),
            patterns = schema.patterns.len(),
            "Introspected graph schema"
        );
        Ok(schema)
    }

    async fn fetch_labels(&self) -> Result<Vec<String>, GraphError> {
        let rows = self
            .query_rows(query("CALL db.labels() YIELD label RETURN label ORDER BY label"))
            .await?;
        let mut labels = Vec::with_capacity(rows.len());
        for row in rows {
            labels.push(row.get::<String>("label").unwrap_or_default());
        }
        Ok(labels)
    }

    async fn fetch_relationship_types(&self) -> Result<Vec<String>, GraphError> {
        let rows = self
            .query_rows(query(
                "CALL db.relationshipTypes() YIELD relationshipType
                 RETURN relationshipType ORDER BY relationshipType",
            ))
            .await?;
        let mut types = Vec::with_capacity(rows.len());
        for row in rows {
            types.push(row.get::<String>("relationshipType").unwrap_or_default());
        }
        Ok(types)
    }

    async fn fetch_label_properties(&self) -> Result<Vec<LabelSchema>, GraphError> {
        let rows = self
            .query_rows(query(
                "MATCH (n)
                 UNWIND labels(n) AS label
                 UNWIND keys(n) AS key
                 RETURN label, collect(DISTINCT key) AS keys
                 ORDER BY label",
            ))
            .await?;

        let mut labels = Vec::with_capacity(rows.len());
        for row in rows {
            let label: String = row.get("label").unwrap_or_default();
            let mut properties: Vec<String> = row.get("keys").unwrap_or_default();
            properties.sort();
            labels.push(LabelSchema { label, properties });
        }
        Ok(labels)
    }

    async fn fetch_patterns(&self) -> Result<Vec<RelationshipPattern>, GraphError> {
        let rows = self
            .query_rows(
                query(
                    "MATCH (a)-[r]->(b)
                     UNWIND labels(a) AS from_label
                     UNWIND labels(b) AS to_label
                     WITH DISTINCT from_label, type(r) AS rel_type, to_label
                     RETURN from_label, rel_type, to_label
                     ORDER BY from_label, rel_type, to_label
                     LIMIT $limit",
                )
                .param("limit", PATTERN_LIMIT),
            )
            .await?;

        let mut patterns = Vec::with_capacity(rows.len());
        for row in rows {
            patterns.push(RelationshipPattern {
                from: row.get("from_label").unwrap_or_default(),
                rel_type: row.get("rel_type").unwrap_or_default(),
                to: row.get("to_label").unwrap_or_default(),
            });
        }
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> GraphSchema {
        GraphSchema {
            labels: vec![
                LabelSchema {
                    label: "Instrument".to_string(),
                    properties: vec!["channels_count".to_string(), "name".to_string()],
                },
                LabelSchema {
                    label: "Spacecraft".to_string(),
                    properties: vec!["launch_mass_kg".to_string(), "name".to_string()],
                },
            ],
            relationship_types: vec!["CARRIES_INSTRUMENT".to_string()],
            patterns: vec![RelationshipPattern {
                from: "Spacecraft".to_string(),
                rel_type: "CARRIES_INSTRUMENT".to_string(),
                to: "Instrument".to_string(),
            }],
        }
    }

    #[test]
    fn render_lists_labels_with_properties() {
        let text = sample_schema().render();
        assert!(text.contains("Node properties:"));
        assert!(text.contains("Spacecraft {launch_mass_kg, name}"));
        assert!(text.contains("Instrument {channels_count, name}"));
    }

    #[test]
    fn render_lists_relationships_and_patterns() {
        let text = sample_schema().render();
        assert!(text.contains("Relationship types:\nCARRIES_INSTRUMENT"));
        assert!(text.contains("(:Spacecraft)-[:CARRIES_INSTRUMENT]->(:Instrument)"));
    }

    #[test]
    fn render_omits_pattern_section_when_empty() {
        let mut schema = sample_schema();
        schema.patterns.clear();
        assert!(!schema.render().contains("The relationships:"));
    }

    #[test]
    fn empty_schema_is_empty() {
        assert!(GraphSchema::default().is_empty());
        assert!(!sample_schema().is_empty());
    }
}
