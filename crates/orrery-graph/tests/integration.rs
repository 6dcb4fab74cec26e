//! Integration tests for orrery-graph against a live Neo4j instance.
//!
//! These tests require `docker compose up` to be running.
//! Run with: cargo test --package orrery-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use orrery_graph::{GraphClient, GraphConfig};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = GraphConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

async fn cleanup(client: &GraphClient) {
    let q = neo4rs::query("MATCH (n:Spacecraft) WHERE n.test_fixture = true DETACH DELETE n");
    let _ = client.inner().run(q).await;
}

async fn seed_spacecraft(client: &GraphClient, name: &str, launch_mass_kg: i64) {
    let q = neo4rs::query(
        "CREATE (:Spacecraft {name: $name, launch_mass_kg: $mass, test_fixture: true})",
    )
    .param("name", name.to_string())
    .param("mass", launch_mass_kg);
    client.inner().run(q).await.unwrap();
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_run_query_materializes_rows() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    cleanup(&client).await;
    seed_spacecraft(&client, "INSAT-3D", 2000).await;

    let records = client
        .run_query(
            "MATCH (s:Spacecraft {name: 'INSAT-3D'}) RETURN s.launch_mass_kg AS launchMass",
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].get("launchMass").and_then(|v| v.as_i64()),
        Some(2000)
    );

    cleanup(&client).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_run_query_zero_rows_is_success() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let records = client
        .run_query("MATCH (s:Spacecraft {name: 'no-such-spacecraft'}) RETURN s.name AS name")
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_invalid_cypher_is_an_error() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    // A syntax error must surface as Err, never as an empty record set.
    let result = client.run_query("MATCH (s:Spacecraft RETURN s").await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_introspect_schema_sees_seeded_label() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    cleanup(&client).await;
    seed_spacecraft(&client, "INSAT-3DR", 2211).await;

    let schema = client.introspect_schema().await.unwrap();
    let spacecraft = schema
        .labels
        .iter()
        .find(|l| l.label == "Spacecraft")
        .expect("Spacecraft label introspected");
    assert!(spacecraft.properties.contains(&"launch_mass_kg".to_string()));

    let text = schema.render();
    assert!(text.contains("Node properties:"));
    assert!(text.contains("Spacecraft"));

    cleanup(&client).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_verify_connectivity() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.verify_connectivity().await.unwrap();
}
