//! Schema snapshot ownership: introspection, caching, explicit refresh.
//!
//! The descriptor owns one mutable slot holding the current snapshot. A
//! refresh builds a complete snapshot first and swaps it in atomically, so
//! concurrent readers see either the old or the new snapshot, never a mix.
//! Refreshes are serialized behind a gate; a failed refresh leaves the
//! previous snapshot intact.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use orrery_graph::{GraphClient, GraphSchema};

use crate::error::{RagError, Result};

/// An immutable point-in-time view of the graph schema.
///
/// `rendered` is fixed at snapshot construction so every request generated
/// against one version sees byte-identical prompt text.
#[derive(Debug)]
pub struct SchemaSnapshot {
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub schema: GraphSchema,
    pub rendered: String,
}

/// The single shared mutable slot. Readers clone the `Arc` under a read
/// lock; `install` replaces the whole snapshot under a write lock.
pub(crate) struct SchemaCache {
    slot: RwLock<Option<Arc<SchemaSnapshot>>>,
    version: AtomicU64,
}

impl SchemaCache {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    pub(crate) async fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.slot.read().await.clone()
    }

    /// Build a snapshot from a fully introspected schema and swap it in.
    pub(crate) async fn install(&self, schema: GraphSchema) -> Arc<SchemaSnapshot> {
        let snapshot = Arc::new(SchemaSnapshot {
            version: self.version.fetch_add(1, Ordering::SeqCst) + 1,
            captured_at: Utc::now(),
            rendered: schema.render(),
            schema,
        });
        *self.slot.write().await = Some(snapshot.clone());
        snapshot
    }

    pub(crate) async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

/// Obtains and caches the textual/structural description of the graph's
/// labels, relationship types, and properties.
pub struct SchemaDescriptor {
    client: GraphClient,
    cache: SchemaCache,
    refresh_gate: Mutex<()>,
}

impl SchemaDescriptor {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            cache: SchemaCache::new(),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Return the cached snapshot, introspecting on first use or when
    /// `force_refresh` is set.
    ///
    /// On introspection failure the cache is left untouched and
    /// `SchemaUnavailable` is returned; `current()` still serves the
    /// previous snapshot for callers that prefer stale over failing.
    pub async fn get(&self, force_refresh: bool) -> Result<Arc<SchemaSnapshot>> {
        if !force_refresh {
            if let Some(snapshot) = self.cache.current().await {
                return Ok(snapshot);
            }
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if !force_refresh {
            if let Some(snapshot) = self.cache.current().await {
                return Ok(snapshot);
            }
        }

        let schema = self
            .client
            .introspect_schema()
            .await
            .map_err(|e| RagError::SchemaUnavailable(e.to_string()))?;

        let snapshot = self.cache.install(schema).await;
        tracing::info!(version = snapshot.version, "Installed schema snapshot");
        Ok(snapshot)
    }

    /// The cached snapshot, if any, without triggering introspection.
    pub async fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.cache.current().await
    }

    /// Drop the cached snapshot; the next `get` introspects again.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
        tracing::info!("Schema snapshot invalidated");
    }
}
