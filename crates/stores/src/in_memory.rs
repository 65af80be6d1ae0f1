//! In-memory store, useful for testing and dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cardpress_core::error::StoreError;
use cardpress_core::payload::{CacheDirective, PublishedPayload};
use cardpress_core::store::{ContentDestination, ContentSource, Credential};
use tokio::sync::RwLock;

/// An artifact as the destination received it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub payload: PublishedPayload,
    pub body: Vec<u8>,
    pub cache: CacheDirective,
}

/// A source and destination backed by hash maps keyed by location.
///
/// Credentials are accepted and ignored. Fetching an unknown location
/// answers 404 like a real authoring system would.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    artifacts: Arc<RwLock<HashMap<String, StoredArtifact>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source document.
    pub async fn insert_document(&self, location: impl Into<String>, document: serde_json::Value) {
        self.documents.write().await.insert(location.into(), document);
    }

    /// The artifact last written to `location`.
    pub async fn artifact(&self, location: &str) -> Option<StoredArtifact> {
        self.artifacts.read().await.get(location).cloned()
    }

    /// All written artifacts, sorted by location.
    pub async fn artifacts(&self) -> Vec<(String, StoredArtifact)> {
        let mut all: Vec<_> = self
            .artifacts
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

#[async_trait]
impl ContentSource for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn fetch(
        &self,
        location: &str,
        _credential: Option<&Credential>,
    ) -> Result<serde_json::Value, StoreError> {
        self.documents
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::Status {
                status: 404,
                body: format!("no document at {location}"),
            })
    }
}

#[async_trait]
impl ContentDestination for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn write(
        &self,
        location: &str,
        _credential: Option<&Credential>,
        payload: &PublishedPayload,
        body: &[u8],
        cache: CacheDirective,
    ) -> Result<(), StoreError> {
        self.artifacts.write().await.insert(
            location.to_string(),
            StoredArtifact {
                payload: payload.clone(),
                body: body.to_vec(),
                cache,
            },
        );
        Ok(())
    }
}
