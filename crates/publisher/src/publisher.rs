//! The publish transformer.
//!
//! One invocation is one sequential fetch followed by one sequential write.
//! The publisher keeps no state between invocations, so any number of them
//! can run concurrently against the same `Publisher`.

use std::sync::Arc;

use cardpress_core::error::PublishError;
use cardpress_core::record::ContentRecord;
use cardpress_core::store::{ContentDestination, ContentSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::request::{PublishRequest, destination_location};
use crate::transform;

/// Default path under the destination host for card artifacts.
pub const DEFAULT_DESTINATION_PREFIX: &str = "/content/cards";

/// Confirmation returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub card_id: String,

    /// Where the artifact was written
    pub location: String,

    pub message: String,

    /// `Cache-Control` value sent with the write
    pub cache_control: String,

    /// SHA-256 of the written bytes; equal digests mean identical artifacts
    pub sha256: String,

    pub published_at: DateTime<Utc>,
}

/// Fetches content records, resolves them, and writes the artifacts.
pub struct Publisher {
    source: Arc<dyn ContentSource>,
    destination: Arc<dyn ContentDestination>,
    destination_prefix: String,
}

impl Publisher {
    /// Create a new publisher over the given collaborators.
    pub fn new(source: Arc<dyn ContentSource>, destination: Arc<dyn ContentDestination>) -> Self {
        Self {
            source,
            destination,
            destination_prefix: DEFAULT_DESTINATION_PREFIX.to_string(),
        }
    }

    /// Set the path under the destination host where artifacts are written.
    pub fn with_destination_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.destination_prefix = prefix.into();
        self
    }

    pub fn destination_prefix(&self) -> &str {
        &self.destination_prefix
    }

    /// Run one publish invocation.
    ///
    /// Every failure is terminal: nothing is retried and nothing is written
    /// unless the whole payload could be assembled.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        let span = info_span!(
            "publish",
            invocation_id = %uuid::Uuid::new_v4(),
            card_id = tracing::field::Empty,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        let validated = request.validate().inspect_err(|e| {
            warn!(error = %e, "Rejected publish request");
        })?;

        debug!(
            source = %self.source.name(),
            location = %validated.source_location,
            "Fetching content record"
        );
        let document = self
            .source
            .fetch(
                &validated.source_location,
                validated.source_credential.as_ref(),
            )
            .await
            .map_err(PublishError::fetch_failed)?;

        let record = ContentRecord::from_json(document).map_err(PublishError::fetch_failed)?;
        let payload = transform::assemble(&record, &validated.static_tokens).inspect_err(|e| {
            warn!(error = %e, "Content record is invalid");
        })?;
        tracing::Span::current().record("card_id", payload.card_id.as_str());

        let unresolved = transform::unresolved_tokens(&record, &validated.static_tokens);
        if !unresolved.is_empty() {
            warn!(
                tokens = ?unresolved,
                "Static tokens without a value were left in place"
            );
        }

        let body = payload.to_bytes().map_err(|e| PublishError::DestinationWriteFailed {
            status: cardpress_core::error::TRANSPORT_FAILURE_STATUS,
            body: format!("Failed to serialize payload: {e}"),
        })?;
        let cache = payload.cache_directive();
        let location = destination_location(
            &validated.destination_host,
            &self.destination_prefix,
            &payload.card_id,
        );

        debug!(
            destination = %self.destination.name(),
            location = %location,
            bytes = body.len(),
            "Writing published artifact"
        );
        self.destination
            .write(
                &location,
                validated.destination_credential.as_ref(),
                &payload,
                &body,
                cache,
            )
            .await
            .map_err(PublishError::write_failed)?;

        let receipt = PublishReceipt {
            message: format!("Card '{}' published to {location}", payload.card_id),
            card_id: payload.card_id,
            location,
            cache_control: cache.header_value(),
            sha256: hex::encode(Sha256::digest(&body)),
            published_at: Utc::now(),
        };

        info!(
            location = %receipt.location,
            max_age = cache.max_age,
            "Card published"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardpress_core::error::StoreError;
    use cardpress_core::payload::{CacheDirective, PublishedPayload};
    use cardpress_core::store::Credential;
    use cardpress_core::token::TokenTable;
    use cardpress_stores::InMemoryStore;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A source that returns a scripted result and counts calls.
    struct ScriptedSource {
        result: Result<serde_json::Value, StoreError>,
        calls: AtomicUsize,
        credentials: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn ok(doc: serde_json::Value) -> Self {
            Self::new(Ok(doc))
        }

        fn new(result: Result<serde_json::Value, StoreError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
                credentials: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(
            &self,
            _location: &str,
            credential: Option<&Credential>,
        ) -> Result<serde_json::Value, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.credentials
                .lock()
                .unwrap()
                .push(credential.map(|c| c.expose().to_string()));
            self.result.clone()
        }
    }

    /// A destination that always fails with the given error.
    struct FailingDestination(StoreError);

    #[async_trait::async_trait]
    impl ContentDestination for FailingDestination {
        fn name(&self) -> &str {
            "failing"
        }

        async fn write(
            &self,
            _location: &str,
            _credential: Option<&Credential>,
            _payload: &PublishedPayload,
            _body: &[u8],
            _cache: CacheDirective,
        ) -> Result<(), StoreError> {
            Err(self.0.clone())
        }
    }

    fn request() -> PublishRequest {
        PublishRequest {
            source_path: Some("/api/cards/cup.json".into()),
            source_host: Some("https://author.example.com".into()),
            destination_host: Some("https://publish.example.com".into()),
            source_token: Some("src-token".into()),
            destination_token: Some("dst-token".into()),
            static_tokens: [("env.brand".to_string(), "Acme".to_string())]
                .into_iter()
                .collect::<TokenTable>(),
        }
    }

    fn cup() -> serde_json::Value {
        json!({
            "cardId": "cup",
            "headline": "Hi {{env.brand}}, {{profile.name}}",
            "cacheTTL": 3600
        })
    }

    #[tokio::test]
    async fn publishes_resolved_payload_with_cache_directive() {
        let source = Arc::new(ScriptedSource::ok(cup()));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source.clone(), destination.clone());

        let receipt = publisher.publish(&request()).await.unwrap();

        assert_eq!(receipt.card_id, "cup");
        assert_eq!(
            receipt.location,
            "https://publish.example.com/content/cards/cup.json"
        );
        assert!(receipt.message.contains("cup"));
        assert!(receipt.cache_control.contains("max-age=3600"));

        let stored = destination.artifact(&receipt.location).await.unwrap();
        assert_eq!(
            stored.payload.headline.as_deref(),
            Some("Hi Acme, {{profile.name}}")
        );
        assert_eq!(stored.cache.header_value(), "public, max-age=3600, immutable");
        assert_eq!(
            source.credentials.lock().unwrap().as_slice(),
            &[Some("src-token".to_string())]
        );
    }

    #[tokio::test]
    async fn republish_is_byte_identical() {
        let source = Arc::new(ScriptedSource::ok(cup()));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source, destination.clone());

        let first = publisher.publish(&request()).await.unwrap();
        let first_body = destination.artifact(&first.location).await.unwrap().body;
        let second = publisher.publish(&request()).await.unwrap();
        let second_body = destination.artifact(&second.location).await.unwrap().body;

        assert_eq!(first.sha256, second.sha256);
        assert_eq!(first_body, second_body);
        assert_eq!(destination.artifacts().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_destination_host_makes_no_fetch() {
        let source = Arc::new(ScriptedSource::ok(cup()));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source.clone(), destination.clone());

        let mut req = request();
        req.destination_host = None;
        let err = publisher.publish(&req).await.unwrap_err();

        assert_eq!(err, PublishError::MissingParameter("destination_host".into()));
        assert_eq!(err.status_code(), 400);
        assert_eq!(source.calls(), 0);
        assert!(destination.artifacts().await.is_empty());
    }

    #[tokio::test]
    async fn missing_card_id_makes_no_write() {
        let source = Arc::new(ScriptedSource::ok(json!({ "headline": "orphan" })));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source.clone(), destination.clone());

        let err = publisher.publish(&request()).await.unwrap_err();

        assert_eq!(err.status_code(), 422);
        assert_eq!(source.calls(), 1);
        assert!(destination.artifacts().await.is_empty());
    }

    #[tokio::test]
    async fn card_id_with_path_separators_makes_no_write() {
        let source = Arc::new(ScriptedSource::ok(json!({ "cardId": "../../admin/index" })));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source, destination.clone());

        let err = publisher.publish(&request()).await.unwrap_err();

        assert_eq!(err.kind(), "invalid_field");
        assert_eq!(err.status_code(), 422);
        assert!(destination.artifacts().await.is_empty());
    }

    #[tokio::test]
    async fn source_failure_propagates_status_and_body() {
        let source = Arc::new(ScriptedSource::new(Err(StoreError::Status {
            status: 401,
            body: "token expired".into(),
        })));
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(source, destination.clone());

        let err = publisher.publish(&request()).await.unwrap_err();

        assert_eq!(
            err,
            PublishError::SourceFetchFailed {
                status: 401,
                body: "token expired".into()
            }
        );
        assert!(destination.artifacts().await.is_empty());
    }

    #[tokio::test]
    async fn non_object_record_is_upstream_failure() {
        let source = Arc::new(ScriptedSource::ok(json!("not a record")));
        let publisher = Publisher::new(source, Arc::new(InMemoryStore::new()));

        let err = publisher.publish(&request()).await.unwrap_err();
        assert!(matches!(err, PublishError::SourceFetchFailed { status: 502, .. }));
    }

    #[tokio::test]
    async fn destination_failure_propagates_status_and_body() {
        let source = Arc::new(ScriptedSource::ok(cup()));
        let destination = Arc::new(FailingDestination(StoreError::Status {
            status: 507,
            body: "quota exceeded".into(),
        }));
        let publisher = Publisher::new(source, destination);

        let err = publisher.publish(&request()).await.unwrap_err();

        assert_eq!(err.status_code(), 507);
        assert_eq!(err.upstream_body(), Some("quota exceeded"));
        assert_eq!(err.kind(), "destination_write_failed");
    }

    #[tokio::test]
    async fn custom_destination_prefix() {
        let destination = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(Arc::new(ScriptedSource::ok(cup())), destination.clone())
            .with_destination_prefix("/edge/cards/");

        let receipt = publisher.publish(&request()).await.unwrap();
        assert_eq!(receipt.location, "https://publish.example.com/edge/cards/cup.json");
        assert!(destination.artifact(&receipt.location).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_publishes_of_different_cards() {
        let store = Arc::new(InMemoryStore::new());
        for id in ["a", "b", "c"] {
            store
                .insert_document(
                    format!("https://author.example.com/api/cards/{id}.json"),
                    json!({ "cardId": id, "headline": "{{env.brand}} {{profile.name}}" }),
                )
                .await;
        }
        let publisher = Arc::new(Publisher::new(store.clone(), store.clone()));

        let mut handles = Vec::new();
        for id in ["a", "b", "c"] {
            let publisher = publisher.clone();
            let mut req = request();
            req.source_path = Some(format!("/api/cards/{id}.json"));
            handles.push(tokio::spawn(async move { publisher.publish(&req).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let artifacts = store.artifacts().await;
        assert_eq!(artifacts.len(), 3);
        for (_, artifact) in artifacts {
            assert_eq!(artifact.payload.headline.as_deref(), Some("Acme {{profile.name}}"));
            assert_eq!(artifact.cache.max_age, 86_400);
        }
    }
}
