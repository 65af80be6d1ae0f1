//! HTTP collaborator for authoring systems and publish destinations that
//! speak plain JSON over HTTP with bearer authentication.
//!
//! Reads are `GET <location>`; writes are `PUT <location>` with the artifact
//! as body and a `Cache-Control` header telling downstream caches the
//! artifact is public and immutable for its TTL.

use std::time::Duration;

use async_trait::async_trait;
use cardpress_core::error::StoreError;
use cardpress_core::payload::{CacheDirective, PublishedPayload};
use cardpress_core::store::{ContentDestination, ContentSource, Credential};
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use tracing::{debug, warn};

/// A `reqwest`-backed source and destination sharing one connection pool.
///
/// Every request is bounded by the client timeout, so a hung upstream ends in
/// a `StoreError::Transport` instead of blocking the invocation.
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
}

impl HttpStore {
    /// Create a new HTTP store with a per-request timeout.
    pub fn new(timeout: Duration) -> cardpress_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cardpress/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| cardpress_core::Error::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }

    /// Build from the `[http]` configuration section.
    pub fn from_config(config: &cardpress_config::HttpConfig) -> cardpress_core::Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Read the body of a non-success response for diagnostics.
    ///
    /// A body that cannot be read is reported by its read error.
    async fn failure(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("failed to read response body: {e}"),
        };
        StoreError::Status { status, body }
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Transport(format!("request timed out: {e}"))
    } else {
        StoreError::Transport(e.to_string())
    }
}

#[async_trait]
impl ContentSource for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        location: &str,
        credential: Option<&Credential>,
    ) -> Result<serde_json::Value, StoreError> {
        debug!(location, "Fetching content record");

        let mut request = self.client.get(location).header(ACCEPT, "application/json");
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.bearer());
        }

        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let err = Self::failure(response).await;
            warn!(location, status = err.status(), "Source returned error");
            return Err(err);
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| StoreError::Decode(format!("content record is not valid JSON: {e}")))
    }
}

#[async_trait]
impl ContentDestination for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn write(
        &self,
        location: &str,
        credential: Option<&Credential>,
        payload: &PublishedPayload,
        body: &[u8],
        cache: CacheDirective,
    ) -> Result<(), StoreError> {
        debug!(
            location,
            card_id = %payload.card_id,
            bytes = body.len(),
            cache_control = %cache,
            "Writing published artifact"
        );

        let mut request = self
            .client
            .put(location)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, cache.header_value())
            .body(body.to_vec());
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.bearer());
        }

        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let err = Self::failure(response).await;
            warn!(location, status = err.status(), "Destination returned error");
            return Err(err);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, put};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        authorization: Option<String>,
        cache_control: Option<String>,
        body: Vec<u8>,
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn store() -> HttpStore {
        HttpStore::new(Duration::from_secs(5)).unwrap()
    }

    fn payload() -> PublishedPayload {
        PublishedPayload {
            card_id: "cup".into(),
            headline: Some("Hi".into()),
            body: None,
            image: None,
            cta_label: None,
            cta_action: "DISMISS".into(),
            terms_text: None,
            cache_ttl: 3600,
        }
    }

    #[tokio::test]
    async fn fetch_sends_bearer_and_parses_json() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/cards/cup.json",
            get(move |headers: HeaderMap| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().authorization = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    axum::Json(serde_json::json!({ "cardId": "cup" }))
                }
            }),
        );
        let base = serve(app).await;

        let doc = store()
            .fetch(&format!("{base}/cards/cup.json"), Some(&Credential::new("src")))
            .await
            .unwrap();

        assert_eq!(doc["cardId"], "cup");
        assert_eq!(
            seen.lock().unwrap().authorization.as_deref(),
            Some("Bearer src")
        );
    }

    #[tokio::test]
    async fn fetch_surfaces_upstream_status_and_body() {
        let app = Router::new().route(
            "/cards/missing.json",
            get(|| async { (StatusCode::NOT_FOUND, "no such fragment") }),
        );
        let base = serve(app).await;

        let err = store()
            .fetch(&format!("{base}/cards/missing.json"), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::Status {
                status: 404,
                body: "no such fragment".into()
            }
        );
    }

    #[tokio::test]
    async fn fetch_rejects_non_json_body() {
        let app = Router::new().route("/cards/html", get(|| async { "<html>login</html>" }));
        let base = serve(app).await;

        let err = store()
            .fetch(&format!("{base}/cards/html"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn write_sends_cache_control_and_exact_body() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/content/cards/cup.json",
            put(move |headers: HeaderMap, body: axum::body::Bytes| {
                let recorder = recorder.clone();
                async move {
                    let mut seen = recorder.lock().unwrap();
                    seen.authorization = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    seen.cache_control = headers
                        .get("cache-control")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    seen.body = body.to_vec();
                    StatusCode::CREATED
                }
            }),
        );
        let base = serve(app).await;

        let payload = payload();
        let body = payload.to_bytes().unwrap();
        store()
            .write(
                &format!("{base}/content/cards/cup.json"),
                Some(&Credential::new("dst")),
                &payload,
                &body,
                payload.cache_directive(),
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.authorization.as_deref(), Some("Bearer dst"));
        assert_eq!(
            seen.cache_control.as_deref(),
            Some("public, max-age=3600, immutable")
        );
        assert_eq!(seen.body, body);
    }

    #[tokio::test]
    async fn write_surfaces_upstream_failure() {
        let app = Router::new().route(
            "/content/cards/cup.json",
            put(|| async { (StatusCode::FORBIDDEN, "read-only") }),
        );
        let base = serve(app).await;

        let payload = payload();
        let err = store()
            .write(
                &format!("{base}/content/cards/cup.json"),
                None,
                &payload,
                &payload.to_bytes().unwrap(),
                payload.cache_directive(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.body(), "read-only");
    }

    #[tokio::test]
    async fn truncated_error_body_reports_read_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let err = store()
            .fetch(&format!("http://{addr}/cards/cup.json"), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(err.body().starts_with("failed to read response body"));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = store()
            .fetch(&format!("http://{addr}/cards/cup.json"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        assert_eq!(err.status(), 502);
    }
}
