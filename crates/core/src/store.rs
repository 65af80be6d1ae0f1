//! Collaborator traits: the seams to the authoring system and the
//! cacheable destination.
//!
//! The publisher talks to both through these traits without knowing whether
//! the other side is an HTTP service or an in-memory map.
//!
//! Implementations: HTTP (`reqwest`), in-memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::payload::{CacheDirective, PublishedPayload};

/// A bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Credential from an optional, possibly blank, string.
    pub fn from_option(secret: Option<String>) -> Option<Self> {
        secret
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Self)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// The authoring system holding content records.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// A human-readable name for this source (e.g., "http", "in_memory").
    fn name(&self) -> &str;

    /// Fetch the JSON document at `location`.
    ///
    /// Non-success responses come back as `StoreError::Status` carrying the
    /// upstream status and body.
    async fn fetch(
        &self,
        location: &str,
        credential: Option<&Credential>,
    ) -> std::result::Result<serde_json::Value, StoreError>;
}

/// The cacheable destination for published artifacts.
#[async_trait]
pub trait ContentDestination: Send + Sync {
    fn name(&self) -> &str;

    /// Overwrite the artifact at `location` with `payload`.
    ///
    /// `body` is the exact serialization of `payload`; implementations write
    /// it unchanged so re-publishes stay byte-identical.
    async fn write(
        &self,
        location: &str,
        credential: Option<&Credential>,
        payload: &PublishedPayload,
        body: &[u8],
        cache: CacheDirective,
    ) -> std::result::Result<(), StoreError>;
}
