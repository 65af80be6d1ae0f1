//! The published artifact and the cache metadata that accompanies it.

use serde::{Deserialize, Serialize};

/// Cache lifetime used when a record has no usable `cacheTTL`.
pub const DEFAULT_CACHE_TTL: u64 = 86_400;

/// Call-to-action used when a record has no `ctaAction`.
pub const DEFAULT_CTA_ACTION: &str = "DISMISS";

/// The immutable, user-agnostic card artifact written to the destination.
///
/// Field order is fixed so identical inputs serialize to identical bytes.
/// Profile tokens survive in the text fields for the renderer to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPayload {
    pub card_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Asset reference, never templated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,

    pub cta_action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_text: Option<String>,

    #[serde(rename = "cacheTTL")]
    pub cache_ttl: u64,
}

impl PublishedPayload {
    /// Serialize to the exact bytes written to the destination.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Cache directive matching this payload's TTL.
    pub fn cache_directive(&self) -> CacheDirective {
        CacheDirective::immutable(self.cache_ttl)
    }
}

/// `Cache-Control` metadata for a published artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    pub max_age: u64,
}

impl CacheDirective {
    /// Publicly cacheable and immutable for `max_age` seconds.
    pub fn immutable(max_age: u64) -> Self {
        Self { max_age }
    }

    /// Header value, e.g. `public, max-age=3600, immutable`.
    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CacheDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "public, max-age={}, immutable", self.max_age)
    }
}
