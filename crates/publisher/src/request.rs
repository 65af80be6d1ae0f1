//! Invocation parameters and their validation.

use cardpress_config::AppConfig;
use cardpress_core::error::PublishError;
use cardpress_core::store::Credential;
use cardpress_core::token::TokenTable;
use serde::{Deserialize, Serialize};

/// Parameters of one publish invocation, as received from the trigger.
///
/// Every field is optional on the wire; `validate` decides what is missing.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Path of the content record on the source, e.g. `/api/cards/cup.json`
    #[serde(default)]
    pub source_path: Option<String>,

    /// Base URL of the authoring system
    #[serde(default)]
    pub source_host: Option<String>,

    /// Base URL of the cacheable destination
    #[serde(default)]
    pub destination_host: Option<String>,

    #[serde(default, skip_serializing)]
    pub source_token: Option<String>,

    #[serde(default, skip_serializing)]
    pub destination_token: Option<String>,

    #[serde(default)]
    pub static_tokens: TokenTable,
}

impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<String>| if s.is_some() { "[REDACTED]" } else { "None" };
        f.debug_struct("PublishRequest")
            .field("source_path", &self.source_path)
            .field("source_host", &self.source_host)
            .field("destination_host", &self.destination_host)
            .field("source_token", &redact(&self.source_token))
            .field("destination_token", &redact(&self.destination_token))
            .field("static_tokens", &self.static_tokens)
            .finish()
    }
}

/// A request whose required parameters are all present.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub source_location: String,
    pub destination_host: String,
    pub source_credential: Option<Credential>,
    pub destination_credential: Option<Credential>,
    pub static_tokens: TokenTable,
}

impl PublishRequest {
    /// Fill gaps from configuration.
    ///
    /// Hosts and credentials given on the request win. A configured
    /// credential is only attached when the request targets the configured
    /// host, so a caller-chosen host never receives it. Configured static
    /// tokens sit underneath the request's own table, key by key.
    pub fn with_defaults(mut self, config: &AppConfig) -> Self {
        fill_endpoint(
            &mut self.source_host,
            &mut self.source_token,
            &config.source.host,
            &config.source.token,
        );
        fill_endpoint(
            &mut self.destination_host,
            &mut self.destination_token,
            &config.destination.host,
            &config.destination.token,
        );

        let mut tokens = config.tokens.clone();
        tokens.append(&mut self.static_tokens);
        self.static_tokens = tokens;
        self
    }

    /// Check required parameters without touching the network.
    pub fn validate(&self) -> Result<ValidatedRequest, PublishError> {
        let source_path = required(&self.source_path, "source_path")?;
        let source_host = required(&self.source_host, "source_host")?;
        let destination_host = required(&self.destination_host, "destination_host")?;
        check_base_url(source_host, "source_host")?;
        check_base_url(destination_host, "destination_host")?;

        Ok(ValidatedRequest {
            source_location: join_url(source_host, source_path),
            destination_host: destination_host.to_string(),
            source_credential: Credential::from_option(self.source_token.clone()),
            destination_credential: Credential::from_option(self.destination_token.clone()),
            static_tokens: self.static_tokens.clone(),
        })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn fill_endpoint(
    host: &mut Option<String>,
    token: &mut Option<String>,
    configured_host: &Option<String>,
    configured_token: &Option<String>,
) {
    if is_blank(host) {
        host.clone_from(configured_host);
    }
    if is_blank(token) && same_host(host.as_deref(), configured_host.as_deref()) {
        token.clone_from(configured_token);
    }
}

fn same_host(requested: Option<&str>, configured: Option<&str>) -> bool {
    let normalize = |h: &str| h.trim().trim_end_matches('/').to_string();
    match (requested, configured) {
        (Some(requested), Some(configured)) => normalize(requested) == normalize(configured),
        _ => false,
    }
}

fn check_base_url(host: &str, name: &str) -> Result<(), PublishError> {
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(())
    } else {
        Err(PublishError::InvalidParameter {
            name: name.to_string(),
            reason: "must start with http:// or https://".into(),
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, PublishError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PublishError::MissingParameter(name.to_string()))
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Destination location for a card: `<host><prefix>/<cardId>.json`.
pub fn destination_location(host: &str, prefix: &str, card_id: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        join_url(host, &format!("{card_id}.json"))
    } else {
        join_url(host, &format!("{prefix}/{card_id}.json"))
    }
}
