//! Error types for the Cardpress domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for setting up Cardpress services.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Status used when an upstream call failed without producing a response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 502;

// --- Bounded context errors ---

/// Terminal outcomes of a failed publish invocation.
///
/// Three status classes are kept apart so callers can distinguish a bad
/// request, invalid content, and an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Content record is missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("Content record field '{name}' is invalid: {reason}")]
    InvalidField { name: String, reason: String },

    #[error("Source fetch failed (status: {status}): {body}")]
    SourceFetchFailed { status: u16, body: String },

    #[error("Destination write failed (status: {status}): {body}")]
    DestinationWriteFailed { status: u16, body: String },
}

impl PublishError {
    /// HTTP status reported to the caller for this outcome.
    ///
    /// Upstream failures carry the upstream status verbatim.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter { .. } => 400,
            Self::MissingRequiredField(_) | Self::InvalidField { .. } => 422,
            Self::SourceFetchFailed { status, .. } => *status,
            Self::DestinationWriteFailed { status, .. } => *status,
        }
    }

    /// Stable machine-readable name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::SourceFetchFailed { .. } => "source_fetch_failed",
            Self::DestinationWriteFailed { .. } => "destination_write_failed",
        }
    }

    /// The upstream response body, for upstream failures.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Self::SourceFetchFailed { body, .. } | Self::DestinationWriteFailed { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn fetch_failed(err: StoreError) -> Self {
        Self::SourceFetchFailed {
            status: err.status(),
            body: err.body(),
        }
    }

    pub fn write_failed(err: StoreError) -> Self {
        Self::DestinationWriteFailed {
            status: err.status(),
            body: err.body(),
        }
    }
}

/// Errors returned by the source and destination collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Status to surface for this failure; transport and decode problems map to 502.
    pub fn status(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::Transport(_) | Self::Decode(_) => TRANSPORT_FAILURE_STATUS,
        }
    }

    /// Body to surface for this failure. Upstream bodies pass through verbatim.
    pub fn body(&self) -> String {
        match self {
            Self::Status { body, .. } => body.clone(),
            Self::Transport(reason) | Self::Decode(reason) => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_are_distinct() {
        let bad_request = PublishError::MissingParameter("destination_host".into());
        let invalid = PublishError::MissingRequiredField("cardId".into());
        let upstream = PublishError::SourceFetchFailed {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(bad_request.status_code(), 400);
        assert_eq!(invalid.status_code(), 422);
        assert_eq!(upstream.status_code(), 503);
    }

    #[test]
    fn upstream_body_passes_through_verbatim() {
        let err = PublishError::write_failed(StoreError::Status {
            status: 409,
            body: "{\"error\":\"locked\"}".into(),
        });
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.upstream_body(), Some("{\"error\":\"locked\"}"));
        assert_eq!(err.kind(), "destination_write_failed");
    }

    #[test]
    fn transport_error_maps_to_bad_gateway() {
        let err = PublishError::fetch_failed(StoreError::Transport("connection refused".into()));
        assert_eq!(err.status_code(), 502);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn invalid_values_share_status_class_with_missing_ones() {
        let bad_host = PublishError::InvalidParameter {
            name: "source_host".into(),
            reason: "must start with http:// or https://".into(),
        };
        let bad_id = PublishError::InvalidField {
            name: "cardId".into(),
            reason: "must be a single path segment".into(),
        };
        assert_eq!(bad_host.status_code(), 400);
        assert_eq!(bad_host.kind(), "invalid_parameter");
        assert_eq!(bad_id.status_code(), 422);
        assert_eq!(bad_id.kind(), "invalid_field");
        assert!(bad_id.to_string().contains("cardId"));
        assert!(bad_id.upstream_body().is_none());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(err.to_string().contains("port taken"));
    }
}
