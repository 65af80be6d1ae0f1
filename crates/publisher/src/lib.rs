//! Publish transformer for Cardpress.
//!
//! Validates an invocation, fetches the content record, resolves static
//! tokens field by field, and writes the immutable artifact with its cache
//! directive. See [`Publisher::publish`].

pub mod publisher;
pub mod request;
pub mod transform;

pub use publisher::{DEFAULT_DESTINATION_PREFIX, PublishReceipt, Publisher};
pub use request::{PublishRequest, ValidatedRequest};
pub use transform::{assemble, unresolved_tokens};
