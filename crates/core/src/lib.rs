//! # Cardpress Core
//!
//! Domain types, traits, and error definitions for the Cardpress publishing
//! pipeline. This crate has **no I/O**; it defines the domain model and the
//! pure token resolver that all other crates build on.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping the authoring system or destination via configuration
//! - Easy testing with recording mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod payload;
pub mod record;
pub mod store;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use error::{Error, PublishError, Result, StoreError};
pub use payload::{CacheDirective, PublishedPayload, DEFAULT_CACHE_TTL, DEFAULT_CTA_ACTION};
pub use record::ContentRecord;
pub use store::{ContentDestination, ContentSource, Credential};
pub use token::{is_profile_token, render_profile, resolve, TokenTable, PROFILE_PREFIX};
