//! Collaborator implementations for Cardpress.
//!
//! All stores implement the `cardpress_core::ContentSource` and
//! `cardpress_core::ContentDestination` traits.

pub mod http;
pub mod in_memory;

pub use http::HttpStore;
pub use in_memory::{InMemoryStore, StoredArtifact};
