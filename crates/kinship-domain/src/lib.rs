//! Kinship Domain Layer
//!
//! Core model of the relationship graph between identities. It has no
//! infrastructure dependencies and defines the value types, the placement
//! rules and the trait interfaces the storage layer builds on.
//!
//! ## Key Concepts
//!
//! - **Identity**: A participant, owned by an external identity directory
//! - **Relationship**: The caller-facing edge between a sender and a receiver
//! - **Edge Record**: One participant's persisted half of a relationship
//! - **Bucket**: Per-identity container of edge records, keyed by peer remote id
//! - **Placement**: Which bucket each half of a pair lives in, by status
//!
//! ## Architecture
//!
//! - Only `uuid` as an external dependency (record ids are UUIDv7)
//! - Pure model and rules, no I/O
//! - Collaborator traits for everything the storage layer calls out to

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod edge;
pub mod identity;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use bucket::{Bucket, Placement};
pub use edge::{EdgeRecord, EdgeRole, IdentityRef};
pub use identity::{Identity, IdentityId, Profile};
pub use relationship::{Relationship, RelationshipId, RelationshipStatus};
