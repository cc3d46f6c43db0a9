//! Kinship Storage Layer
//!
//! Persists relationships between identities as pairs of edge records in a
//! path-indexed store, and exposes the [`RelationshipStorage`] engine that
//! keeps both records of every pair consistent.
//!
//! # Architecture
//!
//! - [`PathStore`]: records addressed by `/{provider}/{remote}/{bucket}/{peer}`
//!   paths, written only through an atomic [`UnitOfWork`]
//! - [`SqlitePathStore`]: durable adapter on SQLite, configured by [`StoreConfig`]
//! - [`MemoryPathStore`]: in-process adapter for tests and embedding
//! - [`RelationshipStorage`]: create, transition, query, count and remove
//!
//! # Examples
//!
//! ```no_run
//! use kinship_store::{MemoryIdentityDirectory, RelationshipStorage, SqlitePathStore};
//!
//! let store = SqlitePathStore::new("kinship.db").unwrap();
//! let storage = RelationshipStorage::new(store, MemoryIdentityDirectory::new());
//! // Engine is now ready for relationship operations
//! ```

#![warn(missing_docs)]

mod config;
mod directory;
mod engine;
mod error;
mod memory;
mod path;
mod path_store;
mod sqlite;
mod unit_of_work;

pub use config::{ConfigError, JournalMode, StoreConfig};
pub use directory::MemoryIdentityDirectory;
pub use engine::RelationshipStorage;
pub use error::{ErrorKind, RelationshipStorageError, StoreError};
pub use memory::MemoryPathStore;
pub use path::{BucketPath, IdentityPath};
pub use path_store::{PathStore, PrefixQuery, SortOrder, StoredEdge};
pub use sqlite::SqlitePathStore;
pub use unit_of_work::{UnitOfWork, Write};
