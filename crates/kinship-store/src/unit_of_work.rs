//! Explicit unit of work
//!
//! Engine operations never write to a store directly. They stage every write
//! of one logical operation in a [`UnitOfWork`] and hand it to
//! [`crate::PathStore::save`], which applies all of it or none of it.

use kinship_domain::{EdgeRecord, RelationshipId};

use crate::BucketPath;

/// A staged write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Store `record` in `bucket` under its key
    ///
    /// If a record with the same id already exists elsewhere it is moved, so
    /// its id and payload survive a change of bucket.
    Put {
        /// Target bucket
        bucket: BucketPath,
        /// Record to store
        record: EdgeRecord,
    },

    /// Delete the record with this id
    Remove {
        /// Record id
        id: RelationshipId,
    },
}

/// Ordered set of writes committed atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    /// Create an empty unit
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put of `record` into `bucket`
    pub fn put(&mut self, bucket: BucketPath, record: EdgeRecord) -> &mut Self {
        self.writes.push(Write::Put { bucket, record });
        self
    }

    /// Stage the removal of record `id`
    pub fn remove(&mut self, id: RelationshipId) -> &mut Self {
        self.writes.push(Write::Remove { id });
        self
    }

    /// Number of staged writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl IntoIterator for UnitOfWork {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
