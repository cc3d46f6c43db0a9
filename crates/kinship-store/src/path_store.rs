//! The path-indexed store boundary

use kinship_domain::{EdgeRecord, RelationshipId};

use crate::{BucketPath, StoreError, UnitOfWork};

/// A record together with the bucket it currently lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEdge {
    /// Current bucket
    pub bucket: BucketPath,

    /// The record
    pub record: EdgeRecord,
}

impl StoredEdge {
    /// Full path of the record
    pub fn path(&self) -> String {
        self.bucket.entry(self.record.key())
    }
}

/// Sort direction on the creation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first
    Ascending,

    /// Newest first
    #[default]
    Descending,
}

/// Path-prefix query over all records, ordered by creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixQuery {
    /// Literal, case-sensitive path prefix (no wildcards)
    pub prefix: String,

    /// Order on `created_at`; ties follow store order in the same direction
    pub order: SortOrder,

    /// Matches to skip
    pub offset: usize,

    /// Maximum matches to return, `None` for all
    pub limit: Option<usize>,
}

/// Persistent store of edge records addressed by hierarchical paths
///
/// Reads see committed state only. All writes go through [`PathStore::save`],
/// which must apply a [`UnitOfWork`] atomically: after an error, none of the
/// unit's writes may be observable.
pub trait PathStore {
    /// Record stored under `key` in `bucket`
    fn get(&self, bucket: &BucketPath, key: &str) -> Result<Option<EdgeRecord>, StoreError>;

    /// Record with the given id, wherever it lives
    fn find(&self, id: RelationshipId) -> Result<Option<StoredEdge>, StoreError>;

    /// Number of records in `bucket`
    fn size(&self, bucket: &BucketPath) -> Result<usize, StoreError>;

    /// Records of `bucket` in store order
    fn iterate(&self, bucket: &BucketPath) -> Result<Vec<EdgeRecord>, StoreError>;

    /// Records whose path starts with the query prefix
    fn query(&self, query: &PrefixQuery) -> Result<Vec<StoredEdge>, StoreError>;

    /// Commit a unit of work
    fn save(&mut self, unit: UnitOfWork) -> Result<(), StoreError>;
}
