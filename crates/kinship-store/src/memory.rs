//! In-memory path store
//!
//! Keeps records in hash maps and applies a unit of work against a copy of
//! its state, swapping the copy in only when every write succeeded. Store
//! order is insertion order; moving a record to another bucket appends it.

use std::collections::HashMap;

use kinship_domain::{EdgeRecord, RelationshipId};

use crate::{
    BucketPath, PathStore, PrefixQuery, SortOrder, StoreError, StoredEdge, UnitOfWork, Write,
};

#[derive(Debug, Clone)]
struct Entry {
    bucket: BucketPath,
    path: String,
    record: EdgeRecord,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
struct State {
    entries: HashMap<RelationshipId, Entry>,
    paths: HashMap<String, RelationshipId>,
    next_seq: u64,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn apply(&mut self, write: Write) -> Result<(), StoreError> {
        match write {
            Write::Put { bucket, record } => self.put(bucket, record),
            Write::Remove { id } => self.remove(id),
        }
    }

    fn put(&mut self, bucket: BucketPath, record: EdgeRecord) -> Result<(), StoreError> {
        let path = bucket.entry(record.key());

        if let Some(occupant) = self.paths.get(&path) {
            if *occupant != record.id {
                return Err(StoreError::KeyConflict(path));
            }
        }

        let existing = self
            .entries
            .get(&record.id)
            .map(|entry| (entry.path.clone(), entry.seq));
        let seq = match existing {
            Some((old_path, seq)) if old_path == path => seq,
            Some((old_path, _)) => {
                self.paths.remove(&old_path);
                self.next_seq()
            }
            None => self.next_seq(),
        };

        self.paths.insert(path.clone(), record.id);
        self.entries.insert(
            record.id,
            Entry {
                bucket,
                path,
                record,
                seq,
            },
        );
        Ok(())
    }

    fn remove(&mut self, id: RelationshipId) -> Result<(), StoreError> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.paths.remove(&entry.path);
        Ok(())
    }

    fn stored(entry: &Entry) -> StoredEdge {
        StoredEdge {
            bucket: entry.bucket.clone(),
            record: entry.record.clone(),
        }
    }
}

/// Path store held entirely in memory
///
/// Suited to tests and to embedding the engine without persistence.
///
/// # Examples
///
/// ```
/// use kinship_store::MemoryPathStore;
///
/// let store = MemoryPathStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryPathStore {
    state: State,
}

impl MemoryPathStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    /// Whether the store holds no record
    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }
}

impl PathStore for MemoryPathStore {
    fn get(&self, bucket: &BucketPath, key: &str) -> Result<Option<EdgeRecord>, StoreError> {
        let record = self
            .state
            .paths
            .get(&bucket.entry(key))
            .and_then(|id| self.state.entries.get(id))
            .map(|entry| entry.record.clone());
        Ok(record)
    }

    fn find(&self, id: RelationshipId) -> Result<Option<StoredEdge>, StoreError> {
        Ok(self.state.entries.get(&id).map(State::stored))
    }

    fn size(&self, bucket: &BucketPath) -> Result<usize, StoreError> {
        Ok(self
            .state
            .entries
            .values()
            .filter(|entry| entry.bucket == *bucket)
            .count())
    }

    fn iterate(&self, bucket: &BucketPath) -> Result<Vec<EdgeRecord>, StoreError> {
        let mut entries: Vec<&Entry> = self
            .state
            .entries
            .values()
            .filter(|entry| entry.bucket == *bucket)
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(entries.into_iter().map(|entry| entry.record.clone()).collect())
    }

    fn query(&self, query: &PrefixQuery) -> Result<Vec<StoredEdge>, StoreError> {
        let mut entries: Vec<&Entry> = self
            .state
            .entries
            .values()
            .filter(|entry| entry.path.starts_with(&query.prefix))
            .collect();
        entries.sort_by_key(|entry| (entry.record.created_at, entry.seq));
        if query.order == SortOrder::Descending {
            entries.reverse();
        }

        let page = entries.into_iter().skip(query.offset);
        let matches: Vec<StoredEdge> = match query.limit {
            Some(limit) => page.take(limit).map(State::stored).collect(),
            None => page.map(State::stored).collect(),
        };
        Ok(matches)
    }

    fn save(&mut self, unit: UnitOfWork) -> Result<(), StoreError> {
        let writes = unit.len();
        let mut next = self.state.clone();
        for write in unit {
            next.apply(write)?;
        }
        self.state = next;

        tracing::debug!("Committed {} writes to memory store", writes);
        Ok(())
    }
}
