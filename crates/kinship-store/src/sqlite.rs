//! SQLite-backed path store
//!
//! Every edge record is one row of the `edges` table, addressed both by id
//! and by its unique path. A unit of work runs inside a single SQLite
//! transaction; the first failing statement rolls the whole unit back.

use std::path::Path;

use kinship_domain::{
    Bucket, EdgeRecord, EdgeRole, IdentityId, IdentityRef, RelationshipId, RelationshipStatus,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::{
    BucketPath, IdentityPath, PathStore, PrefixQuery, SortOrder, StoreConfig, StoreError,
    StoredEdge, UnitOfWork, Write,
};

const EDGE_COLUMNS: &str = "owner_path, bucket, id, from_id, from_provider, from_remote, \
     to_id, to_provider, to_remote, role, status, created_at, reciprocal_id";

/// SQLite implementation of [`PathStore`]
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should own its own
/// store instance.
///
/// # Examples
///
/// ```no_run
/// use kinship_store::{SqlitePathStore, StoreConfig};
///
/// let store = SqlitePathStore::open(&StoreConfig::at_path("relationships.db")).unwrap();
/// ```
#[derive(Debug)]
pub struct SqlitePathStore {
    conn: Connection,
}

impl SqlitePathStore {
    /// Create a store on the given database path with default settings
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store from configuration
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(config.busy_timeout())?;

        if !config.is_in_memory() {
            let mode: String = conn.pragma_update_and_check(
                None,
                "journal_mode",
                config.journal_mode.as_str(),
                |row| row.get(0),
            )?;
            tracing::debug!("Opened {} with journal mode {}", config.database_path, mode);
        }

        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Underlying connection, for maintenance and diagnostics
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;

        tracing::debug!("Edge schema initialized");
        Ok(())
    }

    /// Convert RelationshipId to bytes for storage
    fn id_to_bytes(id: RelationshipId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to RelationshipId
    fn bytes_to_id(bytes: &[u8]) -> Result<RelationshipId, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!(
                "Expected 16 bytes for RelationshipId, got {}",
                bytes.len()
            ))
        })?;
        Ok(RelationshipId::from_value(u128::from_be_bytes(arr)))
    }

    fn conversion_error(index: usize, ty: Type, err: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(err))
    }

    fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredEdge> {
        let owner_path: String = row.get(0)?;

        let bucket_name: String = row.get(1)?;
        let bucket = Bucket::parse(&bucket_name).ok_or_else(|| {
            Self::conversion_error(
                1,
                Type::Text,
                StoreError::InvalidData(format!("Unknown bucket: {}", bucket_name)),
            )
        })?;

        let id_bytes: Vec<u8> = row.get(2)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map_err(|e| Self::conversion_error(2, Type::Blob, e))?;

        let role_str: String = row.get(9)?;
        let role = EdgeRole::parse(&role_str).ok_or_else(|| {
            Self::conversion_error(
                9,
                Type::Text,
                StoreError::InvalidData(format!("Unknown role: {}", role_str)),
            )
        })?;

        let status_str: String = row.get(10)?;
        let status = RelationshipStatus::parse(&status_str).ok_or_else(|| {
            Self::conversion_error(
                10,
                Type::Text,
                StoreError::InvalidData(format!("Unknown status: {}", status_str)),
            )
        })?;

        let reciprocal_bytes: Vec<u8> = row.get(12)?;
        let reciprocal = Self::bytes_to_id(&reciprocal_bytes)
            .map_err(|e| Self::conversion_error(12, Type::Blob, e))?;

        Ok(StoredEdge {
            bucket: IdentityPath::from_raw(owner_path).bucket(bucket),
            record: EdgeRecord {
                id,
                from: IdentityRef {
                    id: IdentityId::new(row.get::<_, String>(3)?),
                    provider_id: row.get(4)?,
                    remote_id: row.get(5)?,
                },
                to: IdentityRef {
                    id: IdentityId::new(row.get::<_, String>(6)?),
                    provider_id: row.get(7)?,
                    remote_id: row.get(8)?,
                },
                role,
                status,
                created_at: row.get::<_, i64>(11)? as u64,
                reciprocal,
            },
        })
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }

    fn insert(
        tx: &Transaction<'_>,
        bucket: &BucketPath,
        record: &EdgeRecord,
        path: &str,
    ) -> Result<(), StoreError> {
        let result = tx.execute(
            "INSERT INTO edges (id, path, owner_path, bucket, entry_key,
                                from_id, from_provider, from_remote,
                                to_id, to_provider, to_remote,
                                role, status, created_at, reciprocal_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                Self::id_to_bytes(record.id),
                path,
                bucket.owner().as_str(),
                bucket.bucket().name(),
                record.key(),
                record.from.id.as_str(),
                &record.from.provider_id,
                &record.from.remote_id,
                record.to.id.as_str(),
                &record.to.provider_id,
                &record.to.remote_id,
                record.role.as_str(),
                record.status.as_str(),
                record.created_at as i64,
                Self::id_to_bytes(record.reciprocal),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if Self::is_unique_violation(&e) => Err(StoreError::KeyConflict(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn apply_put(
        tx: &Transaction<'_>,
        bucket: &BucketPath,
        record: &EdgeRecord,
    ) -> Result<(), StoreError> {
        let path = bucket.entry(record.key());
        let id_bytes = Self::id_to_bytes(record.id);

        let current: Option<String> = tx
            .query_row(
                "SELECT path FROM edges WHERE id = ?1",
                params![&id_bytes],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            Some(existing) if existing == path => {
                tx.execute(
                    "UPDATE edges SET from_id = ?2, from_provider = ?3, from_remote = ?4,
                                      to_id = ?5, to_provider = ?6, to_remote = ?7,
                                      role = ?8, status = ?9, created_at = ?10, reciprocal_id = ?11
                     WHERE id = ?1",
                    params![
                        &id_bytes,
                        record.from.id.as_str(),
                        &record.from.provider_id,
                        &record.from.remote_id,
                        record.to.id.as_str(),
                        &record.to.provider_id,
                        &record.to.remote_id,
                        record.role.as_str(),
                        record.status.as_str(),
                        record.created_at as i64,
                        Self::id_to_bytes(record.reciprocal),
                    ],
                )?;
                Ok(())
            }
            Some(_) => {
                // Moving appends the record to the end of its new bucket.
                tx.execute("DELETE FROM edges WHERE id = ?1", params![&id_bytes])?;
                Self::insert(tx, bucket, record, &path)
            }
            None => Self::insert(tx, bucket, record, &path),
        }
    }

    fn apply_remove(tx: &Transaction<'_>, id: RelationshipId) -> Result<(), StoreError> {
        let deleted = tx.execute(
            "DELETE FROM edges WHERE id = ?1",
            params![Self::id_to_bytes(id)],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl PathStore for SqlitePathStore {
    fn get(&self, bucket: &BucketPath, key: &str) -> Result<Option<EdgeRecord>, StoreError> {
        let sql = format!("SELECT {} FROM edges WHERE path = ?1", EDGE_COLUMNS);
        let stored = self
            .conn
            .query_row(&sql, params![bucket.entry(key)], Self::row_to_stored)
            .optional()?;
        Ok(stored.map(|stored| stored.record))
    }

    fn find(&self, id: RelationshipId) -> Result<Option<StoredEdge>, StoreError> {
        let sql = format!("SELECT {} FROM edges WHERE id = ?1", EDGE_COLUMNS);
        let stored = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id)], Self::row_to_stored)
            .optional()?;
        Ok(stored)
    }

    fn size(&self, bucket: &BucketPath) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE owner_path = ?1 AND bucket = ?2",
            params![bucket.owner().as_str(), bucket.bucket().name()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn iterate(&self, bucket: &BucketPath) -> Result<Vec<EdgeRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM edges WHERE owner_path = ?1 AND bucket = ?2 ORDER BY seq",
            EDGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![bucket.owner().as_str(), bucket.bucket().name()],
                Self::row_to_stored,
            )?
            .map(|stored| stored.map(|stored| stored.record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn query(&self, query: &PrefixQuery) -> Result<Vec<StoredEdge>, StoreError> {
        let direction = match query.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT {} FROM edges WHERE substr(path, 1, length(?1)) = ?1
             ORDER BY created_at {dir}, seq {dir} LIMIT ?2 OFFSET ?3",
            EDGE_COLUMNS,
            dir = direction
        );
        // Exact comparison: LIKE would fold ASCII case across identities.
        // SQLite reads a negative LIMIT as "no limit".
        let limit = query.limit.map(|limit| limit as i64).unwrap_or(-1);

        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map(
                params![&query.prefix, limit, query.offset as i64],
                Self::row_to_stored,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn save(&mut self, unit: UnitOfWork) -> Result<(), StoreError> {
        let writes = unit.len();
        let tx = self.conn.transaction()?;
        for write in unit {
            match write {
                Write::Put { bucket, record } => Self::apply_put(&tx, &bucket, &record)?,
                Write::Remove { id } => Self::apply_remove(&tx, id)?,
            }
        }
        tx.commit()?;

        tracing::debug!("Committed {} writes to SQLite store", writes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_domain::Identity;

    #[test]
    fn test_store_initialization() {
        let store = SqlitePathStore::new(":memory:");
        assert!(store.is_ok(), "Store should initialize successfully");
    }

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = RelationshipId::new();
        let bytes = SqlitePathStore::id_to_bytes(id);
        assert_eq!(SqlitePathStore::bytes_to_id(&bytes).unwrap(), id);
        assert!(SqlitePathStore::bytes_to_id(&bytes[..4]).is_err());
    }

    #[test]
    fn test_put_then_move() {
        let mut store = SqlitePathStore::new(":memory:").unwrap();
        let x = Identity::new("1", "p", "x");
        let y = Identity::new("2", "p", "y");
        let (mut a, _) = EdgeRecord::pair(&x, &y, RelationshipStatus::Pending, 1000);
        let sender_bucket = IdentityPath::of(&x).bucket(Bucket::Sender);
        let relationship_bucket = IdentityPath::of(&x).bucket(Bucket::Relationship);

        let mut unit = UnitOfWork::new();
        unit.put(sender_bucket.clone(), a.clone());
        store.save(unit).unwrap();
        assert_eq!(store.get(&sender_bucket, "y").unwrap(), Some(a.clone()));

        a.status = RelationshipStatus::Confirmed;
        let mut unit = UnitOfWork::new();
        unit.put(relationship_bucket.clone(), a.clone());
        store.save(unit).unwrap();

        assert_eq!(store.size(&sender_bucket).unwrap(), 0);
        assert_eq!(store.iterate(&relationship_bucket).unwrap(), vec![a.clone()]);
        let found = store.find(a.id).unwrap().unwrap();
        assert_eq!(found.bucket, relationship_bucket);
        assert_eq!(found.path(), "/p/x/relationship/y");
    }

    #[test]
    fn test_prefix_query_is_exact() {
        let mut store = SqlitePathStore::new(":memory:").unwrap();
        let bob = Identity::new("9", "p", "bob");
        let mut unit = UnitOfWork::new();
        for (id, remote) in [("1", "alice"), ("2", "a_ice")] {
            let owner = Identity::new(id, "p", remote);
            let (record, _) = EdgeRecord::pair(&owner, &bob, RelationshipStatus::Pending, 1000);
            unit.put(IdentityPath::of(&owner).bucket(Bucket::Sender), record);
        }
        store.save(unit).unwrap();

        let matching = |remote: &str| {
            let query = PrefixQuery {
                prefix: IdentityPath::of(&Identity::new("0", "p", remote)).subtree_prefix(),
                order: SortOrder::Descending,
                offset: 0,
                limit: None,
            };
            store.query(&query).unwrap().len()
        };
        assert_eq!(matching("alice"), 1);
        assert_eq!(matching("Alice"), 0);
        assert_eq!(matching("a_ice"), 1);
        assert_eq!(matching("a%ice"), 0);
    }

    #[test]
    fn test_conflict_rolls_back_unit() {
        let mut store = SqlitePathStore::new(":memory:").unwrap();
        let x = Identity::new("1", "p", "x");
        let y = Identity::new("2", "p", "y");
        let (a, _) = EdgeRecord::pair(&x, &y, RelationshipStatus::Pending, 1000);
        let sender_bucket = IdentityPath::of(&x).bucket(Bucket::Sender);

        let mut unit = UnitOfWork::new();
        unit.put(sender_bucket.clone(), a);
        store.save(unit).unwrap();

        let (c, d) = EdgeRecord::pair(&x, &y, RelationshipStatus::Pending, 2000);
        let receiver_bucket = IdentityPath::of(&y).bucket(Bucket::Receiver);
        let mut unit = UnitOfWork::new();
        unit.put(receiver_bucket.clone(), d.clone()).put(sender_bucket, c);

        assert!(matches!(store.save(unit), Err(StoreError::KeyConflict(_))));
        assert_eq!(store.size(&receiver_bucket).unwrap(), 0);
        assert!(store.find(d.id).unwrap().is_none());
    }
}
