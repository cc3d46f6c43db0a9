//! Relationship storage engine
//!
//! Creates, transitions, reads, counts and removes relationships while
//! keeping the two edge records of every pair consistent: same status, same
//! creation time, mutual reciprocal ids, and the bucket pair their status
//! requires. Each mutation stages both records in one [`UnitOfWork`] so the
//! store applies them together or not at all.
//!
//! Missing identities and records surface differently per operation. Saving
//! reports them as illegal arguments; most reads report a failed retrieval;
//! single lookups and [`RelationshipStorage::get_relationships`] turn them
//! into an absent or empty result.

use std::time::{SystemTime, UNIX_EPOCH};

use kinship_domain::traits::IdentityDirectory;
use kinship_domain::{
    Bucket, EdgeRecord, Identity, IdentityId, IdentityRef, Placement, Relationship,
    RelationshipId, RelationshipStatus,
};
use tracing::{debug, warn};

use crate::{
    IdentityPath, PathStore, PrefixQuery, RelationshipStorageError, SortOrder, StoreError,
    StoredEdge, UnitOfWork,
};

/// Current timestamp in milliseconds since Unix epoch
fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Skip `offset` items, then keep `limit` of them (all of them when negative)
fn page<T>(items: impl Iterator<Item = T>, offset: usize, limit: i64) -> Vec<T> {
    let items = items.skip(offset);
    match usize::try_from(limit) {
        Ok(limit) => items.take(limit).collect(),
        Err(_) => items.collect(),
    }
}

/// Failure inside the engine, before the public operation decides what it means
#[derive(Debug)]
enum Fault {
    NotFound(String),
    Invalid(String),
    Store(StoreError),
    Directory(String),
}

impl From<StoreError> for Fault {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Fault::NotFound(what),
            other => Fault::Store(other),
        }
    }
}

impl Fault {
    fn into_illegal_arguments(self) -> RelationshipStorageError {
        match self {
            Fault::NotFound(what) | Fault::Invalid(what) => {
                RelationshipStorageError::IllegalArguments(what)
            }
            Fault::Store(err) => RelationshipStorageError::Store(err),
            Fault::Directory(msg) => RelationshipStorageError::Directory(msg),
        }
    }

    fn into_failed_to_get(self) -> RelationshipStorageError {
        match self {
            Fault::NotFound(what) => RelationshipStorageError::FailedToGetRelationship(what),
            Fault::Invalid(what) => RelationshipStorageError::IllegalArguments(what),
            Fault::Store(err) => RelationshipStorageError::Store(err),
            Fault::Directory(msg) => RelationshipStorageError::Directory(msg),
        }
    }
}

type Internal<T> = Result<T, Fault>;

fn sender_buckets(status: Option<RelationshipStatus>) -> &'static [Bucket] {
    match status {
        None => &[Bucket::Relationship, Bucket::Sender],
        Some(RelationshipStatus::Confirmed) => &[Bucket::Relationship],
        Some(RelationshipStatus::Pending) => &[Bucket::Sender],
        Some(RelationshipStatus::Ignored) => &[Bucket::Ignore],
    }
}

fn receiver_buckets(status: Option<RelationshipStatus>) -> &'static [Bucket] {
    match status {
        None => &[Bucket::Relationship, Bucket::Receiver],
        Some(RelationshipStatus::Confirmed) => &[Bucket::Relationship],
        Some(RelationshipStatus::Pending) => &[Bucket::Receiver],
        Some(RelationshipStatus::Ignored) => &[Bucket::Ignored],
    }
}

fn all_buckets(status: Option<RelationshipStatus>) -> &'static [Bucket] {
    match status {
        None => &[Bucket::Relationship, Bucket::Receiver, Bucket::Sender],
        Some(RelationshipStatus::Confirmed) => &[Bucket::Relationship],
        Some(RelationshipStatus::Pending) => &[Bucket::Receiver, Bucket::Sender],
        Some(RelationshipStatus::Ignored) => &[Bucket::Ignored],
    }
}

/// Storage engine for relationships between identities
///
/// Stateless between calls: it holds its two collaborators and nothing
/// else. There is no engine-level locking; two concurrent transitions of the
/// same relationship race in the store and the last commit wins.
///
/// # Examples
///
/// ```
/// use kinship_domain::{Identity, Relationship, RelationshipStatus};
/// use kinship_store::{MemoryIdentityDirectory, MemoryPathStore, RelationshipStorage};
///
/// let mut directory = MemoryIdentityDirectory::new();
/// let x = directory.register(Identity::new("1", "organization", "x"));
/// let y = directory.register(Identity::new("2", "organization", "y"));
///
/// let mut storage = RelationshipStorage::new(MemoryPathStore::new(), directory);
/// let request = storage
///     .save_relationship(Relationship::new(x.clone(), y.clone(), RelationshipStatus::Pending))
///     .unwrap();
///
/// assert!(request.id.is_some());
/// assert_eq!(storage.get_outgoing_relationships_count(&x).unwrap(), 1);
/// assert_eq!(storage.get_incoming_relationships_count(&y).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct RelationshipStorage<S, D> {
    store: S,
    directory: D,
}

impl<S, D> RelationshipStorage<S, D>
where
    S: PathStore,
    D: IdentityDirectory,
{
    /// Create an engine over a store and an identity directory
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The identity directory
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Mutable access to the identity directory
    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (S, D) {
        (self.store, self.directory)
    }

    /*
     * Internal
     */

    fn resolve(&self, identity: &Identity) -> Internal<Identity> {
        self.directory
            .resolve(&identity.id)
            .map_err(|e| Fault::Directory(e.to_string()))?
            .ok_or_else(|| Fault::NotFound(format!("Identity {}", identity.id)))
    }

    fn with_profile(&self, identity: &IdentityRef) -> Internal<Identity> {
        let mut identity = identity.to_identity();
        self.directory
            .load_profile(&mut identity)
            .map_err(|e| Fault::Directory(e.to_string()))?;
        Ok(identity)
    }

    fn stub_relationship(record: &EdgeRecord) -> Relationship {
        Relationship {
            id: Some(record.id),
            sender: record.sender().to_identity(),
            receiver: record.receiver().to_identity(),
            status: record.status,
        }
    }

    fn hydrated_relationship(&self, record: &EdgeRecord) -> Internal<Relationship> {
        Ok(Relationship {
            id: Some(record.id),
            sender: self.with_profile(record.sender())?,
            receiver: self.with_profile(record.receiver())?,
            status: record.status,
        })
    }

    fn find_pair(&self, id: RelationshipId) -> Internal<(StoredEdge, StoredEdge)> {
        let found = self
            .store
            .find(id)?
            .ok_or_else(|| Fault::NotFound(format!("Relationship {}", id)))?;

        match self.store.find(found.record.reciprocal)? {
            Some(reciprocal) => Ok((found, reciprocal)),
            None => {
                warn!(
                    "Relationship {} ({}) has no reciprocal {}",
                    id,
                    found.path(),
                    found.record.reciprocal
                );
                Err(Fault::NotFound(format!(
                    "Reciprocal {} of relationship {}",
                    found.record.reciprocal, id
                )))
            }
        }
    }

    fn create(&mut self, relationship: &Relationship) -> Internal<RelationshipId> {
        let sender = self.resolve(&relationship.sender)?;
        let receiver = self.resolve(&relationship.receiver)?;

        if sender.id == receiver.id {
            return Err(Fault::Invalid(format!(
                "Identity {} cannot be in a relationship with itself",
                sender.id
            )));
        }

        let placement = Placement::for_status(relationship.status);
        let sender_bucket = IdentityPath::of(&sender).bucket(placement.sender);
        let receiver_bucket = IdentityPath::of(&receiver).bucket(placement.receiver);

        let (created, symmetrical) =
            EdgeRecord::pair(&sender, &receiver, relationship.status, current_millis());
        let created_path = sender_bucket.entry(created.key());
        let symmetrical_path = receiver_bucket.entry(symmetrical.key());

        let mut unit = UnitOfWork::new();
        unit.put(sender_bucket, created.clone())
            .put(receiver_bucket, symmetrical.clone());
        self.store.save(unit)?;

        debug!(
            "Relationship from {} to {} created ({})",
            created.from.handle(),
            created.to.handle(),
            created_path
        );
        debug!(
            "Symmetrical relationship from {} to {} created ({})",
            symmetrical.from.handle(),
            symmetrical.to.handle(),
            symmetrical_path
        );

        Ok(created.id)
    }

    fn transition(&mut self, id: RelationshipId, status: RelationshipStatus) -> Internal<()> {
        let (saved, symmetrical) = self.find_pair(id)?;
        let placement = Placement::for_status(status);

        let mut unit = UnitOfWork::new();
        let mut moves = Vec::with_capacity(2);
        for stored in [saved, symmetrical] {
            let previous = stored.path();
            let mut record = stored.record;
            record.status = status;

            // Role, not the id the caller used, decides which side goes where.
            let bucket = stored.bucket.owner().bucket(placement.bucket_for(record.role));
            moves.push((previous, bucket.entry(record.key()), record.clone()));
            unit.put(bucket, record);
        }
        self.store.save(unit)?;

        for (previous, current, record) in moves {
            debug!(
                "Relationship from {} to {} saved as {} ({} -> {})",
                record.from.handle(),
                record.to.handle(),
                status,
                previous,
                current
            );
        }

        Ok(())
    }

    fn delete(&mut self, id: RelationshipId) -> Internal<()> {
        let (to_delete, symmetrical) = self.find_pair(id)?;

        let mut unit = UnitOfWork::new();
        unit.remove(symmetrical.record.id).remove(to_delete.record.id);
        self.store.save(unit)?;

        debug!(
            "Symmetrical relationship from {} to {} removed",
            symmetrical.record.from.handle(),
            symmetrical.record.to.handle()
        );
        debug!(
            "Relationship from {} to {} removed",
            to_delete.record.from.handle(),
            to_delete.record.to.handle()
        );

        Ok(())
    }

    fn lookup_between(&self, identity1: &Identity, identity2: &Identity) -> Internal<EdgeRecord> {
        let first = self.resolve(identity1)?;
        let second = self.resolve(identity2)?;
        let first_path = IdentityPath::of(&first);
        let second_path = IdentityPath::of(&second);

        // A confirmed relationship shadows any pending one left for the pair.
        let candidates = [
            (first_path.bucket(Bucket::Relationship), &second.remote_id),
            (first_path.bucket(Bucket::Sender), &second.remote_id),
            (second_path.bucket(Bucket::Sender), &first.remote_id),
        ];
        for (bucket, key) in &candidates {
            if let Some(record) = self.store.get(bucket, key)? {
                return Ok(record);
            }
        }

        Err(Fault::NotFound(format!(
            "No relationship between {} and {}",
            first.id, second.id
        )))
    }

    fn collect(
        &self,
        identity: &Identity,
        buckets: &[Bucket],
        peer_filter: Option<&[Identity]>,
    ) -> Internal<Vec<Relationship>> {
        let owner = IdentityPath::of(&self.resolve(identity)?);

        let mut relationships = Vec::new();
        for bucket in buckets {
            for record in self.store.iterate(&owner.bucket(*bucket))? {
                if let Some(peers) = peer_filter {
                    if !peers.iter().any(|peer| peer.id == record.peer().id) {
                        continue;
                    }
                }
                relationships.push(self.hydrated_relationship(&record)?);
            }
        }
        Ok(relationships)
    }

    fn peers(
        &self,
        identity: &Identity,
        bucket: Bucket,
        offset: usize,
        limit: i64,
    ) -> Internal<Vec<Identity>> {
        let owner = IdentityPath::of(&self.resolve(identity)?);
        let records = self.store.iterate(&owner.bucket(bucket))?;

        page(records.iter(), offset, limit)
            .into_iter()
            .map(|record| self.with_profile(&record.to))
            .collect()
    }

    fn timeline(&self, identity: &Identity, offset: usize, limit: i64) -> Internal<Vec<Identity>> {
        let owner = IdentityPath::of(&self.resolve(identity)?);
        let query = PrefixQuery {
            prefix: owner.subtree_prefix(),
            order: SortOrder::Descending,
            offset,
            limit: usize::try_from(limit).ok(),
        };

        let matches = self.store.query(&query)?;
        Ok(matches
            .iter()
            .map(|stored| stored.record.peer().to_identity())
            .collect())
    }

    fn count(&self, identity: &Identity, buckets: &[Bucket]) -> Internal<usize> {
        let owner = IdentityPath::of(&self.resolve(identity)?);

        let mut total = 0;
        for bucket in buckets {
            total += self.store.size(&owner.bucket(*bucket))?;
        }
        Ok(total)
    }

    /*
     * Public
     */

    /// Persist a relationship
    ///
    /// Without an id, creates the pair of edge records in the buckets its
    /// status requires and returns the relationship with its new id. With an
    /// id, moves both records of the existing pair to the buckets of the new
    /// status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// `IllegalArguments` when an identity or the addressed relationship
    /// cannot be found, or when sender and receiver are the same identity.
    pub fn save_relationship(
        &mut self,
        mut relationship: Relationship,
    ) -> Result<Relationship, RelationshipStorageError> {
        let outcome = match relationship.id {
            None => self.create(&relationship),
            Some(id) => self.transition(id, relationship.status).map(|_| id),
        };

        let id = outcome.map_err(Fault::into_illegal_arguments)?;
        relationship.id = Some(id);
        Ok(relationship)
    }

    /// Remove a relationship and its reciprocal together
    ///
    /// # Errors
    ///
    /// `IllegalArguments` for an unsaved relationship, `FailedToGetRelationship`
    /// when either record of the pair cannot be found.
    pub fn remove_relationship(
        &mut self,
        relationship: &Relationship,
    ) -> Result<(), RelationshipStorageError> {
        let id = relationship.id.ok_or_else(|| {
            RelationshipStorageError::IllegalArguments("Relationship has no id".to_string())
        })?;

        self.delete(id).map_err(Fault::into_failed_to_get)
    }

    /// Relationship addressed by either of its record ids
    ///
    /// Sender and receiver come back without profile. Returns `None` when no
    /// record has this id.
    pub fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<Relationship>, RelationshipStorageError> {
        let stored = self.store.find(id)?;
        Ok(stored.map(|stored| Self::stub_relationship(&stored.record)))
    }

    /// Relationship between two identities, seen from `identity1`
    ///
    /// Looks in `identity1`'s confirmed bucket, then its outgoing requests,
    /// then `identity2`'s outgoing requests; the first hit wins. Returns
    /// `None` when nothing is found or either identity is unknown.
    pub fn get_relationship_between(
        &self,
        identity1: &Identity,
        identity2: &Identity,
    ) -> Result<Option<Relationship>, RelationshipStorageError> {
        match self.lookup_between(identity1, identity2) {
            Ok(record) => Ok(Some(Self::stub_relationship(&record))),
            Err(Fault::NotFound(_)) => Ok(None),
            Err(fault) => Err(fault.into_failed_to_get()),
        }
    }

    /// Relationships in which `sender` is on the sending side
    ///
    /// `status` selects the confirmed, pending (outgoing) or ignored bucket;
    /// `None` returns confirmed and pending together. With a `peer_filter`,
    /// only relationships whose other participant is listed are kept.
    ///
    /// # Errors
    ///
    /// `FailedToGetRelationship` when `sender` is unknown.
    pub fn get_sender_relationships(
        &self,
        sender: &Identity,
        status: Option<RelationshipStatus>,
        peer_filter: Option<&[Identity]>,
    ) -> Result<Vec<Relationship>, RelationshipStorageError> {
        self.collect(sender, sender_buckets(status), peer_filter)
            .map_err(Fault::into_failed_to_get)
    }

    /// [`Self::get_sender_relationships`] for a bare identity id
    pub fn get_sender_relationships_by_id(
        &self,
        sender_id: &IdentityId,
        status: Option<RelationshipStatus>,
        peer_filter: Option<&[Identity]>,
    ) -> Result<Vec<Relationship>, RelationshipStorageError> {
        self.get_sender_relationships(&Identity::stub(sender_id.clone()), status, peer_filter)
    }

    /// Relationships in which `receiver` is on the receiving side
    ///
    /// Mirror of [`Self::get_sender_relationships`] over the incoming and
    /// ignored buckets.
    ///
    /// # Errors
    ///
    /// `FailedToGetRelationship` when `receiver` is unknown.
    pub fn get_receiver_relationships(
        &self,
        receiver: &Identity,
        status: Option<RelationshipStatus>,
        peer_filter: Option<&[Identity]>,
    ) -> Result<Vec<Relationship>, RelationshipStorageError> {
        self.collect(receiver, receiver_buckets(status), peer_filter)
            .map_err(Fault::into_failed_to_get)
    }

    /// Every relationship of `identity` with the given status
    ///
    /// `None` returns confirmed, incoming and outgoing relationships;
    /// `Pending` returns incoming and outgoing; `Ignored` returns those
    /// `identity` ignored. An unknown identity yields an empty list.
    pub fn get_relationships(
        &self,
        identity: &Identity,
        status: Option<RelationshipStatus>,
        peer_filter: Option<&[Identity]>,
    ) -> Result<Vec<Relationship>, RelationshipStorageError> {
        match self.collect(identity, all_buckets(status), peer_filter) {
            Ok(relationships) => Ok(relationships),
            Err(Fault::NotFound(_)) => Ok(Vec::new()),
            Err(fault) => Err(fault.into_failed_to_get()),
        }
    }

    /// Identities that `sender` has pending requests to, in store order
    ///
    /// Paging: skip `offset`, then return `limit` entries; a negative `limit`
    /// returns everything after `offset` and zero returns nothing.
    ///
    /// # Errors
    ///
    /// `FailedToGetRelationship` when `identity` is unknown.
    pub fn get_outgoing_relationships(
        &self,
        sender: &Identity,
        offset: usize,
        limit: i64,
    ) -> Result<Vec<Identity>, RelationshipStorageError> {
        self.peers(sender, Bucket::Sender, offset, limit)
            .map_err(Fault::into_failed_to_get)
    }

    /// Identities that sent `receiver` a pending request, in store order
    ///
    /// Same paging rules as [`Self::get_outgoing_relationships`].
    pub fn get_incoming_relationships(
        &self,
        receiver: &Identity,
        offset: usize,
        limit: i64,
    ) -> Result<Vec<Identity>, RelationshipStorageError> {
        self.peers(receiver, Bucket::Receiver, offset, limit)
            .map_err(Fault::into_failed_to_get)
    }

    /// Confirmed connections of `identity`, in store order, with profiles
    ///
    /// Same paging rules as [`Self::get_outgoing_relationships`].
    ///
    /// # Errors
    ///
    /// `IllegalArguments` when `identity` is unknown.
    pub fn get_connections(
        &self,
        identity: &Identity,
        offset: usize,
        limit: i64,
    ) -> Result<Vec<Identity>, RelationshipStorageError> {
        self.peers(identity, Bucket::Relationship, offset, limit)
            .map_err(Fault::into_illegal_arguments)
    }

    /// All confirmed connections of `identity`
    pub fn get_all_connections(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Identity>, RelationshipStorageError> {
        self.get_connections(identity, 0, -1)
    }

    /// Peers of every relationship of `identity`, newest first
    ///
    /// Unlike the bucket listings this covers all statuses and pages inside
    /// the store. Peers come back without profile.
    ///
    /// # Errors
    ///
    /// `FailedToGetRelationship` when `identity` is unknown.
    pub fn get_timeline_connections(
        &self,
        identity: &Identity,
        offset: usize,
        limit: i64,
    ) -> Result<Vec<Identity>, RelationshipStorageError> {
        self.timeline(identity, offset, limit)
            .map_err(Fault::into_failed_to_get)
    }

    /// Number of confirmed connections
    ///
    /// # Errors
    ///
    /// `IllegalArguments` when `identity` is unknown.
    pub fn get_connections_count(&self, identity: &Identity) -> Result<usize, RelationshipStorageError> {
        self.count(identity, &[Bucket::Relationship])
            .map_err(Fault::into_illegal_arguments)
    }

    /// Number of pending requests received
    pub fn get_incoming_relationships_count(
        &self,
        receiver: &Identity,
    ) -> Result<usize, RelationshipStorageError> {
        self.count(receiver, &[Bucket::Receiver])
            .map_err(Fault::into_failed_to_get)
    }

    /// Number of pending requests sent
    pub fn get_outgoing_relationships_count(
        &self,
        sender: &Identity,
    ) -> Result<usize, RelationshipStorageError> {
        self.count(sender, &[Bucket::Sender])
            .map_err(Fault::into_failed_to_get)
    }

    /// Confirmed, outgoing, incoming and sent-then-ignored relationships together
    pub fn get_relationships_count(
        &self,
        identity: &Identity,
    ) -> Result<usize, RelationshipStorageError> {
        self.count(
            identity,
            &[
                Bucket::Relationship,
                Bucket::Sender,
                Bucket::Receiver,
                Bucket::Ignore,
            ],
        )
        .map_err(Fault::into_failed_to_get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limits() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(page(items.iter(), 0, -1).len(), 5);
        assert!(page(items.iter(), 0, 0).is_empty());
        assert_eq!(page(items.iter(), 1, 2), vec![&2, &3]);
        assert_eq!(page(items.iter(), 3, -1), vec![&4, &5]);
        assert!(page(items.iter(), 10, 3).is_empty());
    }

    #[test]
    fn test_fault_translation() {
        let missing = || Fault::NotFound("x".to_string());
        assert!(matches!(
            missing().into_illegal_arguments(),
            RelationshipStorageError::IllegalArguments(_)
        ));
        assert!(matches!(
            missing().into_failed_to_get(),
            RelationshipStorageError::FailedToGetRelationship(_)
        ));
        assert!(matches!(
            Fault::Invalid("self".to_string()).into_failed_to_get(),
            RelationshipStorageError::IllegalArguments(_)
        ));
        assert!(matches!(
            Fault::from(StoreError::NotFound("gone".to_string())),
            Fault::NotFound(_)
        ));
        assert!(matches!(
            Fault::from(StoreError::KeyConflict("/p/x/sender/y".to_string())),
            Fault::Store(_)
        ));
    }

    #[test]
    fn test_ignored_listing_buckets() {
        assert_eq!(sender_buckets(Some(RelationshipStatus::Ignored)), &[Bucket::Ignore]);
        assert_eq!(receiver_buckets(Some(RelationshipStatus::Ignored)), &[Bucket::Ignored]);
        assert_eq!(all_buckets(Some(RelationshipStatus::Ignored)), &[Bucket::Ignored]);
    }
}
