//! Edge records - the persisted halves of a relationship
//!
//! A logical relationship is stored as two records, one owned by each
//! participant. The records point at each other through `reciprocal`, carry
//! the same status and creation time, and always sit in the bucket pair the
//! status dictates (see [`crate::bucket`]).

use crate::{Bucket, Identity, IdentityId, Placement, RelationshipId, RelationshipStatus};

/// Which side of the logical relationship owns a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeRole {
    /// Owner initiated the relationship
    Sender,

    /// Owner received the relationship
    Receiver,
}

impl EdgeRole {
    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeRole::Sender => "sender",
            EdgeRole::Receiver => "receiver",
        }
    }

    /// Parse the stored form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sender" => Some(EdgeRole::Sender),
            "receiver" => Some(EdgeRole::Receiver),
            _ => None,
        }
    }

    /// Role of the reciprocal record
    pub fn opposite(&self) -> Self {
        match self {
            EdgeRole::Sender => EdgeRole::Receiver,
            EdgeRole::Receiver => EdgeRole::Sender,
        }
    }
}

/// Identity attributes denormalized onto an edge record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityRef {
    /// Directory id
    pub id: IdentityId,

    /// Provider namespace
    pub provider_id: String,

    /// Id within the provider
    pub remote_id: String,
}

impl IdentityRef {
    /// Rebuild an identity value without profile
    pub fn to_identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.provider_id.clone(), self.remote_id.clone())
    }

    /// `provider:remote` handle
    pub fn handle(&self) -> String {
        format!("{}:{}", self.provider_id, self.remote_id)
    }
}

impl From<&Identity> for IdentityRef {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            provider_id: identity.provider_id.clone(),
            remote_id: identity.remote_id.clone(),
        }
    }
}

/// One participant's persisted view of a relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Record id
    pub id: RelationshipId,

    /// Owner of the record
    pub from: IdentityRef,

    /// The other participant
    pub to: IdentityRef,

    /// Whether the owner is the sender or the receiver
    pub role: EdgeRole,

    /// Status, identical on both records of the pair
    pub status: RelationshipStatus,

    /// Creation time in milliseconds since Unix epoch, identical on both records
    pub created_at: u64,

    /// Id of the record owned by `to`
    pub reciprocal: RelationshipId,
}

impl EdgeRecord {
    /// Allocate a wired pair of records for a new relationship
    ///
    /// Returns `(sender_record, receiver_record)`. Both share `status` and
    /// `created_at`, and each one's reciprocal is the other.
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::{EdgeRecord, Identity, RelationshipStatus};
    ///
    /// let x = Identity::new("1", "p", "x");
    /// let y = Identity::new("2", "p", "y");
    /// let (a, b) = EdgeRecord::pair(&x, &y, RelationshipStatus::Pending, 1000);
    /// assert!(a.is_reciprocal_of(&b));
    /// assert_eq!(a.key(), "y");
    /// assert_eq!(b.key(), "x");
    /// ```
    pub fn pair(
        sender: &Identity,
        receiver: &Identity,
        status: RelationshipStatus,
        created_at: u64,
    ) -> (EdgeRecord, EdgeRecord) {
        let sender_id = RelationshipId::new();
        let receiver_id = RelationshipId::new();

        let sent = EdgeRecord {
            id: sender_id,
            from: IdentityRef::from(sender),
            to: IdentityRef::from(receiver),
            role: EdgeRole::Sender,
            status,
            created_at,
            reciprocal: receiver_id,
        };
        let received = EdgeRecord {
            id: receiver_id,
            from: IdentityRef::from(receiver),
            to: IdentityRef::from(sender),
            role: EdgeRole::Receiver,
            status,
            created_at,
            reciprocal: sender_id,
        };

        (sent, received)
    }

    /// Key of this record inside its owner's bucket: the peer's remote id
    pub fn key(&self) -> &str {
        &self.to.remote_id
    }

    /// Bucket this record must live in for its current status
    pub fn bucket(&self) -> Bucket {
        Placement::for_status(self.status).bucket_for(self.role)
    }

    /// Sender of the logical relationship
    pub fn sender(&self) -> &IdentityRef {
        match self.role {
            EdgeRole::Sender => &self.from,
            EdgeRole::Receiver => &self.to,
        }
    }

    /// Receiver of the logical relationship
    pub fn receiver(&self) -> &IdentityRef {
        match self.role {
            EdgeRole::Sender => &self.to,
            EdgeRole::Receiver => &self.from,
        }
    }

    /// The participant opposite the owner, chosen by role
    pub fn peer(&self) -> &IdentityRef {
        match self.role {
            EdgeRole::Sender => self.receiver(),
            EdgeRole::Receiver => self.sender(),
        }
    }

    /// Whether the owner is the original sender
    pub fn is_sender(&self) -> bool {
        self.role == EdgeRole::Sender
    }

    /// Whether the owner is the original receiver
    pub fn is_receiver(&self) -> bool {
        self.role == EdgeRole::Receiver
    }

    /// Whether `other` is the consistent counterpart of this record
    pub fn is_reciprocal_of(&self, other: &EdgeRecord) -> bool {
        self.reciprocal == other.id
            && other.reciprocal == self.id
            && self.from == other.to
            && self.to == other.from
            && self.role == other.role.opposite()
            && self.status == other.status
            && self.created_at == other.created_at
    }
}
