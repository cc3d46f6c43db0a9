//! Relationship module - the caller-facing view of a connection between two identities

use std::fmt;

use crate::Identity;

/// Identifier of a persisted relationship edge, based on UUIDv7
///
/// Every edge record of a pair carries its own id. A logical relationship is
/// addressed by the id of the sender-side record, but either id resolves to
/// the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(u128);

impl RelationshipId {
    /// Generate a new UUIDv7-based RelationshipId
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::RelationshipId;
    ///
    /// let id = RelationshipId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RelationshipId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RelationshipId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::RelationshipId;
    ///
    /// let id = RelationshipId::new();
    /// let parsed = RelationshipId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid relationship id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Status of a relationship
///
/// The engine does not police transitions between statuses. Callers pick
/// the target status and the storage layer moves both edge records into the
/// buckets that status requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipStatus {
    /// Requested by the sender, not yet answered
    Pending,

    /// Accepted by the receiver
    Confirmed,

    /// Ignored by one of the participants
    Ignored,
}

impl RelationshipStatus {
    /// All statuses, in declaration order
    pub const ALL: [RelationshipStatus; 3] = [
        RelationshipStatus::Pending,
        RelationshipStatus::Confirmed,
        RelationshipStatus::Ignored,
    ];

    /// Get the status as stored on edge records
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "PENDING",
            RelationshipStatus::Confirmed => "CONFIRMED",
            RelationshipStatus::Ignored => "IGNORED",
        }
    }

    /// Parse a status from its stored form (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(RelationshipStatus::Pending),
            "CONFIRMED" => Some(RelationshipStatus::Confirmed),
            "IGNORED" => Some(RelationshipStatus::Ignored),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relationship status: {}", s))
    }
}

/// A relationship between two identities, as seen by callers
///
/// This is a transient value rebuilt on every read. Persisting it creates or
/// updates the pair of edge records behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Id of the persisted relationship, `None` until first saved
    pub id: Option<RelationshipId>,

    /// Identity that initiated the relationship
    pub sender: Identity,

    /// Identity the relationship was sent to
    pub receiver: Identity,

    /// Current status
    pub status: RelationshipStatus,
}

impl Relationship {
    /// Create a new, unsaved relationship
    pub fn new(sender: Identity, receiver: Identity, status: RelationshipStatus) -> Self {
        Self {
            id: None,
            sender,
            receiver,
            status,
        }
    }

    /// Whether this relationship has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// The participant that is not `identity`, if `identity` takes part at all
    pub fn peer_of(&self, identity: &Identity) -> Option<&Identity> {
        if self.sender.id == identity.id {
            Some(&self.receiver)
        } else if self.receiver.id == identity.id {
            Some(&self.sender)
        } else {
            None
        }
    }
}
