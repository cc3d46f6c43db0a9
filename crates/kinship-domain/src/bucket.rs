//! Bucket placement - the relationship state machine
//!
//! Each identity owns five buckets of edge records, each keyed by the peer's
//! remote id. The status of a relationship alone decides which bucket each
//! of its two records lives in:
//!
//! | status    | sender's record | receiver's record |
//! |-----------|-----------------|-------------------|
//! | PENDING   | `sender`        | `receiver`        |
//! | CONFIRMED | `relationship`  | `relationship`    |
//! | IGNORED   | `ignore`        | `ignored`         |
//!
//! Transitions are not validated here: any status may follow any other.

use std::fmt;

use crate::{EdgeRole, RelationshipStatus};

/// A named per-identity container of edge records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Outgoing pending requests
    Sender,

    /// Incoming pending requests
    Receiver,

    /// Confirmed connections
    Relationship,

    /// Relationships this identity sent that are now ignored
    Ignore,

    /// Relationships this identity received and ignored
    Ignored,
}

impl Bucket {
    /// All buckets, in storage order
    pub const ALL: [Bucket; 5] = [
        Bucket::Sender,
        Bucket::Receiver,
        Bucket::Relationship,
        Bucket::Ignore,
        Bucket::Ignored,
    ];

    /// Path segment used for this bucket
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Sender => "sender",
            Bucket::Receiver => "receiver",
            Bucket::Relationship => "relationship",
            Bucket::Ignore => "ignore",
            Bucket::Ignored => "ignored",
        }
    }

    /// Parse a bucket from its path segment
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.name() == s)
    }

    /// The one status whose records may live in this bucket
    pub fn status(&self) -> RelationshipStatus {
        match self {
            Bucket::Sender | Bucket::Receiver => RelationshipStatus::Pending,
            Bucket::Relationship => RelationshipStatus::Confirmed,
            Bucket::Ignore | Bucket::Ignored => RelationshipStatus::Ignored,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the two records of a pair go for a given status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Bucket of the record owned by the sender
    pub sender: Bucket,

    /// Bucket of the record owned by the receiver
    pub receiver: Bucket,
}

impl Placement {
    /// Placement mandated by `status`
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::{Bucket, Placement, RelationshipStatus};
    ///
    /// let placement = Placement::for_status(RelationshipStatus::Pending);
    /// assert_eq!(placement.sender, Bucket::Sender);
    /// assert_eq!(placement.receiver, Bucket::Receiver);
    /// ```
    pub fn for_status(status: RelationshipStatus) -> Self {
        match status {
            RelationshipStatus::Pending => Self {
                sender: Bucket::Sender,
                receiver: Bucket::Receiver,
            },
            RelationshipStatus::Confirmed => Self {
                sender: Bucket::Relationship,
                receiver: Bucket::Relationship,
            },
            RelationshipStatus::Ignored => Self {
                sender: Bucket::Ignore,
                receiver: Bucket::Ignored,
            },
        }
    }

    /// Bucket for the record whose owner plays `role`
    pub fn bucket_for(&self, role: EdgeRole) -> Bucket {
        match role {
            EdgeRole::Sender => self.sender,
            EdgeRole::Receiver => self.receiver,
        }
    }
}
