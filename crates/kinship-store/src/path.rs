//! Hierarchical paths of edge records
//!
//! Every identity owns a subtree `/<provider>/<remote>`; its buckets sit one
//! level below and each record one level below its bucket, named after the
//! peer's remote id:
//!
//! ```text
//! /organization/john/sender/mary
//! /organization/john/relationship/paul
//! ```
//!
//! Segments are escaped so a `/` inside a remote id cannot leak into a
//! neighbouring subtree.

use std::fmt;

use kinship_domain::{Bucket, Identity};

/// Escape one path segment
fn encode_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

/// Root of an identity's subtree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityPath(String);

impl IdentityPath {
    /// Subtree of a resolved identity
    pub fn of(identity: &Identity) -> Self {
        Self(format!(
            "/{}/{}",
            encode_segment(&identity.provider_id),
            encode_segment(&identity.remote_id)
        ))
    }

    /// Rebuild from a stored path
    pub(crate) fn from_raw(raw: String) -> Self {
        Self(raw)
    }

    /// The path as stored
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// One of this identity's buckets
    pub fn bucket(&self, bucket: Bucket) -> BucketPath {
        BucketPath {
            owner: self.clone(),
            bucket,
        }
    }

    /// Prefix matching every record below this identity
    pub fn subtree_prefix(&self) -> String {
        format!("{}/", self.0)
    }
}

impl fmt::Display for IdentityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bucket of one identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketPath {
    owner: IdentityPath,
    bucket: Bucket,
}

impl BucketPath {
    /// Owning identity's subtree
    pub fn owner(&self) -> &IdentityPath {
        &self.owner
    }

    /// Which bucket
    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// Full path of the entry stored under `key`
    pub fn entry(&self, key: &str) -> String {
        format!("{}/{}", self, encode_segment(key))
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.bucket.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_path() {
        let john = Identity::new("1", "organization", "john");
        let path = IdentityPath::of(&john).bucket(Bucket::Sender).entry("mary");
        assert_eq!(path, "/organization/john/sender/mary");
    }

    #[test]
    fn test_segments_are_escaped() {
        let odd = Identity::new("1", "web", "a/b%c");
        assert_eq!(IdentityPath::of(&odd).as_str(), "/web/a%2Fb%25c");
    }

    #[test]
    fn test_subtree_prefix_does_not_match_sibling() {
        let x = IdentityPath::of(&Identity::new("1", "p", "x"));
        let xy = IdentityPath::of(&Identity::new("2", "p", "xy"));
        let entry = xy.bucket(Bucket::Relationship).entry("z");
        assert!(!entry.starts_with(&x.subtree_prefix()));
        assert!(entry.starts_with(&xy.subtree_prefix()));
    }
}
