//! Identity module - participants of a relationship

use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of an identity, assigned by the identity directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityId(String);

impl IdentityId {
    /// Wrap a directory-assigned id
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Display attributes of an identity, loaded on demand by the directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Human readable name
    pub full_name: Option<String>,

    /// Free-form profile properties
    pub properties: BTreeMap<String, String>,
}

impl Profile {
    /// Create a profile with a full name and no extra properties
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            properties: BTreeMap::new(),
        }
    }
}

/// A participant reference
///
/// Identities are owned by the identity directory. The relationship layer
/// treats them as read-only values; `provider_id` is the namespace of the
/// identity source and `remote_id` the human-facing id within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Directory id
    pub id: IdentityId,

    /// Namespace of the identity source (e.g. "organization")
    pub provider_id: String,

    /// Identifier within the provider (e.g. a user name)
    pub remote_id: String,

    /// Profile, present only once loaded
    pub profile: Option<Profile>,
}

impl Identity {
    /// Create an identity without a loaded profile
    pub fn new(
        id: impl Into<IdentityId>,
        provider_id: impl Into<String>,
        remote_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            remote_id: remote_id.into(),
            profile: None,
        }
    }

    /// Create a reference carrying only the directory id
    ///
    /// Useful when a caller only knows the id; the storage layer resolves the
    /// rest through the directory.
    pub fn stub(id: impl Into<IdentityId>) -> Self {
        Self::new(id, String::new(), String::new())
    }

    /// Attach a profile
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// `provider:remote` handle, as used in log lines
    pub fn handle(&self) -> String {
        format!("{}:{}", self.provider_id, self.remote_id)
    }
}
