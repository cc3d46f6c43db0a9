//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the relationship layer and the
//! identity platform around it. Implementations live in other crates.

use crate::{Identity, IdentityId};

/// Directory of identities and their profiles
///
/// Implemented by the surrounding platform; `kinship-store` ships an
/// in-memory implementation for tests and embedding.
pub trait IdentityDirectory {
    /// Error type for directory operations
    type Error: std::fmt::Display;

    /// Resolve an id to an identity with provider and remote id
    ///
    /// Returns `Ok(None)` when the id is unknown. The returned identity has
    /// no profile loaded.
    fn resolve(&self, id: &IdentityId) -> Result<Option<Identity>, Self::Error>;

    /// Populate `identity.profile` in place
    ///
    /// Identities without a stored profile are left with `profile = None`.
    fn load_profile(&self, identity: &mut Identity) -> Result<(), Self::Error>;
}
