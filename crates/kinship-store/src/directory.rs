//! In-memory identity directory

use std::collections::HashMap;
use std::convert::Infallible;

use kinship_domain::traits::IdentityDirectory;
use kinship_domain::{Identity, IdentityId, Profile};

/// Identity directory backed by hash maps
///
/// Registered identities are stored without profile; profiles are kept
/// aside and only attached by [`IdentityDirectory::load_profile`].
///
/// # Examples
///
/// ```
/// use kinship_domain::traits::IdentityDirectory;
/// use kinship_domain::{Identity, IdentityId};
/// use kinship_store::MemoryIdentityDirectory;
///
/// let mut directory = MemoryIdentityDirectory::new();
/// directory.register(Identity::new("1", "organization", "john"));
///
/// let john = directory.resolve(&IdentityId::new("1")).unwrap().unwrap();
/// assert_eq!(john.remote_id, "john");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityDirectory {
    identities: HashMap<IdentityId, Identity>,
    profiles: HashMap<IdentityId, Profile>,
}

impl MemoryIdentityDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity, returning it without profile
    ///
    /// A profile carried by `identity` is stored for later loading.
    pub fn register(&mut self, mut identity: Identity) -> Identity {
        if let Some(profile) = identity.profile.take() {
            self.profiles.insert(identity.id.clone(), profile);
        }
        self.identities.insert(identity.id.clone(), identity.clone());
        identity
    }

    /// Replace the stored profile of `id`
    pub fn set_profile(&mut self, id: &IdentityId, profile: Profile) {
        self.profiles.insert(id.clone(), profile);
    }

    /// Forget an identity and its profile
    pub fn unregister(&mut self, id: &IdentityId) -> Option<Identity> {
        self.profiles.remove(id);
        self.identities.remove(id)
    }

    /// Number of registered identities
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether no identity is registered
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl IdentityDirectory for MemoryIdentityDirectory {
    type Error = Infallible;

    fn resolve(&self, id: &IdentityId) -> Result<Option<Identity>, Self::Error> {
        Ok(self.identities.get(id).cloned())
    }

    fn load_profile(&self, identity: &mut Identity) -> Result<(), Self::Error> {
        identity.profile = self.profiles.get(&identity.id).cloned();
        Ok(())
    }
}
