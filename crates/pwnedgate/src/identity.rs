//! Identity store collaborator.
//!
//! The host resolves a username and realm to an identity whose attributes
//! may hold several values each. Implement [`IdentityResolver`] over the
//! host's store; [`Directory`] is an in-memory implementation.

use crate::error::LookupError;
use std::collections::HashMap;

/// A resolved user record.
pub trait Identity {
    /// Returns the values of an attribute, in the store's iteration order.
    ///
    /// An absent attribute is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to read the attribute.
    fn attribute(&self, name: &str) -> Result<Vec<String>, LookupError>;
}

/// Resolves users to identities.
pub trait IdentityResolver: Send + Sync {
    /// Identity type returned by this resolver.
    type Identity: Identity;

    /// Resolves a username within a realm.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be resolved.
    fn resolve(&self, username: &str, realm: &str) -> Result<Self::Identity, LookupError>;
}

/// In-memory user record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    attributes: HashMap<String, Vec<String>>,
}

impl StaticIdentity {
    /// Creates an identity with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }
}

impl Identity for StaticIdentity {
    fn attribute(&self, name: &str) -> Result<Vec<String>, LookupError> {
        Ok(self.attributes.get(name).cloned().unwrap_or_default())
    }
}

/// In-memory identity directory keyed by username and realm.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    identities: HashMap<(String, String), StaticIdentity>,
}

impl Directory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    #[must_use]
    pub fn with_identity(
        mut self,
        username: impl Into<String>,
        realm: impl Into<String>,
        identity: StaticIdentity,
    ) -> Self {
        self.insert(username, realm, identity);
        self
    }

    /// Adds or replaces a user.
    pub fn insert(
        &mut self,
        username: impl Into<String>,
        realm: impl Into<String>,
        identity: StaticIdentity,
    ) {
        self.identities
            .insert((username.into(), realm.into()), identity);
    }
}

impl IdentityResolver for Directory {
    type Identity = StaticIdentity;

    fn resolve(&self, username: &str, realm: &str) -> Result<StaticIdentity, LookupError> {
        self.identities
            .get(&(username.to_string(), realm.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                username: username.to_string(),
                realm: realm.to_string(),
            })
    }
}
