//! Identity model and the identity-lookup collaborator.
//!
//! The gate only reads identities. Lookups may be called with
//! attacker-controlled input (the subject of an unverified token).
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    path::Path,
};
use thiserror::Error;

/// Granted authority (e.g. `ROLE_USER`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity record resolved by username.
///
/// `username == None` is the "not found" sentinel produced by [`Identity::unknown`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Identity {
    username: Option<String>,
    secret: String,
    authorities: BTreeSet<Role>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        secret: impl Into<String>,
        authorities: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            secret: secret.into(),
            authorities: authorities.into_iter().collect(),
        }
    }

    /// Placeholder substituted when the lookup finds nothing.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Secret material (password hash) bound into token verification.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn authorities(&self) -> &BTreeSet<Role> {
        &self.authorities
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secret material
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("authorities", &self.authorities)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("identity backend error: {0}")]
    Backend(String),
    #[error("failed to read identity fixtures: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid identity fixtures: {0}")]
    Format(#[from] serde_json::Error),
    #[error("duplicate identity: {0}")]
    Duplicate(String),
}

/// Non-blocking identity lookup (edge gate).
///
/// Implementations must be cheap to share (`Arc<dyn IdentityStore>`).
#[async_trait]
pub trait IdentityStore: Send + Sync {
    // Returns:
    // - Ok(Some(_)) => identity exists
    // - Ok(None)    => no such user
    // - Err(_)      => backend failure (the gate folds it into a rejection)
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityStoreError>;
}

/// Blocking identity lookup (in-service gate).
pub trait BlockingIdentityStore: Send + Sync {
    fn find_by_username_blocking(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityStoreError>;
}

/// Fixture entry as stored in the JSON identities file.
#[derive(Debug, Deserialize)]
struct IdentityRecord {
    username: String,
    secret: String,
    #[serde(default)]
    authorities: Vec<Role>,
}

/// Immutable, in-memory identity store.
///
/// Loaded once at startup; lookups never mutate it, so no locking is needed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    identities: HashMap<String, Identity>,
}

impl InMemoryIdentityStore {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Result<Self, IdentityStoreError> {
        let mut map = HashMap::new();
        for identity in identities {
            let Some(username) = identity.username().map(str::to_string) else {
                continue;
            };
            if map.insert(username.clone(), identity).is_some() {
                return Err(IdentityStoreError::Duplicate(username));
            }
        }

        Ok(Self { identities: map })
    }

    /// Parse a JSON array of `{ username, secret, authorities }`.
    pub fn from_json(raw: &str) -> Result<Self, IdentityStoreError> {
        let records: Vec<IdentityRecord> = serde_json::from_str(raw)?;
        Self::new(
            records
                .into_iter()
                .map(|r| Identity::new(r.username, r.secret, r.authorities)),
        )
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IdentityStoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn get(&self, username: &str) -> Option<Identity> {
        self.identities.get(username).cloned()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityStoreError> {
        Ok(self.get(username))
    }
}

impl BlockingIdentityStore for InMemoryIdentityStore {
    fn find_by_username_blocking(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityStoreError> {
        Ok(self.get(username))
    }
}
