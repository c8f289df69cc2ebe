// ============================
// crates/backend-lib/src/directory.rs
// ============================
//! Principal directory abstraction with an in-memory implementation.
//!
//! The directory owns principal records and the ability to compare
//! secrets; the authentication strategies only read from it. Durable
//! persistence lives outside this service.
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;
use async_trait::async_trait;
use crate::auth::password::{burn_secret_check, verify_password};
use crate::error::AppError;

/// An identity record: who can authenticate and what is linked to them.
/// Credential material is opaque to everything but [`compare_secret`].
///
/// [`compare_secret`]: PrincipalDirectory::compare_secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    /// PHC-encoded secret, absent for provider-only accounts
    pub password_hash: Option<String>,
    /// Whether the account finished its out-of-band verification step
    pub verified: bool,
    /// Linked external-provider identities, at most one per provider
    pub identities: Vec<ProviderIdentity>,
}

/// A provider-assigned identity attached to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub provider: String,
    pub provider_id: String,
}

/// Blueprint for a new principal. Provider-created accounts carry an
/// initial link and no password hash; signup-created accounts the
/// opposite.
#[derive(Debug, Clone, Default)]
pub struct NewPrincipal {
    /// Username; synthesized from the initial link when absent
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub verified: bool,
    pub initial_link: Option<ProviderIdentity>,
}

/// Trait for principal directories
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Look up a principal by username
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, AppError>;

    /// Look up a principal by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, AppError>;

    /// Look up a principal by a linked provider identity
    async fn find_by_provider_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<Principal>, AppError>;

    /// Compare a candidate secret against the principal's stored
    /// credential material. Constant-time; principals without a secret
    /// always compare false at the same cost.
    async fn compare_secret(
        &self,
        principal: &Principal,
        candidate: &str,
    ) -> Result<bool, AppError>;

    /// Attach a provider identity to an existing principal, replacing any
    /// previous identity for the same provider. Returns the updated record.
    async fn attach_provider_identity(
        &self,
        principal_id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<Principal, AppError>;

    /// Create a principal from a blueprint
    async fn create_principal(&self, new: NewPrincipal) -> Result<Principal, AppError>;
}

/// In-memory implementation of the `PrincipalDirectory` trait
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    principals: Arc<DashMap<Uuid, Principal>>,
    username_index: Arc<DashMap<String, Uuid>>,
    provider_index: Arc<DashMap<(String, String), Uuid>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a principal entirely. Exists so callers (and tests) can model
    /// account deletion happening underneath live sessions.
    pub fn remove(&self, id: Uuid) -> Option<Principal> {
        let (_, principal) = self.principals.remove(&id)?;
        self.username_index.remove(&principal.username);
        for identity in &principal.identities {
            self.provider_index
                .remove(&(identity.provider.clone(), identity.provider_id.clone()));
        }
        Some(principal)
    }

    fn synthesize_username(link: Option<&ProviderIdentity>) -> String {
        // ':' is rejected by signup validation, so these can never collide
        // with a user-chosen name
        match link {
            Some(identity) => format!("{}:{}", identity.provider, identity.provider_id),
            None => format!("user:{}", Uuid::new_v4().simple()),
        }
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, AppError> {
        let Some(id) = self.username_index.get(username).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.principals.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, AppError> {
        Ok(self.principals.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_provider_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<Principal>, AppError> {
        let key = (provider.to_string(), provider_id.to_string());
        let Some(id) = self.provider_index.get(&key).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.principals.get(&id).map(|entry| entry.value().clone()))
    }

    async fn compare_secret(
        &self,
        principal: &Principal,
        candidate: &str,
    ) -> Result<bool, AppError> {
        match &principal.password_hash {
            Some(hash) => Ok(verify_password(hash, candidate)),
            None => {
                // provider-only account: no secret to match, but spend the
                // same time as a real comparison
                burn_secret_check(candidate);
                Ok(false)
            },
        }
    }

    async fn attach_provider_identity(
        &self,
        principal_id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<Principal, AppError> {
        let key = (provider.to_string(), provider_id.to_string());
        if let Some(owner) = self.provider_index.get(&key) {
            if *owner.value() != principal_id {
                return Err(AppError::InvalidInput(
                    "provider identity already linked to another account".to_string(),
                ));
            }
        }

        let mut entry = self
            .principals
            .get_mut(&principal_id)
            .ok_or_else(|| AppError::NotFound("no such principal".to_string()))?;

        // one identity per provider: replace and unindex any previous one
        if let Some(previous) = entry
            .identities
            .iter()
            .position(|identity| identity.provider == provider)
        {
            let old = entry.identities.remove(previous);
            self.provider_index
                .remove(&(old.provider, old.provider_id));
        }

        entry.identities.push(ProviderIdentity {
            provider: provider.to_string(),
            provider_id: provider_id.to_string(),
        });
        let updated = entry.value().clone();
        drop(entry);

        self.provider_index.insert(key, principal_id);
        Ok(updated)
    }

    async fn create_principal(&self, new: NewPrincipal) -> Result<Principal, AppError> {
        if let Some(identity) = &new.initial_link {
            let key = (identity.provider.clone(), identity.provider_id.clone());
            if self.provider_index.contains_key(&key) {
                return Err(AppError::InvalidInput(
                    "provider identity already linked to another account".to_string(),
                ));
            }
        }

        let id = Uuid::new_v4();
        let username = new
            .username
            .unwrap_or_else(|| Self::synthesize_username(new.initial_link.as_ref()));

        // reserve the username atomically
        match self.username_index.entry(username.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(AppError::UsernameTaken),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
            },
        }

        let principal = Principal {
            id,
            username,
            password_hash: new.password_hash,
            verified: new.verified,
            identities: new.initial_link.clone().into_iter().collect(),
        };

        if let Some(identity) = new.initial_link {
            self.provider_index
                .insert((identity.provider, identity.provider_id), id);
        }

        self.principals.insert(id, principal.clone());
        Ok(principal)
    }
}
