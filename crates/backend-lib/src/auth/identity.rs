// ============================
// crates/backend-lib/src/auth/identity.rs
// ============================
//! Durable session identity: bind a principal down to its id, and
//! re-resolve the id through the directory on every later request.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::{Principal, PrincipalDirectory};

/// The only thing a session durably stores about who is signed in.
///
/// Holding one is never proof of anything; it must be re-resolved through
/// the directory before each use, so revocations and account edits take
/// effect on the very next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity(Uuid);

impl SerializedIdentity {
    pub fn principal_id(&self) -> Uuid {
        self.0
    }
}

/// Converts principals to serialized identities and back.
pub struct IdentityBinder<D> {
    directory: D,
}

impl<D: PrincipalDirectory> IdentityBinder<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Capture the minimal durable reference to a principal
    pub fn bind(&self, principal: &Principal) -> SerializedIdentity {
        SerializedIdentity(principal.id)
    }

    /// Re-fetch the full principal. A deleted principal or a directory
    /// fault degrades to `None` - the session becomes unauthenticated
    /// instead of surfacing an error to the caller.
    pub async fn resolve(&self, identity: &SerializedIdentity) -> Option<Principal> {
        match self.directory.find_by_id(identity.0).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    principal_id = %identity.0,
                    "identity resolution failed, treating session as unauthenticated"
                );
                None
            },
        }
    }
}
