use async_trait::async_trait;

use crate::auth::identity::SerializedIdentity;
use crate::auth::linking::PendingLinkRecord;
use crate::auth::outcome::{AuthOutcome, Credentials};
use crate::auth::session::SessionState;
use crate::directory::Principal;
use crate::error::AppError;

/// Facade the HTTP layer drives. One implementation wires the strategy
/// registry, the linking state machine and the identity binder together;
/// session state is always passed in explicitly so implementations stay
/// testable without a live session store.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials with the strategy registered for `method` and
    /// apply the resulting session transitions: a success binds the
    /// session identity (and resolves a pending link, if one is waiting);
    /// a `PendingLink` outcome records the pending pair.
    async fn authenticate(
        &self,
        method: &str,
        credentials: Credentials,
        session: &mut SessionState,
    ) -> AuthOutcome;

    /// Re-resolve a bound identity to the full principal; `None` means
    /// the session should be treated as unauthenticated.
    async fn resolve_identity(&self, identity: &SerializedIdentity) -> Option<Principal>;

    /// Resolve the session's pending link by creating a fresh pre-linked
    /// account, and authenticate the session as it.
    async fn create_linked_account(
        &self,
        session: &mut SessionState,
    ) -> Result<Principal, AppError>;

    /// Discard the session's pending link, if any.
    fn abandon_link(&self, session: &mut SessionState) -> Option<PendingLinkRecord>;
}
