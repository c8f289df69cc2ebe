// ============================
// crates/backend-lib/src/auth/oauth.rs
// ============================
//! OAuth-profile strategy: maps provider-verified identities to local
//! principals.
use crate::auth::outcome::{AuthOutcome, RejectReason};
use crate::auth::session::SessionState;
use crate::directory::PrincipalDirectory;

/// Verification for a profile the provider has already authenticated.
///
/// This strategy never touches the directory beyond lookups and never
/// fabricates a principal. When no local account is linked, the outcome
/// is `PendingLink`; what happens to it is the linking state machine's
/// decision.
pub struct OAuthStrategy<D> {
    directory: D,
}

impl<D: PrincipalDirectory> OAuthStrategy<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub async fn verify(
        &self,
        provider: &str,
        provider_id: &str,
        profile: &serde_json::Value,
        _session: &mut SessionState,
    ) -> AuthOutcome {
        // the payload is opaque beyond (provider, id); log it for support
        tracing::debug!(provider, provider_id, ?profile, "completed provider handshake");

        match self
            .directory
            .find_by_provider_identity(provider, provider_id)
            .await
        {
            Ok(Some(principal)) => AuthOutcome::Authenticated(principal),
            Ok(None) => AuthOutcome::PendingLink {
                provider: provider.to_string(),
                provider_id: provider_id.to_string(),
            },
            Err(err) => {
                tracing::error!(error = %err, "directory lookup failed during oauth verification");
                AuthOutcome::Rejected(RejectReason::Internal)
            },
        }
    }
}
