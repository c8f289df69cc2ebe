// ============================
// crates/backend-lib/src/auth/linking.rs
// ============================
//! The account-linking state machine.
//!
//! A session is either in `NoPendingLink` (`pending_link == None`) or in
//! `PendingLink` (`Some(record)`). Three transitions leave the pending
//! state, all terminal: linking to an existing principal, creating a new
//! pre-linked principal, or abandoning the record. This module is the only
//! place provider identities get attached or provider-created accounts
//! come into existence.
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::auth::session::SessionState;
use crate::directory::{NewPrincipal, Principal, PrincipalDirectory, ProviderIdentity};
use crate::error::AppError;
use crate::metrics as metric_keys;

/// A provider identity awaiting association with a local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLinkRecord {
    pub provider: String,
    pub provider_id: String,
}

/// How a pending link left the pending state. Terminal: after any of
/// these the session is back to holding no pending link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkResolution {
    LinkedToExisting,
    NewAccountCreated,
    Abandoned,
}

impl LinkResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkResolution::LinkedToExisting => "linked_to_existing",
            LinkResolution::NewAccountCreated => "new_account_created",
            LinkResolution::Abandoned => "abandoned",
        }
    }
}

/// Drives pending-link transitions against the directory.
pub struct AccountLinker<D> {
    directory: D,
}

impl<D: PrincipalDirectory> AccountLinker<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Enter (or re-enter) the pending state. The last provider sign-in
    /// wins: any earlier unresolved record is discarded.
    pub fn note_pending(&self, session: &mut SessionState, provider: String, provider_id: String) {
        let record = PendingLinkRecord {
            provider,
            provider_id,
        };
        if let Some(previous) = session.pending_link.replace(record) {
            tracing::debug!(
                provider = %previous.provider,
                provider_id = %previous.provider_id,
                "discarding earlier pending link"
            );
        }
        counter!(metric_keys::LINK_PENDING).increment(1);
    }

    /// Attach the pending identity to an already-verified principal and
    /// clear the record. Returns the updated principal, or `None` when the
    /// session held no pending link. On a directory fault the record stays
    /// in place so the user can retry.
    pub async fn resolve_with_existing(
        &self,
        session: &mut SessionState,
        principal: &Principal,
    ) -> Result<Option<Principal>, AppError> {
        let Some(record) = session.pending_link.clone() else {
            return Ok(None);
        };

        let updated = self
            .directory
            .attach_provider_identity(principal.id, &record.provider, &record.provider_id)
            .await?;
        session.pending_link = None;

        tracing::info!(
            principal_id = %updated.id,
            provider = %record.provider,
            resolution = LinkResolution::LinkedToExisting.as_str(),
            "pending link resolved"
        );
        counter!(
            metric_keys::LINK_RESOLVED,
            "resolution" => LinkResolution::LinkedToExisting.as_str()
        )
        .increment(1);

        Ok(Some(updated))
    }

    /// Create a fresh principal pre-linked to the pending identity and
    /// clear the record.
    pub async fn resolve_with_new_account(
        &self,
        session: &mut SessionState,
    ) -> Result<Principal, AppError> {
        let record = session.pending_link.clone().ok_or(AppError::NoPendingLink)?;

        let principal = self
            .directory
            .create_principal(NewPrincipal {
                // the provider vouched for this identity
                verified: true,
                initial_link: Some(ProviderIdentity {
                    provider: record.provider.clone(),
                    provider_id: record.provider_id.clone(),
                }),
                ..NewPrincipal::default()
            })
            .await?;
        session.pending_link = None;

        tracing::info!(
            principal_id = %principal.id,
            provider = %record.provider,
            resolution = LinkResolution::NewAccountCreated.as_str(),
            "pending link resolved"
        );
        counter!(
            metric_keys::LINK_RESOLVED,
            "resolution" => LinkResolution::NewAccountCreated.as_str()
        )
        .increment(1);

        Ok(principal)
    }

    /// Discard the pending record without touching any account. Returns
    /// the discarded record, if there was one.
    pub fn abandon(&self, session: &mut SessionState) -> Option<PendingLinkRecord> {
        let record = session.pending_link.take()?;

        tracing::debug!(
            provider = %record.provider,
            provider_id = %record.provider_id,
            resolution = LinkResolution::Abandoned.as_str(),
            "pending link abandoned"
        );
        counter!(
            metric_keys::LINK_ABANDONED,
            "resolution" => LinkResolution::Abandoned.as_str()
        )
        .increment(1);

        Some(record)
    }
}
