use async_trait::async_trait;
use gatehouse_common::Severity;
use metrics::counter;

use crate::auth::identity::{IdentityBinder, SerializedIdentity};
use crate::auth::linking::{AccountLinker, PendingLinkRecord};
use crate::auth::outcome::{AuthOutcome, Credentials, RejectReason};
use crate::auth::password::NOTICE_INTERNAL;
use crate::auth::registry::StrategyRegistry;
use crate::auth::service::AuthService;
use crate::auth::session::SessionState;
use crate::directory::{Principal, PrincipalDirectory};
use crate::error::AppError;
use crate::metrics as metric_keys;

/// Default wiring of registry, linker and binder over one directory.
pub struct DefaultAuth<D> {
    registry: StrategyRegistry<D>,
    linker: AccountLinker<D>,
    binder: IdentityBinder<D>,
}

impl<D: PrincipalDirectory + Clone> DefaultAuth<D> {
    pub fn new(directory: D) -> Self {
        Self {
            registry: StrategyRegistry::new(directory.clone()),
            linker: AccountLinker::new(directory.clone()),
            binder: IdentityBinder::new(directory),
        }
    }
}

#[async_trait]
impl<D: PrincipalDirectory + Clone + 'static> AuthService for DefaultAuth<D> {
    async fn authenticate(
        &self,
        method: &str,
        credentials: Credentials,
        session: &mut SessionState,
    ) -> AuthOutcome {
        counter!(metric_keys::AUTH_ATTEMPT, "method" => method.to_string()).increment(1);

        match self.registry.verify_named(method, credentials, session).await {
            AuthOutcome::Authenticated(principal) => {
                // a success while a link decision is outstanding resolves
                // it in favor of this account
                let principal = if session.pending_link.is_some() {
                    match self.linker.resolve_with_existing(session, &principal).await {
                        Ok(Some(updated)) => updated,
                        Ok(None) => principal,
                        Err(err) => {
                            tracing::error!(
                                error = %err,
                                "failed to attach pending provider identity"
                            );
                            session.push_notice(NOTICE_INTERNAL, Severity::Danger);
                            return AuthOutcome::Rejected(RejectReason::Internal);
                        },
                    }
                } else {
                    principal
                };

                session.identity = Some(self.binder.bind(&principal));
                AuthOutcome::Authenticated(principal)
            },
            AuthOutcome::PendingLink {
                provider,
                provider_id,
            } => {
                self.linker
                    .note_pending(session, provider.clone(), provider_id.clone());
                AuthOutcome::PendingLink {
                    provider,
                    provider_id,
                }
            },
            AuthOutcome::Rejected(reason) => {
                counter!(metric_keys::AUTH_REJECTED, "reason" => reason.as_str()).increment(1);
                AuthOutcome::Rejected(reason)
            },
        }
    }

    async fn resolve_identity(&self, identity: &SerializedIdentity) -> Option<Principal> {
        self.binder.resolve(identity).await
    }

    async fn create_linked_account(
        &self,
        session: &mut SessionState,
    ) -> Result<Principal, AppError> {
        let principal = self.linker.resolve_with_new_account(session).await?;
        session.identity = Some(self.binder.bind(&principal));
        Ok(principal)
    }

    fn abandon_link(&self, session: &mut SessionState) -> Option<PendingLinkRecord> {
        self.linker.abandon(session)
    }
}
