// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Authentication endpoints.
//!
//! Verification results travel as outcome values, so most endpoints reply
//! `200` with a tagged outcome body; HTTP error statuses are reserved for
//! transport-level problems (bad session, malformed input, rate limits).
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use gatehouse_common::{
    AuthReply, LinkReply, LoginRequest, OAuthCompleteRequest, PrincipalSummary,
    ProviderIdentityRef, SessionReply, SessionRequest, SignupRequest, TokenReply,
};

use crate::auth::{
    hash_password_secure, validate_password_strength, AuthOutcome, Credentials, RejectReason,
    SessionHandle, SessionManager, SessionState,
};
use crate::directory::{NewPrincipal, Principal, PrincipalDirectory};
use crate::error::AppError;
use crate::validation;
use crate::AppState;

fn summarize(principal: &Principal) -> PrincipalSummary {
    PrincipalSummary {
        id: principal.id,
        username: principal.username.clone(),
        verified: principal.verified,
        identities: principal
            .identities
            .iter()
            .map(|identity| ProviderIdentityRef {
                provider: identity.provider.clone(),
                provider_id: identity.provider_id.clone(),
            })
            .collect(),
    }
}

/// Reuse the caller's session when the token is still live, otherwise
/// start a fresh one. Keeping the same session across an OAuth round-trip
/// is what lets a pending link survive until the login that resolves it.
fn ensure_session(sessions: &SessionManager, token: Option<&str>) -> (String, SessionHandle) {
    if let Some(token) = token {
        if let Some(handle) = sessions.get(token) {
            return (token.to_string(), handle);
        }
    }
    sessions.create()
}

fn outcome_reply(
    outcome: AuthOutcome,
    session_token: String,
    session: &mut SessionState,
) -> AuthReply {
    match outcome {
        AuthOutcome::Authenticated(principal) => AuthReply::Authenticated {
            session_token,
            principal: summarize(&principal),
            notices: session.drain_notices(),
        },
        AuthOutcome::Rejected(reason) => AuthReply::Rejected {
            session_token,
            reason: reason.as_str().to_string(),
            notices: session.drain_notices(),
        },
        AuthOutcome::PendingLink {
            provider,
            provider_id,
        } => AuthReply::LinkRequired {
            session_token,
            provider,
            provider_id,
            notices: session.drain_notices(),
        },
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("missing bearer token".to_string()))
}

/// Register a username/password principal. Accounts start unverified;
/// the verification step is delivered out of band.
pub async fn signup<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(mut req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PrincipalSummary>), AppError> {
    validation::validate_username(&req.username)?;
    validation::validate_password_field(&req.password)?;

    let requirements = &state.settings.password_requirements;
    if !validate_password_strength(&req.password, requirements) {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {} characters and contain uppercase, lowercase, digit, and special character",
            requirements.min_length
        )));
    }

    let password_hash =
        hash_password_secure(&mut req.password).map_err(|err| AppError::Internal(err.to_string()))?;

    let principal = state
        .directory
        .create_principal(NewPrincipal {
            username: Some(req.username),
            password_hash: Some(password_hash),
            verified: false,
            initial_link: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(summarize(&principal))))
}

/// Interactive password login. Mounted at both `/auth/login` and
/// `/auth/link/existing`: a login while a pending link is present is
/// exactly how the link gets attached to an existing account.
pub async fn login<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthReply>, AppError> {
    validation::validate_username(&req.username)?;

    if !state.rate_limiter.check(&req.username) {
        return Err(AppError::AuthRateLimited);
    }

    let (token, handle) = ensure_session(&state.sessions, req.session_token.as_deref());
    let mut session = handle.lock().await;

    let outcome = state
        .auth
        .authenticate(
            "password",
            Credentials::Password {
                username: req.username.clone(),
                password: req.password,
            },
            &mut session,
        )
        .await;

    match &outcome {
        AuthOutcome::Authenticated(_) => state.rate_limiter.record_success(&req.username),
        AuthOutcome::Rejected(RejectReason::InvalidCredentials) => {
            state.rate_limiter.record_failure(&req.username);
        },
        _ => {},
    }

    Ok(Json(outcome_reply(outcome, token, &mut session)))
}

/// Ingest a completed provider handshake. Replies `LinkRequired` when the
/// profile is known to the provider but not linked to any local account.
pub async fn oauth_complete<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<OAuthCompleteRequest>,
) -> Result<Json<AuthReply>, AppError> {
    validation::validate_provider(&req.provider)?;
    validation::validate_provider_id(&req.provider_id)?;

    if !state.settings.providers.contains_key(&req.provider) {
        return Err(AppError::InvalidInput(format!(
            "unknown provider: {}",
            req.provider
        )));
    }

    let (token, handle) = ensure_session(&state.sessions, req.session_token.as_deref());
    let mut session = handle.lock().await;

    let outcome = state
        .auth
        .authenticate(
            "oauth",
            Credentials::OAuthProfile {
                provider: req.provider,
                provider_id: req.provider_id,
                profile: req.profile,
            },
            &mut session,
        )
        .await;

    Ok(Json(outcome_reply(outcome, token, &mut session)))
}

/// Resolve the session's pending link by creating a fresh account.
pub async fn link_new<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<LinkReply>, AppError> {
    let handle = state
        .sessions
        .get(&req.session_token)
        .ok_or(AppError::InvalidSession)?;
    let mut session = handle.lock().await;

    let principal = state.auth.create_linked_account(&mut session).await?;

    Ok(Json(LinkReply::Created {
        session_token: req.session_token,
        principal: summarize(&principal),
    }))
}

/// Discard the session's pending link. Idempotent.
pub async fn link_abandon<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<LinkReply>, AppError> {
    let handle = state
        .sessions
        .get(&req.session_token)
        .ok_or(AppError::InvalidSession)?;
    let mut session = handle.lock().await;

    state.auth.abandon_link(&mut session);

    Ok(Json(LinkReply::Abandoned {
        session_token: req.session_token,
    }))
}

/// Issue a bearer token for the session's authenticated principal.
pub async fn issue_token<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<TokenReply>, AppError> {
    let handle = state
        .sessions
        .get(&req.session_token)
        .ok_or(AppError::InvalidSession)?;
    let identity = handle.lock().await.identity;

    let identity =
        identity.ok_or_else(|| AppError::Auth("session is not authenticated".to_string()))?;

    // always re-resolve; a principal deleted since login gets no token
    let principal = state
        .auth
        .resolve_identity(&identity)
        .await
        .ok_or_else(|| AppError::Auth("principal no longer exists".to_string()))?;

    let token = state.codec.issue(principal.id)?;
    Ok(Json(TokenReply {
        token,
        expires_in_secs: state.codec.ttl_secs(),
    }))
}

/// Authenticate a bearer token and return the principal it names.
pub async fn me<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    headers: HeaderMap,
) -> Result<Json<PrincipalSummary>, AppError> {
    let bearer = bearer_token(&headers)?;

    // the codec owns signature and expiry checks
    let payload = state.codec.decode(bearer)?;

    // token clients carry no session; the strategy gets a scratch state
    let mut scratch = SessionState::new();
    let outcome = state
        .auth
        .authenticate("token", Credentials::Token { payload }, &mut scratch)
        .await;

    match outcome {
        AuthOutcome::Authenticated(principal) => Ok(Json(summarize(&principal))),
        _ => Err(AppError::Auth("token names no known principal".to_string())),
    }
}

/// Session snapshot for rendering: resolved principal, pending link and
/// queued notices (drained by this call).
pub async fn session_overview<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionReply>, AppError> {
    let handle = state
        .sessions
        .get(&req.session_token)
        .ok_or(AppError::InvalidSession)?;
    let mut session = handle.lock().await;

    let authenticated = match session.identity {
        Some(identity) => match state.auth.resolve_identity(&identity).await {
            Some(principal) => Some(summarize(&principal)),
            None => {
                // deleted underneath the session: degrade, don't error
                session.identity = None;
                None
            },
        },
        None => None,
    };

    let pending_link = session
        .pending_link
        .as_ref()
        .map(|record| ProviderIdentityRef {
            provider: record.provider.clone(),
            provider_id: record.provider_id.clone(),
        });

    Ok(Json(SessionReply {
        authenticated,
        pending_link,
        notices: session.drain_notices(),
    }))
}

/// Destroy the session. Idempotent; an unresolved pending link is
/// abandoned with it.
pub async fn logout<D: PrincipalDirectory + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    state.sessions.destroy(&req.session_token);
    StatusCode::NO_CONTENT
}
