// ============================
// crates/backend-lib/src/auth/outcome.rs
// ============================
//! Credential and outcome types shared by all strategies.

use crate::auth::token::TokenPayload;
use crate::directory::Principal;

/// Request-scoped credential material for one verification attempt.
/// Never persisted; secrets die with the request.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Interactive username + secret
    Password { username: String, password: String },
    /// Bearer-token payload, already checked and decoded by the codec
    Token { payload: TokenPayload },
    /// Profile identity from a completed provider handshake
    OAuthProfile {
        provider: String,
        provider_id: String,
        profile: serde_json::Value,
    },
}

impl Credentials {
    /// Short label for logging; never exposes secret material
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Password { .. } => "password",
            Credentials::Token { .. } => "token",
            Credentials::OAuthProfile { .. } => "oauth",
        }
    }
}

/// Why a verification attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Unknown username or wrong secret; deliberately the same reason for
    /// both so account existence never leaks
    InvalidCredentials,
    /// The account exists but has not completed its verification step
    UnverifiedAccount,
    /// A structurally valid token names a principal that no longer exists
    InvalidPrincipal,
    /// No strategy handles the requested method
    UnsupportedMethod,
    /// Directory or I/O failure; the caller may retry
    Internal,
}

impl RejectReason {
    /// Stable machine-readable code for wire replies and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidCredentials => "invalid_credentials",
            RejectReason::UnverifiedAccount => "unverified_account",
            RejectReason::InvalidPrincipal => "invalid_principal",
            RejectReason::UnsupportedMethod => "unsupported_method",
            RejectReason::Internal => "internal_error",
        }
    }
}

/// Result of one verification attempt.
///
/// `PendingLink` is a control outcome, not a failure: the provider vouched
/// for the profile but no local account is linked yet. It must never be
/// treated as `Authenticated` - nothing has been verified against a local
/// account at that point.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated(Principal),
    Rejected(RejectReason),
    PendingLink {
        provider: String,
        provider_id: String,
    },
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }
}
