// ============================
// crates/backend-lib/src/auth/registry.rs
// ============================
//! Strategy registry: one verifier per authentication method.
//!
//! The method set is closed and dispatch is an exhaustive match, so adding
//! a method without wiring a strategy fails at compile time rather than at
//! the first login attempt.
use std::fmt;
use std::str::FromStr;

use crate::auth::oauth::OAuthStrategy;
use crate::auth::outcome::{AuthOutcome, Credentials, RejectReason};
use crate::auth::password::PasswordStrategy;
use crate::auth::session::SessionState;
use crate::auth::token::TokenStrategy;
use crate::directory::PrincipalDirectory;

/// The authentication methods this service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    Token,
    OAuth,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::Token => "token",
            AuthMethod::OAuth => "oauth",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(AuthMethod::Password),
            "token" => Ok(AuthMethod::Token),
            "oauth" => Ok(AuthMethod::OAuth),
            _ => Err(()),
        }
    }
}

/// Holds one strategy per method and delegates verification.
pub struct StrategyRegistry<D> {
    password: PasswordStrategy<D>,
    token: TokenStrategy<D>,
    oauth: OAuthStrategy<D>,
}

impl<D: PrincipalDirectory + Clone> StrategyRegistry<D> {
    pub fn new(directory: D) -> Self {
        Self {
            password: PasswordStrategy::new(directory.clone()),
            token: TokenStrategy::new(directory.clone()),
            oauth: OAuthStrategy::new(directory),
        }
    }

    /// Dispatch to the strategy for `method`. Directory faults never
    /// escape the delegated strategy; every path resolves to an outcome
    /// value. Credentials of the wrong shape for the method are treated
    /// the same as an unknown method.
    pub async fn verify(
        &self,
        method: AuthMethod,
        credentials: Credentials,
        session: &mut SessionState,
    ) -> AuthOutcome {
        match (method, credentials) {
            (AuthMethod::Password, Credentials::Password { username, password }) => {
                self.password.verify(&username, &password, session).await
            },
            (AuthMethod::Token, Credentials::Token { payload }) => {
                self.token.verify(&payload, session).await
            },
            (
                AuthMethod::OAuth,
                Credentials::OAuthProfile {
                    provider,
                    provider_id,
                    profile,
                },
            ) => {
                self.oauth
                    .verify(&provider, &provider_id, &profile, session)
                    .await
            },
            (method, credentials) => {
                tracing::warn!(
                    %method,
                    kind = credentials.kind(),
                    "credentials do not match the requested method"
                );
                AuthOutcome::Rejected(RejectReason::UnsupportedMethod)
            },
        }
    }

    /// Like [`verify`](Self::verify), but with the method given by name as
    /// it arrives on the wire. Unknown names reject rather than error.
    pub async fn verify_named(
        &self,
        method: &str,
        credentials: Credentials,
        session: &mut SessionState,
    ) -> AuthOutcome {
        match method.parse::<AuthMethod>() {
            Ok(method) => self.verify(method, credentials, session).await,
            Err(()) => {
                tracing::warn!(method, "verification requested for unknown method");
                AuthOutcome::Rejected(RejectReason::UnsupportedMethod)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("password".parse::<AuthMethod>(), Ok(AuthMethod::Password));
        assert_eq!("token".parse::<AuthMethod>(), Ok(AuthMethod::Token));
        assert_eq!("oauth".parse::<AuthMethod>(), Ok(AuthMethod::OAuth));
        assert!("saml".parse::<AuthMethod>().is_err());
        // method names are exact, not case-folded
        assert!("Password".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn test_method_display_round_trips() {
        for method in [AuthMethod::Password, AuthMethod::Token, AuthMethod::OAuth] {
            assert_eq!(method.to_string().parse::<AuthMethod>(), Ok(method));
        }
    }
}
