// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing, verification and the interactive password strategy.
use scrypt::{password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng}, Scrypt};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use gatehouse_common::Severity;
use crate::auth::outcome::{AuthOutcome, RejectReason};
use crate::auth::session::SessionState;
use crate::directory::PrincipalDirectory;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 10;

// Failure notices are deliberately generic for credential failures and
// specific only for the unverified case.
pub(crate) const NOTICE_INVALID_CREDENTIALS: &str = "Invalid username or password!";
pub(crate) const NOTICE_UNVERIFIED_ACCOUNT: &str =
    "Please verify your email address before signing in.";
pub(crate) const NOTICE_INTERNAL: &str = "Something went wrong, please try again.";

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Hash a password using scrypt
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.len() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain)?;
    plain.zeroize();
    Ok(hash)
}

// Verified against when a username does not exist, so that path costs as
// much as a real comparison.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("gatehouse-dummy-password").expect("scrypt accepts fixed params"));

/// Run a full verification against a throwaway hash; only the time spent
/// matters, the result is discarded.
pub(crate) fn burn_secret_check(candidate: &str) {
    let _ = verify_password(&DUMMY_HASH, candidate);
}

/// Interactive username/password verification.
pub struct PasswordStrategy<D> {
    directory: D,
}

impl<D: PrincipalDirectory> PasswordStrategy<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Verify a username/secret pair. Every rejection queues exactly one
    /// user-facing notice before returning; the outcome value itself is
    /// the only other channel back to the caller.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
        session: &mut SessionState,
    ) -> AuthOutcome {
        let found = match self.directory.find_by_username(username).await {
            Ok(found) => found,
            Err(err) => {
                tracing::error!(error = %err, "directory lookup failed during password verification");
                session.push_notice(NOTICE_INTERNAL, Severity::Danger);
                return AuthOutcome::Rejected(RejectReason::Internal);
            },
        };

        let Some(principal) = found else {
            // same reason and same cost as a wrong secret
            burn_secret_check(password);
            session.push_notice(NOTICE_INVALID_CREDENTIALS, Severity::Danger);
            return AuthOutcome::Rejected(RejectReason::InvalidCredentials);
        };

        if !principal.verified {
            session.push_notice(NOTICE_UNVERIFIED_ACCOUNT, Severity::Danger);
            return AuthOutcome::Rejected(RejectReason::UnverifiedAccount);
        }

        match self.directory.compare_secret(&principal, password).await {
            Ok(true) => AuthOutcome::Authenticated(principal),
            Ok(false) => {
                session.push_notice(NOTICE_INVALID_CREDENTIALS, Severity::Danger);
                AuthOutcome::Rejected(RejectReason::InvalidCredentials)
            },
            Err(err) => {
                tracing::error!(error = %err, "secret comparison failed");
                session.push_notice(NOTICE_INTERNAL, Severity::Danger);
                AuthOutcome::Rejected(RejectReason::Internal)
            },
        }
    }
}
