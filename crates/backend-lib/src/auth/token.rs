// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Bearer-token codec and the non-interactive token strategy.
//!
//! The codec owns everything cryptographic about a token: signature,
//! expiry, issuer. The strategy only maps an already-decoded payload to a
//! principal and deliberately has no way to re-check the token itself.
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::outcome::{AuthOutcome, RejectReason};
use crate::auth::session::SessionState;
use crate::config::TokenSettings;
use crate::directory::PrincipalDirectory;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// Contents of a structurally valid, correctly signed, unexpired token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPayload {
    pub principal_id: Uuid,
}

/// Signs and validates bearer tokens (HS256).
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_secs: u64,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            ttl_secs: settings.ttl_secs,
            validation,
        }
    }

    /// Issue a token for a principal id
    pub fn issue(&self, principal_id: Uuid) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: principal_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AppError::Internal(format!("failed to sign token: {err}")))
    }

    /// Validate signature, expiry and issuer, and extract the payload
    pub fn decode(&self, token: &str) -> Result<TokenPayload, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AppError::InvalidToken)?;
        let principal_id =
            Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;
        Ok(TokenPayload { principal_id })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

/// Maps a decoded token payload to a principal.
pub struct TokenStrategy<D> {
    directory: D,
}

impl<D: PrincipalDirectory> TokenStrategy<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Token clients are non-interactive, so unlike the password path this
    /// never queues a notice on the session.
    pub async fn verify(
        &self,
        payload: &TokenPayload,
        _session: &mut SessionState,
    ) -> AuthOutcome {
        match self.directory.find_by_id(payload.principal_id).await {
            Ok(Some(principal)) => AuthOutcome::Authenticated(principal),
            Ok(None) => AuthOutcome::Rejected(RejectReason::InvalidPrincipal),
            Err(err) => {
                tracing::error!(error = %err, "directory lookup failed during token verification");
                AuthOutcome::Rejected(RejectReason::Internal)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TokenSettings {
        TokenSettings {
            secret: "test-secret-key".to_string(),
            issuer: "gatehouse-test".to_string(),
            ttl_secs: 3600,
        }
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let codec = TokenCodec::new(&settings());
        let id = Uuid::new_v4();

        let token = codec.issue(id).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let payload = codec.decode(&token).unwrap();
        assert_eq!(payload.principal_id, id);
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        let codec = TokenCodec::new(&settings());
        assert!(codec.decode("garbage").is_err());
        assert!(codec.decode("still.garbage").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = TokenCodec::new(&settings());
        let other = TokenCodec::new(&TokenSettings {
            secret: "a-different-secret".to_string(),
            ..settings()
        });

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(codec.decode(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = TokenCodec::new(&settings());
        let other = TokenCodec::new(&TokenSettings {
            issuer: "somebody-else".to_string(),
            ..settings()
        });

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(codec.decode(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new(&settings());

        // forge claims expired well past the default validation leeway
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iss: "gatehouse-test".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let codec = TokenCodec::new(&settings());

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iss: "gatehouse-test".to_string(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(AppError::InvalidToken)));
    }
}
