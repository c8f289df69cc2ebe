// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module: strategies, dispatch, sessions and linking.

pub mod identity;
pub mod linking;
pub mod oauth;
pub mod outcome;
pub mod password;
pub mod rate_limit;
pub mod registry;
pub mod session;
pub mod token;
pub mod token_generator;
mod service;
mod service_impl;

pub use identity::{IdentityBinder, SerializedIdentity};
pub use linking::{AccountLinker, LinkResolution, PendingLinkRecord};
pub use oauth::OAuthStrategy;
pub use outcome::{AuthOutcome, Credentials, RejectReason};
pub use password::{hash_password, hash_password_secure, validate_password_strength, verify_password, PasswordRequirements, PasswordStrategy, MIN_PASSWORD_LENGTH};
pub use rate_limit::AuthRateLimiter;
pub use registry::{AuthMethod, StrategyRegistry};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{SessionHandle, SessionManager, SessionState, SESSION_TTL};
pub use token::{TokenCodec, TokenPayload, TokenStrategy};
pub use token_generator::generate_session_token;
